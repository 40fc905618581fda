use crate::tree::NodeId;

/// Host tree primitive failures.
///
/// These never reach the host: every engine operation recovers from them
/// locally and logs what it did.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("Stale or unknown node: {0}")]
    StaleNode(NodeId),
    #[error("Node {0} cannot hold children")]
    NotAContainer(NodeId),
    #[error("Node {0} is not a text node")]
    NotText(NodeId),
    #[error("Node {0} has no parent")]
    Detached(NodeId),
    #[error("Node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("Inserting {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("The root node cannot be moved, removed or exported")]
    Root,
}

/// History snapshot encode/decode failures.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Failed to encode block snapshot: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Failed to decode block snapshot: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("Tree error while restoring history: {0}")]
    Tree(#[from] TreeError),
}
