use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Handle to a node in a [`Surface`](super::Surface).
///
/// The generation makes handles to freed slots stale instead of silently
/// pointing at whatever reused the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Stable identity of a block, carried across rewrites and into history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub Uuid);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The rendered type of a block node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    Heading { level: u8 },
    UnorderedItem,
    OrderedItem { start: u32 },
    Rule,
}

impl BlockKind {
    /// Rules hold no text and are exempt from sentinel normalization.
    pub fn holds_text(self) -> bool {
        !matches!(self, BlockKind::Rule)
    }
}

/// Formatting applied by an inline node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InlineKind {
    Strong,
    Emphasis,
    Strikethrough,
    Code,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Block(BlockKind),
    Inline(InlineKind),
    Text(String),
}

impl NodeKind {
    pub fn is_block(&self) -> bool {
        matches!(self, NodeKind::Block(_))
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, NodeKind::Inline(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, NodeKind::Text(_))
    }

    /// Text nodes are leaves; everything else may hold children.
    pub fn is_container(&self) -> bool {
        !self.is_text()
    }
}

/// A node as stored in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) block_id: Option<BlockId>,
    pub(crate) list_break: bool,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: vec![],
            block_id: None,
            list_break: false,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn block_id(&self) -> Option<BlockId> {
        self.block_id
    }

    /// True when this list item starts a new list even though the block
    /// before it is an item of the same kind.
    pub fn list_break(&self) -> bool {
        self.list_break
    }
}
