use serde::{Deserialize, Serialize};

use super::{BlockId, BlockKind, InlineKind};

/// An owned, detached copy of a subtree.
///
/// History snapshots store blocks in this form (as JSON), and the renderer
/// builds new blocks through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Fragment {
    Block {
        kind: BlockKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        block_id: Option<BlockId>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        list_break: bool,
        children: Vec<Fragment>,
    },
    Inline {
        kind: InlineKind,
        children: Vec<Fragment>,
    },
    Text {
        value: String,
    },
}

impl Fragment {
    pub fn text(value: impl Into<String>) -> Self {
        Fragment::Text {
            value: value.into(),
        }
    }

    pub fn block_id(&self) -> Option<BlockId> {
        match self {
            Fragment::Block { block_id, .. } => *block_id,
            _ => None,
        }
    }

    /// Concatenated text of every descendant text fragment.
    pub fn text_content(&self) -> String {
        match self {
            Fragment::Text { value } => value.clone(),
            Fragment::Block { children, .. } | Fragment::Inline { children, .. } => {
                children.iter().map(Fragment::text_content).collect()
            }
        }
    }
}
