use serde::{Deserialize, Serialize};

use crate::{editing::SelectionState, tree::BlockId};

/// What kind of edit an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryEntryType {
    Typing,
    Delete,
    Split,
    Merge,
    Format,
}

/// One block as it was, serialized, plus the block it followed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSnapshot {
    pub block_id: BlockId,
    /// JSON of the block's exported fragment.
    pub serialized: String,
    /// The preceding block, used to re-insert this one if it is gone.
    pub after: Option<BlockId>,
}

/// One side of an entry: the blocks to put back and the ones to remove.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    pub blocks: Vec<BlockSnapshot>,
    pub selection: Option<SelectionState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deleted_block_ids: Vec<BlockId>,
}

impl HistoryState {
    /// True when restoring this state would not touch any block.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.deleted_block_ids.is_empty()
    }

    pub fn block(&self, block_id: BlockId) -> Option<&BlockSnapshot> {
        self.blocks.iter().find(|b| b.block_id == block_id)
    }
}

/// What [`HistoryManager::push`](super::HistoryManager::push) takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntryData {
    pub entry_type: HistoryEntryType,
    pub before: HistoryState,
    pub after: HistoryState,
}
