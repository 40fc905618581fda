use serde::{Deserialize, Serialize};

use crate::tree::{BlockId, NodeId};

/// A caret location in the host tree.
///
/// In a text node `offset` is a raw char offset, sentinels included. In any
/// other node it is a child index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Position,
    pub focus: Position,
}

impl Selection {
    pub fn collapsed(at: Position) -> Self {
        Self {
            anchor: at,
            focus: at,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// The engine's view of the host caret.
///
/// Passed explicitly to everything that reads or moves the caret; nothing
/// in the engine reaches for an ambient selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorHandle {
    selection: Option<Selection>,
}

impl CursorHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn set(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    pub fn collapse(&mut self, at: Position) {
        self.selection = Some(Selection::collapsed(at));
    }

    pub fn clear(&mut self) {
        self.selection = None;
    }

    /// The focus end of the selection.
    pub fn caret(&self) -> Option<Position> {
        self.selection.map(|s| s.focus)
    }

    /// The caret, only when the selection is collapsed.
    pub fn collapsed_caret(&self) -> Option<Position> {
        self.selection
            .filter(Selection::is_collapsed)
            .map(|s| s.focus)
    }
}

/// A selection expressed in block ids and visible offsets, stable across
/// node replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub block_id: BlockId,
    pub offset: usize,
    pub is_range: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_block_id: Option<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_offset: Option<usize>,
}

impl SelectionState {
    pub fn caret(block_id: BlockId, offset: usize) -> Self {
        Self {
            block_id,
            offset,
            is_range: false,
            end_block_id: None,
            end_offset: None,
        }
    }
}
