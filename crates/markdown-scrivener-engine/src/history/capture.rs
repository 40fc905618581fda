use std::collections::HashMap;

use log::warn;

use crate::{
    editing::{CursorHandle, Position, SelectionState, sentinel::visible_offset},
    error::HistoryError,
    tree::{BlockId, NodeId, Surface},
};

use super::types::{BlockSnapshot, HistoryState};

/// Serializes one block.
pub fn snapshot_block(
    surface: &Surface,
    block: NodeId,
    after: Option<BlockId>,
) -> Result<Option<BlockSnapshot>, HistoryError> {
    let Some(block_id) = surface.block_id(block) else {
        return Ok(None);
    };
    let fragment = surface.export(block)?;
    let serialized = serde_json::to_string(&fragment).map_err(HistoryError::Encode)?;
    Ok(Some(BlockSnapshot {
        block_id,
        serialized,
        after,
    }))
}

/// Snapshots every block and the selection.
pub fn capture_state(
    surface: &Surface,
    cursor: &CursorHandle,
) -> Result<HistoryState, HistoryError> {
    let mut blocks = vec![];
    let mut previous = None;
    for block in surface.blocks() {
        match snapshot_block(surface, block, previous)? {
            Some(snapshot) => {
                previous = Some(snapshot.block_id);
                blocks.push(snapshot);
            }
            None => warn!("Block {block} has no id, leaving it out of history"),
        }
    }
    Ok(HistoryState {
        blocks,
        selection: capture_selection(surface, cursor),
        deleted_block_ids: vec![],
    })
}

/// The selection in block ids and visible offsets.
pub fn capture_selection(surface: &Surface, cursor: &CursorHandle) -> Option<SelectionState> {
    let selection = cursor.selection()?;
    let (block_id, offset) = locate(surface, selection.anchor)?;
    if selection.is_collapsed() {
        return Some(SelectionState::caret(block_id, offset));
    }
    let (end_block_id, end_offset) = locate(surface, selection.focus)?;
    Some(SelectionState {
        block_id,
        offset,
        is_range: true,
        end_block_id: Some(end_block_id),
        end_offset: Some(end_offset),
    })
}

fn locate(surface: &Surface, pos: Position) -> Option<(BlockId, usize)> {
    let block = surface.closest_block(pos.node)?;
    Some((surface.block_id(block)?, visible_offset(surface, block, pos)?))
}

/// Reduces two full captures to the `(before, after)` pair of an entry.
///
/// Only blocks that differ are kept. A block created since `previous` is
/// listed in `before.deleted_block_ids`, so undo removes it; a removed one
/// is listed in `after.deleted_block_ids` and its old snapshot goes in
/// `before.blocks`.
pub fn diff_states(previous: &HistoryState, current: &HistoryState) -> (HistoryState, HistoryState) {
    let old: HashMap<BlockId, &BlockSnapshot> =
        previous.blocks.iter().map(|b| (b.block_id, b)).collect();
    let new: HashMap<BlockId, &BlockSnapshot> =
        current.blocks.iter().map(|b| (b.block_id, b)).collect();

    let mut before = HistoryState {
        selection: previous.selection,
        ..HistoryState::default()
    };
    let mut after = HistoryState {
        selection: current.selection,
        ..HistoryState::default()
    };

    for snapshot in &current.blocks {
        match old.get(&snapshot.block_id) {
            Some(was) if was.serialized == snapshot.serialized => {}
            Some(was) => {
                before.blocks.push((*was).clone());
                after.blocks.push(snapshot.clone());
            }
            None => {
                before.deleted_block_ids.push(snapshot.block_id);
                after.blocks.push(snapshot.clone());
            }
        }
    }
    for snapshot in &previous.blocks {
        if !new.contains_key(&snapshot.block_id) {
            before.blocks.push(snapshot.clone());
            after.deleted_block_ids.push(snapshot.block_id);
        }
    }

    (before, after)
}
