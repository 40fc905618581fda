use log::warn;

use crate::{
    editing::{
        CursorHandle, Selection, SelectionState,
        sentinel::{move_to_start, place_cursor},
    },
    error::HistoryError,
    tree::{BlockId, Fragment, NodeId, Surface},
};

use super::types::{BlockSnapshot, HistoryState};

pub fn decode_snapshot(snapshot: &BlockSnapshot) -> Result<Fragment, HistoryError> {
    serde_json::from_str(&snapshot.serialized).map_err(HistoryError::Decode)
}

/// Applies one side of a history entry to the surface.
///
/// Deleted ids go first. Each snapshot then replaces the block with its id,
/// or is re-created after the block it used to follow. Snapshots that fail
/// to decode are skipped.
pub fn restore_state(
    surface: &mut Surface,
    cursor: &mut CursorHandle,
    state: &HistoryState,
) -> Result<(), HistoryError> {
    for &block_id in &state.deleted_block_ids {
        if let Some(block) = surface.find_block(block_id) {
            surface.remove(block)?;
        }
    }

    for snapshot in &state.blocks {
        let fragment = match decode_snapshot(snapshot) {
            Ok(fragment) => fragment,
            Err(e) => {
                warn!("Skipping snapshot of block {}: {e}", snapshot.block_id);
                continue;
            }
        };
        match surface.find_block(snapshot.block_id) {
            Some(existing) => {
                if surface.export(existing)? != fragment {
                    let node = surface.import(&fragment);
                    surface.replace(existing, node)?;
                }
            }
            None => {
                warn!("Block {} not found, recreating it", snapshot.block_id);
                let node = surface.import(&fragment);
                insert_after_block(surface, node, snapshot.after)?;
            }
        }
    }

    restore_selection(surface, cursor, state.selection.as_ref());
    Ok(())
}

/// Puts a detached block after the block with id `after`, first when
/// `after` is `None`, last when that block is gone.
fn insert_after_block(
    surface: &mut Surface,
    node: NodeId,
    after: Option<BlockId>,
) -> Result<(), crate::error::TreeError> {
    let root = surface.root();
    match after {
        None => {
            let first = surface.first_child(root);
            surface.insert_before(root, node, first)
        }
        Some(id) => match surface.find_block(id) {
            Some(reference) => surface.insert_after(reference, node),
            None => {
                warn!("Anchor block {id} is gone, appending instead");
                surface.append(root, node)
            }
        },
    }
}

/// Moves the caret to a captured selection. Falls back to the start of the
/// first block when the selection's block is gone.
pub fn restore_selection(
    surface: &Surface,
    cursor: &mut CursorHandle,
    selection: Option<&SelectionState>,
) -> bool {
    let Some(selection) = selection else {
        return false;
    };
    let Some(block) = surface.find_block(selection.block_id) else {
        warn!("Selection block {} is gone", selection.block_id);
        if let Some(&first) = surface.blocks().first() {
            move_to_start(surface, cursor, first);
        }
        return false;
    };

    if !place_cursor(surface, cursor, block, selection.offset) {
        return false;
    }
    if selection.is_range
        && let (Some(end_id), Some(end_offset)) = (selection.end_block_id, selection.end_offset)
        && let Some(end_block) = surface.find_block(end_id)
        && let Some(anchor) = cursor.caret()
    {
        let mut end = CursorHandle::new();
        if place_cursor(surface, &mut end, end_block, end_offset)
            && let Some(focus) = end.caret()
        {
            cursor.set(Selection { anchor, focus });
        }
    }
    true
}
