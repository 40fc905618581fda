//! Native editing behaviour of the host surface.
//!
//! These are the edits a host applies on its own when no action claims a
//! key: inserting typed text, deleting a char, splitting a block on Enter
//! and moving the caret. They touch the surface while it observes, so the
//! coordinator sees them as ordinary mutations.

use crate::{
    error::TreeError,
    tree::{BlockKind, Fragment, NodeId, Surface},
};

use super::{
    selection::{CursorHandle, Position},
    sentinel::{
        SENTINEL, ensure_sentinel, move_to_end, move_to_start, place_cursor, raw_offset,
        visible_len, visible_offset,
    },
};

/// The block holding the caret and the caret's visible offset in it.
pub fn caret_in_block(surface: &Surface, cursor: &CursorHandle) -> Option<(NodeId, usize)> {
    let caret = cursor.caret()?;
    let block = surface.closest_block(caret.node)?;
    Some((block, visible_offset(surface, block, caret)?))
}

/// Inserts `text` at the caret, collapsing any range to its focus first.
///
/// With no block under the caret the text lands directly under the root,
/// the way a host does in an empty editable.
pub fn insert_text(
    surface: &mut Surface,
    cursor: &mut CursorHandle,
    text: &str,
) -> Result<bool, TreeError> {
    if text.is_empty() {
        return Ok(false);
    }
    let Some(caret) = cursor.caret() else {
        return Ok(false);
    };

    if let Some(current) = surface.text(caret.node) {
        let chars: Vec<char> = current.chars().collect();
        let at = caret.offset.min(chars.len());
        let value: String = chars[..at]
            .iter()
            .copied()
            .chain(text.chars())
            .chain(chars[at..].iter().copied())
            .collect();
        surface.set_text(caret.node, value)?;
        cursor.collapse(Position::new(caret.node, at + text.chars().count()));
        return Ok(true);
    }

    let container = match surface.block_kind(caret.node) {
        Some(kind) if !kind.holds_text() => {
            let para = surface.create_block(BlockKind::Paragraph, None);
            surface.insert_after(caret.node, para)?;
            para
        }
        _ => caret.node,
    };
    let node = surface.create_text(text);
    let before = surface.children(container).get(caret.offset).copied();
    surface.insert_before(container, node, before)?;
    cursor.collapse(Position::new(node, text.chars().count()));
    Ok(true)
}

/// Deletes the visible char before the caret, within its block.
///
/// Returns false at the start of a block; merging is left to the caller.
pub fn delete_backward(surface: &mut Surface, cursor: &mut CursorHandle) -> Result<bool, TreeError> {
    let Some((block, visible)) = caret_in_block(surface, cursor) else {
        return Ok(false);
    };
    if visible == 0 {
        return Ok(false);
    }
    delete_visible(surface, block, visible - 1)?;
    place_cursor(surface, cursor, block, visible - 1);
    Ok(true)
}

/// Deletes the visible char after the caret, merging the next block in
/// when the caret is at the end of its block.
pub fn delete_forward(surface: &mut Surface, cursor: &mut CursorHandle) -> Result<bool, TreeError> {
    let Some((block, visible)) = caret_in_block(surface, cursor) else {
        return Ok(false);
    };
    if visible < visible_len(&surface.text_content(block)) {
        delete_visible(surface, block, visible)?;
        place_cursor(surface, cursor, block, visible);
        return Ok(true);
    }
    match next_block(surface, block) {
        Some(next) => {
            merge_blocks(surface, cursor, block, next)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Removes the char at visible offset `at` of `block`.
fn delete_visible(surface: &mut Surface, block: NodeId, at: usize) -> Result<(), TreeError> {
    let mut seen = 0;
    for node in surface.text_nodes(block) {
        let Some(text) = surface.text(node) else {
            continue;
        };
        let len = visible_len(text);
        if at < seen + len {
            let raw = raw_offset(text, at - seen);
            let value: String = text
                .chars()
                .enumerate()
                .filter_map(|(i, c)| (i != raw).then_some(c))
                .collect();
            return surface.set_text(node, value);
        }
        seen += len;
    }
    Ok(())
}

/// Appends `source`'s content to `target` and removes `source`.
///
/// The caret ends up at the join. A rule as `target` is removed instead,
/// with the caret at the start of `source`.
pub fn merge_blocks(
    surface: &mut Surface,
    cursor: &mut CursorHandle,
    target: NodeId,
    source: NodeId,
) -> Result<(), TreeError> {
    if surface.block_kind(target).is_some_and(|k| !k.holds_text()) {
        surface.remove(target)?;
        move_to_start(surface, cursor, source);
        return Ok(());
    }

    let join = visible_len(&surface.text_content(target));
    for child in surface.children(source).to_vec() {
        surface.append(target, child)?;
    }
    surface.remove(source)?;
    ensure_sentinel(surface, target)?;
    place_cursor(surface, cursor, target, join);
    Ok(())
}

/// Splits the caret's block in two at the caret, like Enter.
///
/// The new block has the same kind (an ordered item continues the count)
/// and no block id yet.
pub fn split_block(
    surface: &mut Surface,
    cursor: &mut CursorHandle,
) -> Result<Option<NodeId>, TreeError> {
    split_block_as(surface, cursor, None)
}

/// Like [`split_block`], giving the new block `kind` when set.
pub fn split_block_as(
    surface: &mut Surface,
    cursor: &mut CursorHandle,
    kind: Option<BlockKind>,
) -> Result<Option<NodeId>, TreeError> {
    let Some((block, visible)) = caret_in_block(surface, cursor) else {
        return Ok(None);
    };
    let Some(current) = surface.block_kind(block) else {
        return Ok(None);
    };

    let (left, right) = match surface.export(block)? {
        Fragment::Block { children, .. } if current.holds_text() => {
            split_children(&children, visible)
        }
        _ => (vec![], vec![]),
    };

    let new_kind = kind.unwrap_or(match current {
        BlockKind::OrderedItem { start } => BlockKind::OrderedItem {
            start: start.saturating_add(1),
        },
        BlockKind::Rule => BlockKind::Paragraph,
        other => other,
    });
    let new_block = surface.import(&Fragment::Block {
        kind: new_kind,
        block_id: None,
        list_break: false,
        children: right,
    });

    if current.holds_text() {
        surface.clear_children(block)?;
        for fragment in &left {
            let child = surface.import(fragment);
            surface.append(block, child)?;
        }
        ensure_sentinel(surface, block)?;
    }
    surface.insert_after(block, new_block)?;
    ensure_sentinel(surface, new_block)?;
    move_to_start(surface, cursor, new_block);
    Ok(Some(new_block))
}

/// Splits inline fragments at visible offset `at`.
fn split_children(children: &[Fragment], at: usize) -> (Vec<Fragment>, Vec<Fragment>) {
    let mut left = vec![];
    let mut right = vec![];
    let mut remaining = Some(at);

    for child in children {
        let Some(at) = remaining else {
            right.push(child.clone());
            continue;
        };
        let len = visible_len(&child.text_content());
        if at >= len {
            left.push(child.clone());
            remaining = (at > len).then(|| at - len);
            continue;
        }
        match child {
            Fragment::Text { value } => {
                let raw = raw_offset(value, at);
                left.push(Fragment::text(value.chars().take(raw).collect::<String>()));
                let rest: String = value.chars().skip(raw).collect();
                right.push(Fragment::text(format!("{SENTINEL}{rest}")));
            }
            Fragment::Inline { kind, children } => {
                let (l, r) = split_children(children, at);
                left.push(Fragment::Inline {
                    kind: *kind,
                    children: l,
                });
                right.push(Fragment::Inline {
                    kind: *kind,
                    children: r,
                });
            }
            Fragment::Block { .. } => right.push(child.clone()),
        }
        remaining = None;
    }
    (left, right)
}

pub fn previous_block(surface: &Surface, block: NodeId) -> Option<NodeId> {
    let mut current = surface.prev_sibling(block);
    while let Some(node) = current {
        if surface.is_block(node) {
            return Some(node);
        }
        current = surface.prev_sibling(node);
    }
    None
}

pub fn next_block(surface: &Surface, block: NodeId) -> Option<NodeId> {
    let mut current = surface.next_sibling(block);
    while let Some(node) = current {
        if surface.is_block(node) {
            return Some(node);
        }
        current = surface.next_sibling(node);
    }
    None
}

/// One visible char left, wrapping to the end of the previous block.
pub fn move_left(surface: &Surface, cursor: &mut CursorHandle) -> bool {
    let Some((block, visible)) = caret_in_block(surface, cursor) else {
        return false;
    };
    if visible > 0 {
        return place_cursor(surface, cursor, block, visible - 1);
    }
    previous_block(surface, block).is_some_and(|prev| move_to_end(surface, cursor, prev))
}

/// One visible char right, wrapping to the start of the next block.
pub fn move_right(surface: &Surface, cursor: &mut CursorHandle) -> bool {
    let Some((block, visible)) = caret_in_block(surface, cursor) else {
        return false;
    };
    if visible < visible_len(&surface.text_content(block)) {
        return place_cursor(surface, cursor, block, visible + 1);
    }
    next_block(surface, block).is_some_and(|next| move_to_start(surface, cursor, next))
}

/// Same visible offset in the previous block, clamped to its end.
pub fn move_up(surface: &Surface, cursor: &mut CursorHandle) -> bool {
    let Some((block, visible)) = caret_in_block(surface, cursor) else {
        return false;
    };
    previous_block(surface, block).is_some_and(|prev| place_cursor(surface, cursor, prev, visible))
}

/// Same visible offset in the next block, clamped to its end.
pub fn move_down(surface: &Surface, cursor: &mut CursorHandle) -> bool {
    let Some((block, visible)) = caret_in_block(surface, cursor) else {
        return false;
    };
    next_block(surface, block).is_some_and(|next| place_cursor(surface, cursor, next, visible))
}
