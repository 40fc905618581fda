//! # Sentinel Cursor Model
//!
//! Tree rewrites destroy the nodes a caret points into. A zero-width
//! sentinel char at fixed structural positions gives every block and every
//! span boundary a stable "offset 1" the caret can be put back on.
//!
//! Invariants after [`ensure_sentinel`]:
//!
//! - every text-holding block has a text first child
//! - every text node directly under a block, or directly after an inline
//!   span, starts with exactly one sentinel
//! - every inline span is followed by a text node
//! - text inside a span carries no sentinel unless it follows a nested span
//!
//! Offsets come in two flavours: raw (what the tree stores, sentinels
//! included) and visible (sentinels stripped). Carets live in raw offsets;
//! everything that must survive a rewrite is kept visible.

use crate::{
    error::TreeError,
    tree::{NodeId, Surface},
};

use super::selection::{CursorHandle, Position};

/// The zero-width space used as the caret anchor.
pub const SENTINEL: char = '\u{200B}';

pub fn strip_sentinels(text: &str) -> String {
    text.chars().filter(|&c| c != SENTINEL).collect()
}

/// Char count of `text` with sentinels removed.
pub fn visible_len(text: &str) -> usize {
    text.chars().filter(|&c| c != SENTINEL).count()
}

/// `text` with exactly one leading sentinel and none elsewhere.
pub fn normalize_leading(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + SENTINEL.len_utf8());
    out.push(SENTINEL);
    out.extend(text.chars().filter(|&c| c != SENTINEL));
    out
}

/// Raw offset in `text` for visible offset `visible`.
///
/// Sentinels sitting at the target are skipped, so visible 0 in
/// `"\u{200B}ab"` is raw 1.
pub fn raw_offset(text: &str, visible: usize) -> usize {
    let mut seen = 0;
    let mut raw = 0;
    for c in text.chars() {
        if seen == visible && c != SENTINEL {
            break;
        }
        raw += 1;
        if c != SENTINEL {
            seen += 1;
        }
    }
    raw
}

/// Visible text of a block.
pub fn visible_text(surface: &Surface, block: NodeId) -> String {
    strip_sentinels(&surface.text_content(block))
}

/// Re-establishes the sentinel invariants on `block`.
///
/// Rules hold no text and are left alone. Applying this twice is the same
/// as applying it once.
pub fn ensure_sentinel(surface: &mut Surface, block: NodeId) -> Result<(), TreeError> {
    if !surface.contains(block) {
        return Err(TreeError::StaleNode(block));
    }
    if surface.block_kind(block).is_some_and(|k| !k.holds_text()) {
        return Ok(());
    }

    remove_empty_spans(surface, block)?;
    normalize_container(surface, block, true)
}

fn remove_empty_spans(surface: &mut Surface, block: NodeId) -> Result<(), TreeError> {
    for node in surface.descendants(block).into_iter().rev() {
        if surface.is_inline(node) && visible_len(&surface.text_content(node)) == 0 {
            surface.remove(node)?;
        }
    }
    Ok(())
}

fn normalize_container(
    surface: &mut Surface,
    container: NodeId,
    is_block: bool,
) -> Result<(), TreeError> {
    merge_adjacent_text(surface, container)?;

    for child in surface.children(container).to_vec() {
        if surface.is_inline(child) {
            normalize_container(surface, child, false)?;
        }
    }

    if is_block && !surface.first_child(container).is_some_and(|c| surface.is_text(c)) {
        let lead = surface.create_text(SENTINEL);
        let first = surface.first_child(container);
        surface.insert_before(container, lead, first)?;
    }

    let children = surface.children(container).to_vec();
    for (i, &child) in children.iter().enumerate() {
        let Some(text) = surface.text(child) else {
            continue;
        };
        let after_span = i > 0 && surface.is_inline(children[i - 1]);
        let value = if is_block || after_span {
            normalize_leading(text)
        } else {
            strip_sentinels(text)
        };
        if value.is_empty() {
            surface.remove(child)?;
        } else {
            surface.set_text(child, value)?;
        }
    }

    for child in surface.children(container).to_vec() {
        let followed_by_text = surface
            .next_sibling(child)
            .is_some_and(|n| surface.is_text(n));
        if surface.is_inline(child) && !followed_by_text {
            let trailing = surface.create_text(SENTINEL);
            surface.insert_after(child, trailing)?;
        }
    }

    Ok(())
}

fn merge_adjacent_text(surface: &mut Surface, container: NodeId) -> Result<(), TreeError> {
    let mut previous: Option<NodeId> = None;
    for child in surface.children(container).to_vec() {
        let Some(text) = surface.text(child).map(str::to_owned) else {
            previous = None;
            continue;
        };
        match previous.and_then(|p| surface.text(p).map(|t| (p, t.to_owned()))) {
            Some((prev, prev_text)) => {
                surface.set_text(prev, prev_text + &text)?;
                surface.remove(child)?;
            }
            None => previous = Some(child),
        }
    }
    Ok(())
}

/// Visible offset of `pos` within `block`, or `None` when `pos` is not
/// inside it.
pub fn visible_offset(surface: &Surface, block: NodeId, pos: Position) -> Option<usize> {
    if surface.closest_block(pos.node) != Some(block) {
        return None;
    }
    let order = surface.descendants(block);

    if let Some(text) = surface.text(pos.node) {
        let before: usize = order
            .iter()
            .take_while(|&&n| n != pos.node)
            .filter_map(|&n| surface.text(n))
            .map(visible_len)
            .sum();
        let within = text
            .chars()
            .take(pos.offset)
            .filter(|&c| c != SENTINEL)
            .count();
        return Some(before + within);
    }

    let at = order.iter().position(|&n| n == pos.node)?;
    let boundary = match surface.children(pos.node).get(pos.offset) {
        Some(child) => order.iter().position(|n| n == child)?,
        None => at + surface.descendants(pos.node).len(),
    };
    Some(
        order[..boundary]
            .iter()
            .filter_map(|&n| surface.text(n))
            .map(visible_len)
            .sum(),
    )
}

/// The caret's visible offset within `block`, if the caret is inside it.
pub fn capture_visible(surface: &Surface, cursor: &CursorHandle, block: NodeId) -> Option<usize> {
    visible_offset(surface, block, cursor.caret()?)
}

/// Puts a collapsed caret at visible offset `visible` inside `node`.
///
/// Where the offset falls on the boundary between a span's last text and
/// a text directly under the block, the block-level text wins, so the
/// caret lands outside the span. With no text at all the caret goes to
/// `(node, 0)`. Returns false only for a stale `node`.
pub fn place_cursor(
    surface: &Surface,
    cursor: &mut CursorHandle,
    node: NodeId,
    visible: usize,
) -> bool {
    if !surface.contains(node) {
        return false;
    }
    let texts = surface.text_nodes(node);
    let Some(&last) = texts.last() else {
        cursor.collapse(Position::new(node, 0));
        return true;
    };

    let block = surface.closest_block(node);
    let direct = |t: NodeId| block.is_some() && surface.parent(t) == block;

    let mut seen = 0;
    for (i, &t) in texts.iter().enumerate() {
        let text = surface.text(t).unwrap_or_default();
        let len = visible_len(text);
        if visible <= seen + len {
            let boundary = visible == seen + len;
            let prefer_next = texts
                .get(i + 1)
                .is_some_and(|&next| direct(next) && !direct(t));
            if !(boundary && prefer_next) {
                cursor.collapse(Position::new(t, raw_offset(text, visible - seen)));
                return true;
            }
        }
        seen += len;
    }

    cursor.collapse(Position::new(last, surface.text_len(last)));
    true
}

/// Caret to the start of `block`'s content.
pub fn move_to_start(surface: &Surface, cursor: &mut CursorHandle, block: NodeId) -> bool {
    place_cursor(surface, cursor, block, 0)
}

/// Caret to the end of `block`'s content.
pub fn move_to_end(surface: &Surface, cursor: &mut CursorHandle, block: NodeId) -> bool {
    let len = visible_len(&surface.text_content(block));
    place_cursor(surface, cursor, block, len)
}

/// Moves a caret sitting at the very end of a span onto the sentinel that
/// follows the span, creating one if needed.
pub fn escape_span(surface: &mut Surface, cursor: &mut CursorHandle) -> Result<bool, TreeError> {
    let Some(caret) = cursor.collapsed_caret() else {
        return Ok(false);
    };
    if !surface.is_text(caret.node) || caret.offset < surface.text_len(caret.node) {
        return Ok(false);
    }
    let Some(mut span) = surface.parent(caret.node).filter(|&p| surface.is_inline(p)) else {
        return Ok(false);
    };
    if surface.last_child(span) != Some(caret.node) {
        return Ok(false);
    }
    while let Some(parent) = surface.parent(span)
        && surface.is_inline(parent)
        && surface.last_child(parent) == Some(span)
    {
        span = parent;
    }

    let target = match surface.next_sibling(span) {
        Some(next) if surface.text(next).is_some_and(|t| t.starts_with(SENTINEL)) => next,
        _ => {
            let trailing = surface.create_text(SENTINEL);
            surface.insert_after(span, trailing)?;
            trailing
        }
    };
    cursor.collapse(Position::new(target, 1));
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{BlockKind, Fragment, InlineKind};
    use pretty_assertions::assert_eq;

    const S: &str = "\u{200B}";

    fn t(s: &str) -> Fragment {
        Fragment::text(s)
    }

    fn inline(kind: InlineKind, children: Vec<Fragment>) -> Fragment {
        Fragment::Inline { kind, children }
    }

    fn block_with(surface: &mut Surface, kind: BlockKind, children: Vec<Fragment>) -> NodeId {
        let block = surface.import(&Fragment::Block {
            kind,
            block_id: None,
            list_break: false,
            children,
        });
        let root = surface.root();
        surface.append(root, block).expect("attach");
        block
    }

    fn para(surface: &mut Surface, children: Vec<Fragment>) -> NodeId {
        block_with(surface, BlockKind::Paragraph, children)
    }

    fn children(surface: &Surface, block: NodeId) -> Vec<Fragment> {
        match surface.export(block).expect("export") {
            Fragment::Block { children, .. } => children,
            other => panic!("not a block: {other:?}"),
        }
    }

    #[test]
    fn empty_block_gets_a_lone_sentinel() {
        let mut surface = Surface::new();
        let block = para(&mut surface, vec![]);
        ensure_sentinel(&mut surface, block).expect("ensure");
        assert_eq!(children(&surface, block), vec![t(S)]);
    }

    #[test]
    fn duplicate_and_missing_sentinels_are_normalized() {
        let mut surface = Surface::new();
        let block = para(
            &mut surface,
            vec![
                t("ab\u{200B}\u{200B}"),
                t("cd"),
                inline(InlineKind::Strong, vec![t("\u{200B}bold")]),
                t("tail"),
            ],
        );
        ensure_sentinel(&mut surface, block).expect("ensure");
        assert_eq!(
            children(&surface, block),
            vec![
                t("\u{200B}abcd"),
                inline(InlineKind::Strong, vec![t("bold")]),
                t("\u{200B}tail"),
            ]
        );
    }

    #[test]
    fn spans_get_trailing_sentinels_and_empty_spans_vanish() {
        let mut surface = Surface::new();
        let block = para(
            &mut surface,
            vec![
                inline(InlineKind::Emphasis, vec![t("it")]),
                inline(InlineKind::Code, vec![t(S)]),
                inline(InlineKind::Strong, vec![]),
            ],
        );
        ensure_sentinel(&mut surface, block).expect("ensure");
        assert_eq!(
            children(&surface, block),
            vec![t(S), inline(InlineKind::Emphasis, vec![t("it")]), t(S)]
        );
    }

    #[test]
    fn nested_spans_follow_the_same_rules() {
        let mut surface = Surface::new();
        let block = para(
            &mut surface,
            vec![inline(
                InlineKind::Strong,
                vec![t("a "), inline(InlineKind::Emphasis, vec![t("b")])],
            )],
        );
        ensure_sentinel(&mut surface, block).expect("ensure");
        assert_eq!(
            children(&surface, block),
            vec![
                t(S),
                inline(
                    InlineKind::Strong,
                    vec![t("a "), inline(InlineKind::Emphasis, vec![t("b")]), t(S)]
                ),
                t(S),
            ]
        );
    }

    #[test]
    fn ensure_is_idempotent() {
        let mut surface = Surface::new();
        let block = para(
            &mut surface,
            vec![
                t("x"),
                t(""),
                inline(InlineKind::Strikethrough, vec![t("\u{200B}\u{200B}s")]),
                inline(InlineKind::Code, vec![t("c")]),
            ],
        );
        ensure_sentinel(&mut surface, block).expect("first");
        let once = children(&surface, block);
        ensure_sentinel(&mut surface, block).expect("second");
        assert_eq!(children(&surface, block), once);
    }

    #[test]
    fn rules_are_exempt() {
        let mut surface = Surface::new();
        let rule = block_with(&mut surface, BlockKind::Rule, vec![]);
        ensure_sentinel(&mut surface, rule).expect("ensure");
        assert!(surface.children(rule).is_empty());
    }

    #[test]
    fn raw_offsets_skip_sentinels() {
        assert_eq!(raw_offset("\u{200B}ab", 0), 1);
        assert_eq!(raw_offset("\u{200B}ab", 2), 3);
        assert_eq!(raw_offset(S, 0), 1);
        assert_eq!(raw_offset("ab", 5), 2);
    }

    #[test]
    fn place_cursor_prefers_block_level_text_at_span_boundaries() {
        let mut surface = Surface::new();
        let block = para(
            &mut surface,
            vec![
                t("\u{200B}ab"),
                inline(InlineKind::Strong, vec![t("cd")]),
                t(S),
            ],
        );
        let texts = surface.text_nodes(block);
        let mut cursor = CursorHandle::new();

        assert!(place_cursor(&surface, &mut cursor, block, 2));
        assert_eq!(cursor.caret(), Some(Position::new(texts[0], 3)));

        assert!(place_cursor(&surface, &mut cursor, block, 3));
        assert_eq!(cursor.caret(), Some(Position::new(texts[1], 1)));

        assert!(place_cursor(&surface, &mut cursor, block, 4));
        assert_eq!(cursor.caret(), Some(Position::new(texts[2], 1)));

        assert!(place_cursor(&surface, &mut cursor, block, 40));
        assert_eq!(cursor.caret(), Some(Position::new(texts[2], 1)));
    }

    #[test]
    fn place_cursor_without_text_uses_the_node() {
        let mut surface = Surface::new();
        let rule = block_with(&mut surface, BlockKind::Rule, vec![]);
        let mut cursor = CursorHandle::new();
        assert!(place_cursor(&surface, &mut cursor, rule, 3));
        assert_eq!(cursor.caret(), Some(Position::new(rule, 0)));
    }

    #[test]
    fn visible_offset_round_trips_through_place_cursor() {
        let mut surface = Surface::new();
        let block = para(
            &mut surface,
            vec![
                t("\u{200B}one "),
                inline(InlineKind::Emphasis, vec![t("two")]),
                t("\u{200B} three"),
            ],
        );
        let mut cursor = CursorHandle::new();
        for visible in 0..=13 {
            place_cursor(&surface, &mut cursor, block, visible);
            let caret = cursor.caret().expect("caret");
            assert_eq!(visible_offset(&surface, block, caret), Some(visible));
        }
        assert_eq!(
            visible_offset(&surface, block, Position::new(block, 2)),
            Some(7)
        );
    }

    #[test]
    fn escape_moves_caret_past_the_span() {
        let mut surface = Surface::new();
        let block = para(
            &mut surface,
            vec![
                t(S),
                inline(
                    InlineKind::Strong,
                    vec![inline(InlineKind::Emphasis, vec![t("x")])],
                ),
            ],
        );
        let inner = surface.text_nodes(block)[1];
        let mut cursor = CursorHandle::new();
        cursor.collapse(Position::new(inner, 1));

        assert_eq!(escape_span(&mut surface, &mut cursor), Ok(true));
        let caret = cursor.caret().expect("caret");
        assert_eq!(surface.text(caret.node), Some(S));
        assert_eq!(surface.parent(caret.node), Some(block));
        assert_eq!(caret.offset, 1);

        // Already outside: nothing to escape.
        assert_eq!(escape_span(&mut surface, &mut cursor), Ok(false));
    }
}
