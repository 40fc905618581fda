//! Actions every editor starts with.

use log::trace;

use crate::{
    editing::{
        Position,
        host_input::{caret_in_block, merge_blocks, previous_block, split_block_as},
        sentinel::{SENTINEL, ensure_sentinel, escape_span, move_to_start},
    },
    error::TreeError,
    history::HistoryEntryType,
    tree::{BlockKind, Fragment, NodeId, Surface},
};

use super::{Action, ActionContext, ActionOutcome, ActionRegistry, Key, KeyInput};

pub fn register_all(registry: &mut ActionRegistry) {
    registry.register("arrow-right-escape", Box::new(ArrowRightEscape));
    registry.register("arrow-left-skip", Box::new(ArrowLeftSkip));
    registry.register("backspace-merge", Box::new(BackspaceMerge));
    registry.register("heading-enter", Box::new(HeadingEnter));
    registry.register("undo", Box::new(Undo));
    registry.register("redo", Box::new(Redo));
}

/// ArrowRight at the end of a span steps out onto the sentinel after it,
/// so the next keystroke is unformatted.
#[derive(Debug, Default)]
pub struct ArrowRightEscape;

impl Action for ArrowRightEscape {
    fn can_handle(&self, key: &KeyInput, ctx: &ActionContext<'_>) -> bool {
        key.key == Key::ArrowRight && key.is_plain() && !key.shift && at_span_end(ctx)
    }

    fn handle(
        &mut self,
        _key: &KeyInput,
        ctx: &mut ActionContext<'_>,
    ) -> Result<ActionOutcome, TreeError> {
        Ok(match escape_span(ctx.surface, ctx.cursor)? {
            true => ActionOutcome::Moved,
            false => ActionOutcome::Pass,
        })
    }
}

fn at_span_end(ctx: &ActionContext<'_>) -> bool {
    let surface = &*ctx.surface;
    let Some(caret) = ctx.cursor.collapsed_caret() else {
        return false;
    };
    surface.is_text(caret.node)
        && caret.offset >= surface.text_len(caret.node)
        && surface
            .parent(caret.node)
            .is_some_and(|p| surface.is_inline(p) && surface.last_child(p) == Some(caret.node))
}

/// ArrowLeft just after a span enters the span at its end instead of
/// stopping in front of the sentinel.
#[derive(Debug, Default)]
pub struct ArrowLeftSkip;

impl Action for ArrowLeftSkip {
    fn can_handle(&self, key: &KeyInput, ctx: &ActionContext<'_>) -> bool {
        key.key == Key::ArrowLeft
            && key.is_plain()
            && !key.shift
            && span_before_caret(ctx.surface, ctx.cursor.collapsed_caret()).is_some()
    }

    fn handle(
        &mut self,
        _key: &KeyInput,
        ctx: &mut ActionContext<'_>,
    ) -> Result<ActionOutcome, TreeError> {
        let Some(span) = span_before_caret(ctx.surface, ctx.cursor.collapsed_caret()) else {
            return Ok(ActionOutcome::Pass);
        };
        let Some(&last) = ctx.surface.text_nodes(span).last() else {
            return Ok(ActionOutcome::Pass);
        };
        let end = ctx.surface.text_len(last);
        ctx.cursor.collapse(Position::new(last, end));
        Ok(ActionOutcome::Moved)
    }
}

/// The span right before a caret that sits on a leading sentinel.
fn span_before_caret(surface: &Surface, caret: Option<Position>) -> Option<NodeId> {
    let caret = caret?;
    let text = surface.text(caret.node)?;
    if !text.starts_with(SENTINEL) || caret.offset > 1 {
        return None;
    }
    surface
        .prev_sibling(caret.node)
        .filter(|&prev| surface.is_inline(prev))
}

/// Backspace at visible offset 0 merges the block into its predecessor.
/// A structural first block is turned into a paragraph instead.
#[derive(Debug, Default)]
pub struct BackspaceMerge;

impl Action for BackspaceMerge {
    fn can_handle(&self, key: &KeyInput, ctx: &ActionContext<'_>) -> bool {
        key.key == Key::Backspace
            && key.is_plain()
            && ctx.cursor.collapsed_caret().is_some()
            && caret_in_block(ctx.surface, ctx.cursor).is_some_and(|(_, visible)| visible == 0)
    }

    fn handle(
        &mut self,
        _key: &KeyInput,
        ctx: &mut ActionContext<'_>,
    ) -> Result<ActionOutcome, TreeError> {
        let Some((block, 0)) = caret_in_block(ctx.surface, ctx.cursor) else {
            return Ok(ActionOutcome::Pass);
        };

        if let Some(prev) = previous_block(ctx.surface, block) {
            trace!("Merging {block} into {prev}");
            merge_blocks(ctx.surface, ctx.cursor, prev, block)?;
            return Ok(ActionOutcome::Edited(HistoryEntryType::Merge));
        }

        match ctx.surface.block_kind(block) {
            Some(BlockKind::Paragraph) | None => Ok(ActionOutcome::Pass),
            Some(_) => {
                demote_to_paragraph(ctx, block)?;
                Ok(ActionOutcome::Edited(HistoryEntryType::Format))
            }
        }
    }
}

/// Swaps `block` for a paragraph with the same id and content.
fn demote_to_paragraph(ctx: &mut ActionContext<'_>, block: NodeId) -> Result<NodeId, TreeError> {
    let children = match ctx.surface.export(block)? {
        Fragment::Block { children, .. } => children,
        _ => vec![],
    };
    let replacement = ctx.surface.import(&Fragment::Block {
        kind: BlockKind::Paragraph,
        block_id: ctx.surface.block_id(block),
        list_break: false,
        children,
    });
    ctx.surface.replace(block, replacement)?;
    ensure_sentinel(ctx.surface, replacement)?;
    move_to_start(ctx.surface, ctx.cursor, replacement);
    Ok(replacement)
}

/// Enter in a heading continues with a paragraph, not another heading.
#[derive(Debug, Default)]
pub struct HeadingEnter;

impl Action for HeadingEnter {
    fn can_handle(&self, key: &KeyInput, ctx: &ActionContext<'_>) -> bool {
        key.key == Key::Enter
            && key.is_plain()
            && caret_in_block(ctx.surface, ctx.cursor).is_some_and(|(block, _)| {
                matches!(
                    ctx.surface.block_kind(block),
                    Some(BlockKind::Heading { .. })
                )
            })
    }

    fn handle(
        &mut self,
        _key: &KeyInput,
        ctx: &mut ActionContext<'_>,
    ) -> Result<ActionOutcome, TreeError> {
        Ok(
            match split_block_as(ctx.surface, ctx.cursor, Some(BlockKind::Paragraph))? {
                Some(_) => ActionOutcome::Edited(HistoryEntryType::Split),
                None => ActionOutcome::Pass,
            },
        )
    }
}

#[derive(Debug, Default)]
pub struct Undo;

impl Action for Undo {
    fn can_handle(&self, key: &KeyInput, _ctx: &ActionContext<'_>) -> bool {
        key.is_command_char('z') && !key.shift
    }

    fn handle(
        &mut self,
        _key: &KeyInput,
        _ctx: &mut ActionContext<'_>,
    ) -> Result<ActionOutcome, TreeError> {
        Ok(ActionOutcome::Undo)
    }
}

#[derive(Debug, Default)]
pub struct Redo;

impl Action for Redo {
    fn can_handle(&self, key: &KeyInput, _ctx: &ActionContext<'_>) -> bool {
        (key.is_command_char('z') && key.shift) || key.is_command_char('y')
    }

    fn handle(
        &mut self,
        _key: &KeyInput,
        _ctx: &mut ActionContext<'_>,
    ) -> Result<ActionOutcome, TreeError> {
        Ok(ActionOutcome::Redo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        editing::{
            CursorHandle,
            render::render_document,
            sentinel::{capture_visible, place_cursor},
        },
        parsing::{ClassifyOptions, to_markdown},
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn setup(markdown: &str) -> (Surface, CursorHandle, Vec<NodeId>) {
        let mut surface = Surface::new();
        let blocks =
            render_document(&mut surface, markdown, ClassifyOptions::default()).expect("render");
        (surface, CursorHandle::new(), blocks)
    }

    fn run(
        registry: &mut ActionRegistry,
        key: KeyInput,
        surface: &mut Surface,
        cursor: &mut CursorHandle,
    ) -> Option<ActionOutcome> {
        let mut ctx = ActionContext { surface, cursor };
        registry
            .dispatch(&key, &mut ctx)
            .expect("dispatch")
            .map(|(_, outcome)| outcome)
    }

    #[test]
    fn arrow_right_escapes_span_end() {
        let (mut surface, mut cursor, blocks) = setup("a **b**");
        let strong = surface.children(blocks[0])[1];
        let inner = surface.children(strong)[0];
        cursor.collapse(Position::new(inner, 1));

        let mut registry = ActionRegistry::with_builtins();
        let outcome = run(
            &mut registry,
            KeyInput::new(Key::ArrowRight),
            &mut surface,
            &mut cursor,
        );
        assert_eq!(outcome, Some(ActionOutcome::Moved));

        let caret = cursor.caret().expect("caret");
        assert_eq!(surface.parent(caret.node), Some(blocks[0]));
        assert_eq!(surface.text(caret.node), Some(SENTINEL.to_string().as_str()));
        assert_eq!(caret.offset, 1);
    }

    #[test]
    fn arrow_left_enters_span_from_the_right() {
        let (mut surface, mut cursor, blocks) = setup("**b** c");
        place_cursor(&surface, &mut cursor, blocks[0], 1);
        let caret = cursor.caret().expect("caret");
        assert_eq!(surface.parent(caret.node), Some(blocks[0]));

        let mut registry = ActionRegistry::with_builtins();
        let outcome = run(
            &mut registry,
            KeyInput::new(Key::ArrowLeft),
            &mut surface,
            &mut cursor,
        );
        assert_eq!(outcome, Some(ActionOutcome::Moved));
        let caret = cursor.caret().expect("caret");
        assert!(surface.is_inline(surface.parent(caret.node).expect("parent")));
        assert_eq!(capture_visible(&surface, &cursor, blocks[0]), Some(1));
    }

    #[test]
    fn backspace_at_block_start_merges() {
        let (mut surface, mut cursor, blocks) = setup("one\ntwo");
        place_cursor(&surface, &mut cursor, blocks[1], 0);

        let mut registry = ActionRegistry::with_builtins();
        let outcome = run(
            &mut registry,
            KeyInput::new(Key::Backspace),
            &mut surface,
            &mut cursor,
        );
        assert_eq!(outcome, Some(ActionOutcome::Edited(HistoryEntryType::Merge)));
        assert_eq!(to_markdown(&surface), "onetwo\n");
        assert_eq!(capture_visible(&surface, &cursor, blocks[0]), Some(3));
    }

    #[test]
    fn backspace_in_first_heading_demotes_it() {
        let (mut surface, mut cursor, blocks) = setup("## Title");
        let id = surface.block_id(blocks[0]);
        place_cursor(&surface, &mut cursor, blocks[0], 0);

        let mut registry = ActionRegistry::with_builtins();
        let outcome = run(
            &mut registry,
            KeyInput::new(Key::Backspace),
            &mut surface,
            &mut cursor,
        );
        assert_eq!(outcome, Some(ActionOutcome::Edited(HistoryEntryType::Format)));
        assert_eq!(to_markdown(&surface), "Title\n");
        let block = surface.blocks()[0];
        assert_eq!(surface.block_id(block), id);
    }

    #[test]
    fn backspace_in_first_paragraph_falls_through() {
        let (mut surface, mut cursor, blocks) = setup("one");
        place_cursor(&surface, &mut cursor, blocks[0], 0);
        let mut registry = ActionRegistry::with_builtins();
        let outcome = run(
            &mut registry,
            KeyInput::new(Key::Backspace),
            &mut surface,
            &mut cursor,
        );
        assert_eq!(outcome, None);
    }

    #[test]
    fn enter_in_heading_continues_with_paragraph() {
        let (mut surface, mut cursor, blocks) = setup("# Title here");
        place_cursor(&surface, &mut cursor, blocks[0], 5);

        let mut registry = ActionRegistry::with_builtins();
        let outcome = run(
            &mut registry,
            KeyInput::new(Key::Enter),
            &mut surface,
            &mut cursor,
        );
        assert_eq!(outcome, Some(ActionOutcome::Edited(HistoryEntryType::Split)));
        assert_eq!(to_markdown(&surface), "# Title\n\n here\n");
    }

    #[rstest]
    #[case(KeyInput::char('z').with_ctrl(), Some(ActionOutcome::Undo))]
    #[case(KeyInput::char('z').with_meta(), Some(ActionOutcome::Undo))]
    #[case(KeyInput::char('Z').with_ctrl().with_shift(), Some(ActionOutcome::Redo))]
    #[case(KeyInput::char('y').with_ctrl(), Some(ActionOutcome::Redo))]
    #[case(KeyInput::char('z'), None)]
    fn history_shortcuts(#[case] key: KeyInput, #[case] expected: Option<ActionOutcome>) {
        let (mut surface, mut cursor, _) = setup("text");
        let mut registry = ActionRegistry::with_builtins();
        assert_eq!(run(&mut registry, key, &mut surface, &mut cursor), expected);
    }
}
