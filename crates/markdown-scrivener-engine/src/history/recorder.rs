use std::time::{Duration, Instant};

use log::trace;

use crate::{
    editing::{CursorHandle, Debounced, host_input::caret_in_block},
    error::HistoryError,
    tree::{BlockId, Surface},
};

use super::{
    capture::{capture_selection, capture_state, diff_states},
    manager::{EntryId, HistoryManager},
    types::{HistoryEntryData, HistoryEntryType, HistoryState},
};

/// Turns edits into history entries by diffing against the last commit.
///
/// Typing is debounced: keystrokes in one block collapse into a single
/// entry once the quiet period passes, or earlier when something flushes
/// it (a destructive key, an undo, moving to another block).
#[derive(Debug)]
pub struct HistoryRecorder {
    baseline: HistoryState,
    typing: Debounced<Option<BlockId>>,
}

impl HistoryRecorder {
    pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

    pub fn new(debounce: Duration) -> Self {
        Self {
            baseline: HistoryState::default(),
            typing: Debounced::new(debounce),
        }
    }

    pub fn baseline(&self) -> &HistoryState {
        &self.baseline
    }

    pub fn has_pending_typing(&self) -> bool {
        self.typing.is_pending()
    }

    /// Forgets pending typing and re-captures the baseline from the
    /// surface as it is now.
    pub fn rebase(&mut self, surface: &Surface, cursor: &CursorHandle) -> Result<(), HistoryError> {
        self.typing.cancel();
        self.baseline = capture_state(surface, cursor)?;
        Ok(())
    }

    /// Keeps the baseline selection in step with caret moves made while no
    /// typing is pending.
    pub fn sync_selection(&mut self, surface: &Surface, cursor: &CursorHandle) {
        if !self.typing.is_pending() {
            self.baseline.selection = capture_selection(surface, cursor);
        }
    }

    /// Call before applying an edit: commits pending typing when the edit
    /// is not typing or happens in a different block.
    pub fn before_edit(
        &mut self,
        history: &mut HistoryManager,
        surface: &Surface,
        cursor: &CursorHandle,
        kind: HistoryEntryType,
    ) -> Result<Option<EntryId>, HistoryError> {
        let block = current_block_id(surface, cursor);
        let other_block = self.typing.pending().is_some_and(|&pending| pending != block);
        if kind != HistoryEntryType::Typing || other_block {
            return self.flush(history, surface, cursor);
        }
        Ok(None)
    }

    /// Call after applying an edit. Typing is scheduled; anything else is
    /// committed straight away.
    pub fn after_edit(
        &mut self,
        history: &mut HistoryManager,
        surface: &Surface,
        cursor: &CursorHandle,
        kind: HistoryEntryType,
        now: Instant,
    ) -> Result<Option<EntryId>, HistoryError> {
        if kind == HistoryEntryType::Typing {
            self.typing.schedule(current_block_id(surface, cursor), now);
            return Ok(None);
        }
        self.commit(history, surface, cursor, kind)
    }

    /// Commits pending typing whose quiet period is over.
    pub fn tick(
        &mut self,
        history: &mut HistoryManager,
        surface: &Surface,
        cursor: &CursorHandle,
        now: Instant,
    ) -> Result<Option<EntryId>, HistoryError> {
        match self.typing.take_due(now) {
            Some(_) => self.commit(history, surface, cursor, HistoryEntryType::Typing),
            None => Ok(None),
        }
    }

    /// Commits pending typing now.
    pub fn flush(
        &mut self,
        history: &mut HistoryManager,
        surface: &Surface,
        cursor: &CursorHandle,
    ) -> Result<Option<EntryId>, HistoryError> {
        self.flush_as(history, surface, cursor, HistoryEntryType::Typing)
    }

    /// Commits pending typing now, recorded as `kind`.
    pub fn flush_as(
        &mut self,
        history: &mut HistoryManager,
        surface: &Surface,
        cursor: &CursorHandle,
        kind: HistoryEntryType,
    ) -> Result<Option<EntryId>, HistoryError> {
        match self.typing.flush() {
            Some(_) => self.commit(history, surface, cursor, kind),
            None => Ok(None),
        }
    }

    /// Diffs the surface against the baseline and pushes an entry when
    /// any block changed. Nothing is recorded while history is restoring.
    pub fn commit(
        &mut self,
        history: &mut HistoryManager,
        surface: &Surface,
        cursor: &CursorHandle,
        kind: HistoryEntryType,
    ) -> Result<Option<EntryId>, HistoryError> {
        let current = capture_state(surface, cursor)?;
        let (before, after) = diff_states(&self.baseline, &current);
        self.baseline = current;

        if history.is_restoring() {
            trace!("Not recording {kind:?} while restoring");
            return Ok(None);
        }
        if before.is_empty() && after.is_empty() {
            return Ok(None);
        }
        Ok(Some(history.push(HistoryEntryData {
            entry_type: kind,
            before,
            after,
        })))
    }
}

impl Default for HistoryRecorder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DEBOUNCE)
    }
}

fn current_block_id(surface: &Surface, cursor: &CursorHandle) -> Option<BlockId> {
    let (block, _) = caret_in_block(surface, cursor)?;
    surface.block_id(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        editing::{host_input::insert_text, render::render_document, sentinel::place_cursor},
        parsing::{ClassifyOptions, to_markdown},
    };

    const MS: Duration = Duration::from_millis(1);

    fn setup(md: &str) -> (Surface, CursorHandle, HistoryManager, HistoryRecorder) {
        let mut surface = Surface::new();
        render_document(&mut surface, md, ClassifyOptions::default()).expect("render");
        let mut cursor = CursorHandle::new();
        let first = surface.blocks()[0];
        place_cursor(&surface, &mut cursor, first, 0);
        let mut recorder = HistoryRecorder::default();
        recorder.rebase(&surface, &cursor).expect("rebase");
        (surface, cursor, HistoryManager::default(), recorder)
    }

    fn type_char(
        surface: &mut Surface,
        cursor: &mut CursorHandle,
        history: &mut HistoryManager,
        recorder: &mut HistoryRecorder,
        c: &str,
        now: Instant,
    ) {
        let kind = HistoryEntryType::Typing;
        recorder.before_edit(history, surface, cursor, kind).expect("before");
        insert_text(surface, cursor, c).expect("insert");
        recorder.after_edit(history, surface, cursor, kind, now).expect("after");
    }

    #[test]
    fn a_typing_burst_becomes_one_entry() {
        let (mut surface, mut cursor, mut history, mut recorder) = setup("x");
        let t0 = Instant::now();
        for (i, c) in ["a", "b", "c"].into_iter().enumerate() {
            let now = t0 + MS * (i as u32 * 100);
            type_char(&mut surface, &mut cursor, &mut history, &mut recorder, c, now);
        }
        assert!(history.is_empty());
        assert_eq!(recorder.tick(&mut history, &surface, &cursor, t0 + MS * 300).expect("tick"), None);

        let entry = recorder
            .tick(&mut history, &surface, &cursor, t0 + MS * 700)
            .expect("tick");
        assert!(entry.is_some());
        assert_eq!(history.len(), 1);
        assert_eq!(to_markdown(&surface), "abcx\n");
    }

    #[test]
    fn destructive_edits_flush_pending_typing_first() {
        let (mut surface, mut cursor, mut history, mut recorder) = setup("x");
        let t0 = Instant::now();
        type_char(&mut surface, &mut cursor, &mut history, &mut recorder, "a", t0);

        let flushed = recorder
            .before_edit(&mut history, &surface, &cursor, HistoryEntryType::Delete)
            .expect("before");
        assert!(flushed.is_some());
        assert_eq!(
            history.current().map(|e| e.entry_type),
            Some(HistoryEntryType::Typing)
        );
    }

    #[test]
    fn no_entry_without_block_changes() {
        let (surface, cursor, mut history, mut recorder) = setup("x");
        let pushed = recorder
            .commit(&mut history, &surface, &cursor, HistoryEntryType::Format)
            .expect("commit");
        assert_eq!(pushed, None);
    }

    #[test]
    fn nothing_is_recorded_while_restoring() {
        let (mut surface, mut cursor, mut history, mut recorder) = setup("x");
        type_char(&mut surface, &mut cursor, &mut history, &mut recorder, "a", Instant::now());
        recorder.flush(&mut history, &surface, &cursor).expect("flush");
        history.undo();

        insert_text(&mut surface, &mut cursor, "b").expect("insert");
        let pushed = recorder
            .commit(&mut history, &surface, &cursor, HistoryEntryType::Typing)
            .expect("commit");
        assert_eq!(pushed, None);
        assert!(history.can_redo());
    }
}
