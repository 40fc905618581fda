//! The engine as a host sees it.
//!
//! An [`Editor`] owns the observed surface, the cursor handle, the
//! reformatting coordinator, undo history and the action registry. The
//! host feeds it key presses and calls [`Editor::tick`] whenever time
//! passes; nothing here spawns a timer or a thread.

use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::{
    actions::{Action, ActionContext, ActionOutcome, ActionRegistry, Key, KeyInput},
    editing::{
        Coordinator, CoordinatorOptions, CursorHandle, Position,
        coordinator::{assign_block_ids, normalize_root},
        host_input::{
            caret_in_block, delete_backward, delete_forward, insert_text, move_down, move_left,
            move_right, move_up, split_block,
        },
        render::render_document,
        sentinel::{ensure_sentinel, move_to_start},
    },
    error::HistoryError,
    history::{
        EntryId, HistoryEntryType, HistoryManager, HistoryMetrics, HistoryRecorder, HistoryState,
        MetricsObserver, restore_state,
    },
    parsing::{ClassifyOptions, ParseCache, to_markdown},
    tree::{BlockId, Surface},
};

/// Tuning knobs for one editor instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Undo entries kept; 0 keeps everything.
    pub history_max_size: usize,
    /// Quiet period that collapses keystrokes into one undo entry.
    pub history_debounce: Duration,
    pub reformat_delay: Duration,
    pub typing_gate: Duration,
    pub parse_cache_size: usize,
    pub preserve_structure: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        let coordinator = CoordinatorOptions::default();
        Self {
            history_max_size: HistoryManager::DEFAULT_MAX_SIZE,
            history_debounce: HistoryRecorder::DEFAULT_DEBOUNCE,
            reformat_delay: coordinator.reformat_delay,
            typing_gate: coordinator.typing_gate,
            parse_cache_size: ParseCache::DEFAULT_CAPACITY,
            preserve_structure: coordinator.preserve_structure,
        }
    }
}

impl EngineOptions {
    pub fn coordinator(&self) -> CoordinatorOptions {
        CoordinatorOptions {
            reformat_delay: self.reformat_delay,
            typing_gate: self.typing_gate,
            parse_cache_size: self.parse_cache_size,
            preserve_structure: self.preserve_structure,
        }
    }

    pub fn classify(&self) -> ClassifyOptions {
        ClassifyOptions {
            preserve_structure: self.preserve_structure,
            ..ClassifyOptions::default()
        }
    }
}

pub struct Editor {
    options: EngineOptions,
    surface: Surface,
    cursor: CursorHandle,
    coordinator: Coordinator,
    history: HistoryManager,
    recorder: HistoryRecorder,
    actions: ActionRegistry,
    attached: bool,
}

impl Editor {
    /// An editor attached to a fresh empty surface, with the built-in
    /// actions registered.
    pub fn new(options: EngineOptions) -> Self {
        let mut editor = Self {
            options,
            surface: Surface::new(),
            cursor: CursorHandle::new(),
            coordinator: Coordinator::new(options.coordinator()),
            history: HistoryManager::new(options.history_max_size),
            recorder: HistoryRecorder::new(options.history_debounce),
            actions: ActionRegistry::with_builtins(),
            attached: false,
        };
        editor.bind();
        editor
    }

    /// Binds the editor to `surface` and starts observing it.
    ///
    /// Stray root content is wrapped, blocks get ids and sentinels, the
    /// caret goes to the start of the first block and history starts over.
    pub fn attach(&mut self, surface: Surface) {
        self.surface = surface;
        self.bind();
    }

    fn bind(&mut self) {
        {
            let mut guard = self.surface.paused();
            if let Err(e) = normalize_surface(&mut guard, &mut self.cursor) {
                warn!("Failed to normalize attached surface: {e}");
            }
        }
        self.surface.take_records();
        self.surface.observe(true);

        self.attached = true;
        self.reset_caret();
        self.reset_history();
        debug!("Attached surface with {} blocks", self.surface.blocks().len());
    }

    /// Replaces the document with `markdown`, rendered and formatted.
    /// History is cleared.
    pub fn set_content(&mut self, markdown: &str) {
        let result = {
            let mut surface = self.surface.paused();
            render_document(&mut surface, markdown, self.options.classify())
        };
        match result {
            Ok(blocks) => debug!("Loaded {} blocks", blocks.len()),
            Err(e) => {
                warn!("Failed to render content, starting empty: {e}");
                if let Err(e) = self.surface.paused().clear() {
                    warn!("Failed to clear surface: {e}");
                }
            }
        }
        self.surface.take_records();
        self.reset_caret();
        self.reset_history();
    }

    pub fn get_markdown(&self) -> String {
        to_markdown(&self.surface)
    }

    pub fn register_action(&mut self, name: impl Into<String>, action: impl Action + 'static) {
        self.actions.register(name, Box::new(action));
    }

    pub fn unregister_action(&mut self, name: &str) -> bool {
        self.actions.unregister(name)
    }

    /// Feeds one key press. Returns whether anything handled it.
    pub fn handle_key(&mut self, key: KeyInput, now: Instant) -> bool {
        if !self.attached {
            return false;
        }

        let matching = {
            let ctx = ActionContext {
                surface: &mut self.surface,
                cursor: &mut self.cursor,
            };
            self.actions.matching(&key, &ctx)
        };
        if !matching.is_empty() && !key.key.is_arrow() {
            self.flush_history();
        }

        for name in matching {
            let before = self.cursor.clone();
            self.coordinator.begin_edit();
            let result = {
                let mut ctx = ActionContext {
                    surface: &mut self.surface,
                    cursor: &mut self.cursor,
                };
                self.actions.run(&name, &key, &mut ctx)
            };
            self.end_edit(now);

            match result {
                Ok(ActionOutcome::Pass) => continue,
                Ok(ActionOutcome::Moved) => {
                    self.after_move(&before);
                    return true;
                }
                Ok(ActionOutcome::Edited(kind)) => {
                    self.finish_edit(kind, now);
                    return true;
                }
                Ok(ActionOutcome::Undo) => {
                    self.undo();
                    return true;
                }
                Ok(ActionOutcome::Redo) => {
                    self.redo();
                    return true;
                }
                Err(e) => {
                    warn!("Action {name} failed: {e}");
                    self.run_due(now, true);
                    return true;
                }
            }
        }

        if key.key.is_arrow() {
            self.native_move(key.key)
        } else {
            self.native_edit(key, now)
        }
    }

    /// Lets time pass: processes a due reformat batch and commits typing
    /// whose quiet period is over.
    pub fn tick(&mut self, now: Instant) {
        if !self.attached {
            return;
        }
        self.run_due(now, true);
        let result = self
            .recorder
            .tick(&mut self.history, &self.surface, &self.cursor, now);
        log_recorded(result);
    }

    /// The earliest instant at which [`Editor::tick`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.coordinator.deadline()
    }

    pub fn undo(&mut self) -> bool {
        if !self.attached {
            return false;
        }
        self.flush_history();
        match self.history.undo() {
            Some(state) => {
                self.apply_history(&state);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        if !self.attached {
            return false;
        }
        self.flush_history();
        match self.history.redo() {
            Some(state) => {
                self.apply_history(&state);
                true
            }
            None => false,
        }
    }

    /// Processes any pending reformat and commits pending typing now.
    pub fn flush_history(&mut self) {
        if !self.attached {
            return;
        }
        if self.coordinator.has_pending() {
            self.process(true);
        }
        let result = self
            .recorder
            .flush(&mut self.history, &self.surface, &self.cursor);
        log_recorded(result);
    }

    /// Stops observing and drops pending work. Pending typing is committed
    /// first so it can still be undone through [`Editor::history`].
    pub fn destroy(&mut self) {
        if !self.attached {
            return;
        }
        self.flush_history();
        self.coordinator.cancel();
        self.surface.observe(false);
        self.surface.take_records();
        self.attached = false;
        info!("Editor detached");
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn cursor(&self) -> &CursorHandle {
        &self.cursor
    }

    /// Moves the caret as the host would on a click.
    pub fn set_caret(&mut self, position: Position) {
        let before = self.cursor.clone();
        self.cursor.collapse(position);
        self.after_move(&before);
    }

    /// The block holding the caret and the caret's visible offset in it.
    pub fn caret(&self) -> Option<(BlockId, usize)> {
        let (block, visible) = caret_in_block(&self.surface, &self.cursor)?;
        Some((self.surface.block_id(block)?, visible))
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn history_metrics(&self) -> HistoryMetrics {
        self.history.metrics()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn set_on_history_change(&mut self, observer: Option<MetricsObserver>) {
        self.history.set_on_metrics_change(observer);
    }

    fn native_move(&mut self, key: Key) -> bool {
        let before = self.cursor.clone();
        let moved = match key {
            Key::ArrowLeft => move_left(&self.surface, &mut self.cursor),
            Key::ArrowRight => move_right(&self.surface, &mut self.cursor),
            Key::ArrowUp => move_up(&self.surface, &mut self.cursor),
            Key::ArrowDown => move_down(&self.surface, &mut self.cursor),
            _ => false,
        };
        if moved {
            self.after_move(&before);
        }
        moved
    }

    fn native_edit(&mut self, key: KeyInput, now: Instant) -> bool {
        if key.command() {
            return false;
        }
        let kind = match key.key {
            Key::Char(_) => HistoryEntryType::Typing,
            Key::Backspace | Key::Delete => HistoryEntryType::Delete,
            Key::Enter => HistoryEntryType::Split,
            _ => return false,
        };

        let result = self
            .recorder
            .before_edit(&mut self.history, &self.surface, &self.cursor, kind);
        log_recorded(result);

        self.coordinator.begin_edit();
        let result = match key.key {
            Key::Char(c) => {
                let mut buf = [0; 4];
                insert_text(&mut self.surface, &mut self.cursor, c.encode_utf8(&mut buf))
            }
            Key::Backspace => delete_backward(&mut self.surface, &mut self.cursor),
            Key::Delete => delete_forward(&mut self.surface, &mut self.cursor),
            _ => split_block(&mut self.surface, &mut self.cursor).map(|b| b.is_some()),
        };
        self.end_edit(now);

        let changed = result.unwrap_or_else(|e| {
            warn!("Native {kind:?} edit failed: {e}");
            true
        });
        if !changed {
            return false;
        }

        self.finish_edit(kind, now);
        true
    }

    fn end_edit(&mut self, now: Instant) {
        if let Err(e) = self
            .coordinator
            .end_edit(&mut self.surface, &mut self.cursor, now)
        {
            warn!("Failed to accept mutations: {e}");
        }
    }

    /// Reformats and records a finished edit. Typing is scheduled before
    /// the reformat so a reformat can commit it as a format entry; any other
    /// edit is committed together with its reformat.
    fn finish_edit(&mut self, kind: HistoryEntryType, now: Instant) {
        if kind == HistoryEntryType::Typing {
            self.record_edit(kind, now);
            self.run_due(now, true);
        } else {
            self.run_due(now, false);
            self.record_edit(kind, now);
        }
    }

    fn record_edit(&mut self, kind: HistoryEntryType, now: Instant) {
        let result =
            self.recorder
                .after_edit(&mut self.history, &self.surface, &self.cursor, kind, now);
        log_recorded(result);
    }

    /// Caret moved: typing is committed when the caret left its block,
    /// otherwise the baseline selection follows the caret.
    fn after_move(&mut self, before: &CursorHandle) {
        let left_block = match (
            caret_in_block(&self.surface, before),
            caret_in_block(&self.surface, &self.cursor),
        ) {
            (Some((a, _)), Some((b, _))) => a != b,
            _ => true,
        };
        if left_block && self.recorder.has_pending_typing() {
            let result = self.recorder.flush(&mut self.history, &self.surface, before);
            log_recorded(result);
        }
        self.recorder.sync_selection(&self.surface, &self.cursor);
    }

    fn run_due(&mut self, now: Instant, record: bool) {
        if self.coordinator.due(now) {
            self.process(record);
        }
    }

    /// Runs the pending batch. With `record`, a batch that reformatted
    /// anything commits pending typing as a format entry.
    fn process(&mut self, record: bool) {
        let outcome = match self.coordinator.process(&mut self.surface, &mut self.cursor) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Reformat failed: {e}");
                return;
            }
        };
        if !(record && outcome.changed()) {
            return;
        }
        let result = if self.recorder.has_pending_typing() {
            self.recorder.flush_as(
                &mut self.history,
                &self.surface,
                &self.cursor,
                HistoryEntryType::Format,
            )
        } else {
            self.recorder.commit(
                &mut self.history,
                &self.surface,
                &self.cursor,
                HistoryEntryType::Format,
            )
        };
        log_recorded(result);
    }

    fn apply_history(&mut self, state: &HistoryState) {
        self.coordinator.cancel();
        let result = {
            let mut surface = self.surface.paused();
            restore_state(&mut surface, &mut self.cursor, state)
        };
        if let Err(e) = result {
            warn!("History restore incomplete: {e}");
        }
        self.surface.take_records();
        if let Err(e) = self.recorder.rebase(&self.surface, &self.cursor) {
            warn!("Failed to capture history baseline: {e}");
        }
        self.history.finish_restoring();
    }

    fn reset_caret(&mut self) {
        match self.surface.blocks().first() {
            Some(&first) => {
                move_to_start(&self.surface, &mut self.cursor, first);
            }
            None => self.cursor.collapse(Position::new(self.surface.root(), 0)),
        }
    }

    fn reset_history(&mut self) {
        self.coordinator.cancel();
        self.history.clear();
        if let Err(e) = self.recorder.rebase(&self.surface, &self.cursor) {
            warn!("Failed to capture history baseline: {e}");
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("options", &self.options)
            .field("attached", &self.attached)
            .field("blocks", &self.surface.blocks().len())
            .field("history", &self.history)
            .field("actions", &self.actions)
            .finish()
    }
}

fn normalize_surface(
    surface: &mut Surface,
    cursor: &mut CursorHandle,
) -> Result<(), crate::error::TreeError> {
    normalize_root(surface, cursor)?;
    assign_block_ids(surface)?;
    for block in surface.blocks() {
        ensure_sentinel(surface, block)?;
    }
    Ok(())
}

fn log_recorded(result: Result<Option<EntryId>, HistoryError>) {
    match result {
        Ok(Some(id)) => debug!("Recorded history entry {id}"),
        Ok(None) => {}
        Err(e) => warn!("Failed to record history: {e}"),
    }
}
