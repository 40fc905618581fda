//! # Reformatting Coordinator
//!
//! Turns raw host edits into formatted blocks.
//!
//! ## Edit cycle
//!
//! ```text
//! Idle ──begin_edit──▶ Mutating ──end_edit──▶ Idle (batch pending)
//!   ▲                                            │ tick: due()
//!   └── Restoring ◀── Reparsing ◀── process() ◀──┘
//! ```
//!
//! `end_edit` drains the surface's mutation records. Stray root children are
//! wrapped into paragraphs right away; everything else lands in the pending
//! set and waits for `reformat_delay`. `process` then reclassifies and
//! re-parses each pending block with observation paused, and puts the caret
//! back through the sentinel model.

use std::{
    collections::HashSet,
    sync::OnceLock,
    time::{Duration, Instant},
};

use indexmap::IndexSet;
use log::{debug, trace, warn};
use regex::Regex;

use crate::{
    error::TreeError,
    parsing::{Block, ClassifyOptions, ParseCache, classify_with},
    tree::{BlockId, BlockKind, InlineKind, Mutation, NodeId, Surface},
};

use super::{
    debounce::Debounced,
    render::{inline_fragments, render_block},
    selection::CursorHandle,
    sentinel::{
        ensure_sentinel, move_to_start, place_cursor, strip_sentinels, visible_len,
        visible_offset, visible_text,
    },
};

/// Extra passes run while a touched block still parses to formatting.
pub const MAX_FOLLOWUP_PASSES: usize = 6;

/// Chars that can start or end an inline span.
const TRIGGER_CHARS: [char; 4] = ['*', '_', '`', '~'];

fn block_trigger_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:#+\s|[-*+]\s|\d+[.)]\s)").expect("Invalid block trigger regex")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorOptions {
    /// Quiet period between the last edit and processing the batch.
    pub reformat_delay: Duration,
    /// Edits closer together than this count as fast typing and are gated.
    pub typing_gate: Duration,
    pub parse_cache_size: usize,
    /// Keep `"# "` as an empty heading rather than literal text.
    pub preserve_structure: bool,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            reformat_delay: Duration::ZERO,
            typing_gate: Duration::from_millis(100),
            parse_cache_size: ParseCache::DEFAULT_CAPACITY,
            preserve_structure: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Mutating,
    Reparsing,
    Restoring,
}

/// What one call to [`Coordinator::process`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Blocks touched, in first-seen order, as they exist after the batch.
    pub blocks: Vec<NodeId>,
    /// Blocks rebuilt because their type changed.
    pub restructured: usize,
    /// Blocks whose text runs were rewritten into spans.
    pub reformatted: usize,
    pub passes: usize,
}

impl BatchOutcome {
    pub fn changed(&self) -> bool {
        self.restructured + self.reformatted > 0
    }
}

/// Where the caret was, in terms that survive a rewrite.
#[derive(Debug, Clone, Copy)]
struct Anchor {
    block: NodeId,
    /// Index among root blocks, for the fallback when the block is gone.
    index: usize,
    visible: usize,
}

#[derive(Debug)]
pub struct Coordinator {
    options: CoordinatorOptions,
    phase: Phase,
    pending: IndexSet<NodeId>,
    timer: Debounced<()>,
    cache: ParseCache,
    last_input: Option<Instant>,
}

impl Coordinator {
    pub fn new(options: CoordinatorOptions) -> Self {
        Self {
            options,
            phase: Phase::Idle,
            pending: IndexSet::new(),
            timer: Debounced::new(options.reformat_delay),
            cache: ParseCache::new(options.parse_cache_size),
            last_input: None,
        }
    }

    pub fn options(&self) -> &CoordinatorOptions {
        &self.options
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn cache(&self) -> &ParseCache {
        &self.cache
    }

    /// When the pending batch becomes due, if a timer is running.
    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// The host is about to mutate the surface.
    pub fn begin_edit(&mut self) {
        if self.phase == Phase::Idle {
            self.phase = Phase::Mutating;
        }
    }

    /// The host finished mutating: drain and accept its records.
    pub fn end_edit(
        &mut self,
        surface: &mut Surface,
        cursor: &mut CursorHandle,
        now: Instant,
    ) -> Result<(), TreeError> {
        let records = surface.take_records();
        if self.phase == Phase::Mutating {
            self.phase = Phase::Idle;
        }
        self.accept(surface, cursor, records, now)
    }

    /// Feeds a batch of mutation records.
    ///
    /// Outside `Idle` the targets are only coalesced into the pending set.
    /// In `Idle`, stray root children are wrapped into paragraphs and block
    /// ids are assigned immediately; text edits made while typing fast are
    /// dropped unless they look like markdown.
    pub fn accept(
        &mut self,
        surface: &mut Surface,
        cursor: &mut CursorHandle,
        records: Vec<Mutation>,
        now: Instant,
    ) -> Result<(), TreeError> {
        if records.is_empty() {
            return Ok(());
        }
        if self.phase != Phase::Idle {
            trace!("Coalescing {} records while {:?}", records.len(), self.phase);
            self.pending.extend(records.iter().map(Mutation::target));
            return Ok(());
        }

        let root = surface.root();
        if records.iter().any(|r| r.target() == root) {
            let mut surface = surface.paused();
            let wrapped = normalize_root(&mut surface, cursor)?;
            self.pending.extend(wrapped);
            assign_block_ids(&mut surface)?;
        }

        let gated = self
            .last_input
            .is_some_and(|last| now.saturating_duration_since(last) < self.options.typing_gate);
        self.last_input = Some(now);

        for record in &records {
            match record {
                Mutation::Children { target, added, .. } if *target == root => {
                    self.pending
                        .extend(added.iter().copied().filter(|&n| surface.is_block(n)));
                }
                Mutation::Children { target, .. } => {
                    self.pending.insert(*target);
                }
                Mutation::Text { target } => {
                    if !gated || passes_gate(surface, *target) {
                        self.pending.insert(*target);
                    } else {
                        trace!("Gated out plain typing in {target}");
                    }
                }
            }
        }

        if !self.pending.is_empty() {
            self.timer.schedule((), now);
        }
        Ok(())
    }

    /// True when a pending batch should be processed now.
    pub fn due(&mut self, now: Instant) -> bool {
        if self.pending.is_empty() {
            self.timer.cancel();
            return false;
        }
        !self.timer.is_pending() || self.timer.take_due(now).is_some()
    }

    /// Drops the pending batch and any running timer.
    pub fn cancel(&mut self) {
        self.pending.clear();
        self.timer.cancel();
        self.phase = Phase::Idle;
    }

    /// Reformats every pending block and restores the caret.
    ///
    /// Observation is paused for the whole call. A call made while a batch
    /// is already being processed does nothing.
    pub fn process(
        &mut self,
        surface: &mut Surface,
        cursor: &mut CursorHandle,
    ) -> Result<BatchOutcome, TreeError> {
        if matches!(self.phase, Phase::Reparsing | Phase::Restoring) {
            return Ok(BatchOutcome::default());
        }
        self.timer.cancel();
        let targets: Vec<NodeId> = self.pending.drain(..).collect();

        let mut surface = surface.paused();
        let result = self.run(&mut surface, cursor, targets);
        self.phase = Phase::Idle;
        result
    }

    fn run(
        &mut self,
        surface: &mut Surface,
        cursor: &mut CursorHandle,
        targets: Vec<NodeId>,
    ) -> Result<BatchOutcome, TreeError> {
        let mut work: IndexSet<NodeId> = targets
            .into_iter()
            .filter_map(|t| surface.closest_block(t))
            .filter(|&b| surface.is_attached(b))
            .collect();
        let mut outcome = BatchOutcome::default();
        let mut seen: IndexSet<NodeId> = IndexSet::new();

        while !work.is_empty() && outcome.passes <= MAX_FOLLOWUP_PASSES {
            if outcome.passes > 0 {
                debug!("Follow-up pass {} over {} blocks", outcome.passes, work.len());
            }
            outcome.passes += 1;
            self.phase = Phase::Reparsing;

            let mut anchor = capture_anchor(surface, cursor, &work);
            let mut touched: IndexSet<NodeId> = IndexSet::new();
            for &block in &work {
                if !surface.is_attached(block) {
                    continue;
                }
                touched.extend(self.reformat_block(surface, block, &mut anchor, &mut outcome)?);
            }
            for &block in &touched {
                ensure_sentinel(surface, block)?;
            }
            assign_block_ids(surface)?;

            self.phase = Phase::Restoring;
            if let Some(anchor) = anchor {
                restore_anchor(surface, cursor, anchor);
            }

            work = touched
                .iter()
                .copied()
                .filter(|&b| self.needs_format(surface, b))
                .collect();
            seen.extend(touched);
        }

        outcome.blocks = seen.into_iter().filter(|&b| surface.is_attached(b)).collect();
        debug!(
            "Processed {} blocks: {} restructured, {} reformatted, {} passes",
            outcome.blocks.len(),
            outcome.restructured,
            outcome.reformatted,
            outcome.passes
        );
        Ok(outcome)
    }

    /// Reformats one block, returning the blocks to normalize afterwards.
    fn reformat_block(
        &mut self,
        surface: &mut Surface,
        block: NodeId,
        anchor: &mut Option<Anchor>,
        outcome: &mut BatchOutcome,
    ) -> Result<Vec<NodeId>, TreeError> {
        let Some(kind) = surface.block_kind(block) else {
            return Ok(vec![]);
        };
        if !kind.holds_text() {
            return Ok(vec![block]);
        }

        if kind == BlockKind::Paragraph {
            let opts = ClassifyOptions {
                preserve_structure: self.options.preserve_structure,
                include_sentinel: false,
            };
            let text = visible_text(surface, block);
            if let Some(classified) = classify_with(&text, opts)
                && classified.block.is_structural()
            {
                trace!("{block} becomes {:?}", classified.block.kind());
                outcome.restructured += 1;
                return self.restructure(
                    surface,
                    block,
                    &classified.block,
                    classified.content_start,
                    anchor,
                );
            }
        }

        if self.reformat_runs(surface, block, anchor)? {
            outcome.reformatted += 1;
        }
        Ok(vec![block])
    }

    fn restructure(
        &mut self,
        surface: &mut Surface,
        block: NodeId,
        classified: &Block,
        content_start: usize,
        anchor: &mut Option<Anchor>,
    ) -> Result<Vec<NodeId>, TreeError> {
        let block_id = surface.block_id(block);
        let node = render_block(surface, classified, block_id)?;
        surface.replace(block, node)?;
        let mut touched = vec![node];

        if let Some(a) = anchor.as_mut().filter(|a| a.block == block) {
            let local = a.visible.saturating_sub(content_start);
            let consumed = self.cache.parse(classified.content()).consumed_before(local);
            a.block = node;
            a.visible = local.saturating_sub(consumed);
        }

        if matches!(classified, Block::HorizontalRule) {
            let next = match surface.next_sibling(node) {
                Some(next) => next,
                None => {
                    let empty = Block::Paragraph {
                        content: String::new(),
                    };
                    let para = render_block(surface, &empty, Some(BlockId::new()))?;
                    surface.insert_after(node, para)?;
                    touched.push(para);
                    para
                }
            };
            if let Some(a) = anchor.as_mut().filter(|a| a.block == node) {
                a.block = next;
                a.visible = 0;
            }
        }

        Ok(touched)
    }

    /// Re-parses each text run of `block` outside code spans, splicing in
    /// formatting nodes where the parse found any.
    fn reformat_runs(
        &mut self,
        surface: &mut Surface,
        block: NodeId,
        anchor: &mut Option<Anchor>,
    ) -> Result<bool, TreeError> {
        let caret = anchor.filter(|a| a.block == block).map(|a| a.visible);
        let mut consumed = 0;
        let mut changed = false;

        for (run, start) in text_runs(surface, block).into_iter().rev() {
            let source = strip_sentinels(surface.text(run).unwrap_or_default());
            let parsed = self.cache.parse(&source);
            if parsed.is_plain() {
                continue;
            }
            let Some(parent) = surface.parent(run) else {
                continue;
            };
            if let Some(visible) = caret
                && visible > start
            {
                let local = (visible - start).min(source.chars().count());
                consumed += parsed.consumed_before(local);
            }
            for fragment in inline_fragments(&parsed.nodes) {
                let child = surface.import(&fragment);
                surface.insert_before(parent, child, Some(run))?;
            }
            surface.remove(run)?;
            changed = true;
        }

        if let Some(a) = anchor.as_mut().filter(|a| a.block == block) {
            a.visible = a.visible.saturating_sub(consumed);
        }
        Ok(changed)
    }

    fn needs_format(&mut self, surface: &Surface, block: NodeId) -> bool {
        if !surface.is_attached(block) {
            return false;
        }
        text_runs(surface, block).into_iter().any(|(run, _)| {
            let source = strip_sentinels(surface.text(run).unwrap_or_default());
            self.cache.has_formatting(&source)
        })
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(CoordinatorOptions::default())
    }
}

/// Text nodes of `block` outside code spans, with the visible offset each
/// one starts at.
fn text_runs(surface: &Surface, block: NodeId) -> Vec<(NodeId, usize)> {
    let mut runs = vec![];
    let mut offset = 0;
    for node in surface.text_nodes(block) {
        let len = surface.text(node).map(visible_len).unwrap_or_default();
        if !inside_code(surface, node, block) {
            runs.push((node, offset));
        }
        offset += len;
    }
    runs
}

fn inside_code(surface: &Surface, node: NodeId, block: NodeId) -> bool {
    let mut current = surface.parent(node);
    while let Some(parent) = current
        && parent != block
    {
        if surface.inline_kind(parent) == Some(InlineKind::Code) {
            return true;
        }
        current = surface.parent(parent);
    }
    false
}

/// True when an edit to `text_node` may have produced markdown.
///
/// Only an optimization: the parser, not this check, decides what formats.
fn passes_gate(surface: &Surface, text_node: NodeId) -> bool {
    let Some(text) = surface.text(text_node) else {
        return true;
    };
    if text.contains(TRIGGER_CHARS) {
        return true;
    }
    surface
        .closest_block(text_node)
        .is_some_and(|b| block_trigger_regex().is_match(&visible_text(surface, b)))
}

fn capture_anchor(
    surface: &Surface,
    cursor: &CursorHandle,
    work: &IndexSet<NodeId>,
) -> Option<Anchor> {
    let caret = cursor.caret()?;
    let block = surface.closest_block(caret.node)?;
    if !work.contains(&block) {
        return None;
    }
    Some(Anchor {
        block,
        index: surface.index_in_parent(block)?,
        visible: visible_offset(surface, block, caret)?,
    })
}

/// Puts the caret back, falling back to the start of the nearest
/// surviving block when the anchor block is gone.
fn restore_anchor(surface: &Surface, cursor: &mut CursorHandle, anchor: Anchor) {
    if surface.is_attached(anchor.block)
        && place_cursor(surface, cursor, anchor.block, anchor.visible)
    {
        return;
    }

    warn!("Cursor anchor {} is gone, using nearest block", anchor.block);
    let blocks = surface.blocks();
    match blocks.get(anchor.index.min(blocks.len().saturating_sub(1))) {
        Some(&block) => {
            move_to_start(surface, cursor, block);
        }
        None => cursor.clear(),
    }
}

/// Wraps runs of non-block root children into new paragraphs.
///
/// Node ids are kept, so a caret inside a wrapped text stays valid; it is
/// re-placed by visible offset once the new paragraph is normalized.
pub fn normalize_root(
    surface: &mut Surface,
    cursor: &mut CursorHandle,
) -> Result<Vec<NodeId>, TreeError> {
    let root = surface.root();
    let mut wrapped = vec![];
    let mut current: Option<NodeId> = None;

    for child in surface.children(root).to_vec() {
        if surface.is_block(child) {
            current = None;
            continue;
        }
        let para = match current {
            Some(para) => para,
            None => {
                let para = surface.create_block(BlockKind::Paragraph, Some(BlockId::new()));
                surface.insert_before(root, para, Some(child))?;
                wrapped.push(para);
                current = Some(para);
                para
            }
        };
        surface.append(para, child)?;
    }

    for &para in &wrapped {
        let caret = cursor
            .caret()
            .and_then(|pos| visible_offset(surface, para, pos));
        ensure_sentinel(surface, para)?;
        if let Some(visible) = caret {
            place_cursor(surface, cursor, para, visible);
        }
    }

    if !wrapped.is_empty() {
        debug!("Wrapped stray root content into {} paragraphs", wrapped.len());
    }
    Ok(wrapped)
}

/// Gives every block without an id, or with an id already used earlier in
/// the document, a fresh one. Returns how many were assigned.
pub fn assign_block_ids(surface: &mut Surface) -> Result<usize, TreeError> {
    let mut seen = HashSet::new();
    let mut assigned = 0;
    for block in surface.blocks() {
        match surface.block_id(block) {
            Some(id) if seen.insert(id) => {}
            _ => {
                let id = BlockId::new();
                surface.set_block_id(block, Some(id))?;
                seen.insert(id);
                assigned += 1;
            }
        }
    }
    Ok(assigned)
}
