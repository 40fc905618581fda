use std::{fmt, time::SystemTime};

use log::debug;

use super::types::{HistoryEntryData, HistoryEntryType, HistoryState};

/// Handle to an entry in a [`HistoryManager`]. Stale once evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId {
    index: u32,
    generation: u32,
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: EntryId,
    pub entry_type: HistoryEntryType,
    pub before: HistoryState,
    pub after: HistoryState,
    pub previous: Option<EntryId>,
    pub next: Option<EntryId>,
    pub timestamp: SystemTime,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryMetrics {
    pub stack_size: usize,
    pub current: Option<EntryId>,
    pub head: Option<EntryId>,
    pub tail: Option<EntryId>,
    pub can_undo: bool,
    pub can_redo: bool,
}

pub type MetricsObserver = Box<dyn FnMut(&HistoryMetrics)>;

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<HistoryEntry>,
}

/// Undo history as a doubly linked chain of entries stored in an arena.
///
/// `current` is the last applied entry; `None` means everything has been
/// undone (or nothing was pushed). Evicted slots go on a free list and
/// their generation is bumped, so old [`EntryId`]s stop resolving.
pub struct HistoryManager {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
    head: Option<EntryId>,
    tail: Option<EntryId>,
    current: Option<EntryId>,
    /// 0 means unlimited.
    max_size: usize,
    restoring: bool,
    on_metrics_change: Option<MetricsObserver>,
}

impl HistoryManager {
    pub const DEFAULT_MAX_SIZE: usize = 100;

    pub fn new(max_size: usize) -> Self {
        Self {
            slots: vec![],
            free: vec![],
            len: 0,
            head: None,
            tail: None,
            current: None,
            max_size,
            restoring: false,
            on_metrics_change: None,
        }
    }

    /// Records a new entry after the current one.
    ///
    /// Any redo tail is discarded first, and the oldest entries are evicted
    /// once the chain is longer than `max_size`.
    pub fn push(&mut self, data: HistoryEntryData) -> EntryId {
        let truncate_from = match self.current {
            Some(current) => self.get(current).and_then(|e| e.next),
            None => self.head,
        };
        let dropped = self.release_from(truncate_from);
        if dropped > 0 {
            debug!("Discarded {dropped} redo entries");
        }

        let previous = self.current;
        let id = self.alloc(|id| HistoryEntry {
            id,
            entry_type: data.entry_type,
            before: data.before,
            after: data.after,
            previous,
            next: None,
            timestamp: SystemTime::now(),
        });
        match previous.and_then(|p| self.get_mut(p)) {
            Some(prev) => prev.next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.current = Some(id);
        debug!("Pushed {:?} history entry {id}", data.entry_type);

        self.evict_overflow();
        self.notify();
        id
    }

    /// Steps back, returning the state to restore.
    pub fn undo(&mut self) -> Option<HistoryState> {
        let entry = self.get(self.current?)?;
        let (state, previous) = (entry.before.clone(), entry.previous);
        self.current = previous;
        self.restoring = true;
        self.notify();
        Some(state)
    }

    /// Steps forward, returning the state to restore.
    pub fn redo(&mut self) -> Option<HistoryState> {
        let target = match self.current {
            None => self.head?,
            Some(current) => self.get(current)?.next?,
        };
        let state = self.get(target)?.after.clone();
        self.current = Some(target);
        self.restoring = true;
        self.notify();
        Some(state)
    }

    pub fn can_undo(&self) -> bool {
        self.current.is_some()
    }

    pub fn can_redo(&self) -> bool {
        match self.current {
            None => self.head.is_some(),
            Some(current) => self.get(current).is_some_and(|e| e.next.is_some()),
        }
    }

    /// True between an undo/redo and the caller finishing its restore.
    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    pub fn finish_restoring(&mut self) {
        self.restoring = false;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        if self.evict_overflow() > 0 {
            self.notify();
        }
    }

    pub fn get(&self, id: EntryId) -> Option<&HistoryEntry> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)?
            .entry
            .as_ref()
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.get(self.current?)
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> + '_ {
        std::iter::successors(self.head.and_then(|h| self.get(h)), |e| {
            e.next.and_then(|n| self.get(n))
        })
    }

    pub fn metrics(&self) -> HistoryMetrics {
        HistoryMetrics {
            stack_size: self.len,
            current: self.current,
            head: self.head,
            tail: self.tail,
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }

    pub fn set_on_metrics_change(&mut self, observer: Option<MetricsObserver>) {
        self.on_metrics_change = observer;
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.len = 0;
        self.head = None;
        self.tail = None;
        self.current = None;
        self.restoring = false;
        self.notify();
    }

    fn notify(&mut self) {
        let metrics = self.metrics();
        if let Some(observer) = self.on_metrics_change.as_mut() {
            observer(&metrics);
        }
    }

    fn evict_overflow(&mut self) -> usize {
        let mut evicted = 0;
        while self.max_size > 0 && self.len > self.max_size {
            let Some(head) = self.head else {
                break;
            };
            let next = self.get(head).and_then(|e| e.next);
            if let Some(entry) = next.and_then(|n| self.get_mut(n)) {
                entry.previous = None;
            }
            self.head = next;
            if self.current == Some(head) {
                self.current = None;
            }
            self.release(head);
            evicted += 1;
        }
        if evicted > 0 {
            debug!("Evicted {evicted} oldest history entries");
        }
        evicted
    }

    /// Releases `start` and everything after it, relinking the new tail.
    fn release_from(&mut self, start: Option<EntryId>) -> usize {
        let Some(start) = start else {
            return 0;
        };
        let previous = self.get(start).and_then(|e| e.previous);
        let mut released = 0;
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            cursor = self.get(id).and_then(|e| e.next);
            self.release(id);
            released += 1;
        }
        match previous.and_then(|p| self.get_mut(p)) {
            Some(entry) => entry.next = None,
            None => self.head = None,
        }
        self.tail = previous;
        released
    }

    fn alloc(&mut self, make: impl FnOnce(EntryId) -> HistoryEntry) -> EntryId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        let id = EntryId {
            index,
            generation: slot.generation,
        };
        slot.entry = Some(make(id));
        self.len += 1;
        id
    }

    fn release(&mut self, id: EntryId) {
        if let Some(slot) = self.slots.get_mut(id.index as usize)
            && slot.generation == id.generation
            && slot.entry.take().is_some()
        {
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
            self.len -= 1;
        }
    }

    fn get_mut(&mut self, id: EntryId) -> Option<&mut HistoryEntry> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)?
            .entry
            .as_mut()
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_SIZE)
    }
}

impl fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryManager")
            .field("metrics", &self.metrics())
            .field("max_size", &self.max_size)
            .field("restoring", &self.restoring)
            .finish_non_exhaustive()
    }
}
