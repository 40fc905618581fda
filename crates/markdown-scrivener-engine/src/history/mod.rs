//! # Undo History
//!
//! Block-level undo/redo.
//!
//! Each entry holds only the blocks an edit changed, as serialized
//! fragments keyed by [`BlockId`](crate::tree::BlockId), plus the selection
//! on either side. Entries live in an arena and link to each other by
//! [`EntryId`], so truncating the redo tail and evicting the oldest entry
//! are both pointer updates.
//!
//! ## Modules
//!
//! - **`manager`**: the entry chain, undo/redo navigation and metrics
//! - **`capture`**: snapshots of the surface and diffs between them
//! - **`restore`**: applying a snapshot side back onto the surface
//! - **`recorder`**: debounced typing commits and flush points
//! - **`types`**: snapshot and entry data

pub mod capture;
pub mod manager;
pub mod recorder;
pub mod restore;
pub mod types;

pub use capture::{capture_selection, capture_state, diff_states};
pub use manager::{EntryId, HistoryEntry, HistoryManager, HistoryMetrics, MetricsObserver};
pub use recorder::HistoryRecorder;
pub use restore::{restore_selection, restore_state};
pub use types::{BlockSnapshot, HistoryEntryData, HistoryEntryType, HistoryState};
