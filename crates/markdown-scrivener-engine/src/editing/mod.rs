//! # Live Editing
//!
//! Everything between a key press on the host surface and a formatted
//! document.
//!
//! ## Flow
//!
//! 1. The host (or [`host_input`]) mutates the observed [`Surface`](crate::tree::Surface)
//! 2. The [`coordinator`] collects the mutation records into a pending batch
//! 3. On the next tick the batch is reclassified and re-parsed, with
//!    observation paused
//! 4. The [`sentinel`] model puts the caret back by visible offset
//!
//! ## Modules
//!
//! - **`coordinator`**: the reformatting state machine
//! - **`sentinel`**: zero-width caret anchors and offset mapping
//! - **`selection`**: the explicit cursor handle
//! - **`render`**: classifier and parser output to tree nodes
//! - **`host_input`**: native typing, deletion, splitting and arrows
//! - **`debounce`**: deadline-based single-slot debouncer

pub mod coordinator;
pub mod debounce;
pub mod host_input;
pub mod render;
pub mod selection;
pub mod sentinel;

pub use coordinator::{BatchOutcome, Coordinator, CoordinatorOptions, Phase};
pub use debounce::Debounced;
pub use selection::{CursorHandle, Position, Selection, SelectionState};
pub use sentinel::SENTINEL;
