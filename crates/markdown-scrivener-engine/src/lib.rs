//! Live format-as-you-type markdown editing.
//!
//! The host owns a [`tree::Surface`] and reports key presses; the engine
//! recognises markdown as it is typed, rewrites the affected blocks into
//! formatted nodes and keeps the caret where the user expects it.

pub mod actions;
pub mod editing;
pub mod editor;
pub mod error;
pub mod history;
pub mod parsing;
pub mod tree;

// Re-export key types for easier usage
pub use actions::{Action, ActionContext, ActionOutcome, ActionRegistry, Key, KeyInput};
pub use editing::{CursorHandle, Position, SENTINEL, Selection};
pub use editor::{Editor, EngineOptions};
pub use error::{HistoryError, TreeError};
pub use history::{HistoryEntryType, HistoryMetrics};
pub use parsing::{Block, InlineNode, classify, parse_inline, to_markdown};
pub use tree::{BlockId, BlockKind, InlineKind, NodeId, Surface};
