//! # Host Tree
//!
//! The live, editable document the engine rewrites in place.
//!
//! ## Shape
//!
//! ```text
//! Root
//! ├── Block(Heading { level: 1 })
//! │   └── Text("\u{200B}Title")
//! └── Block(Paragraph)
//!     ├── Text("\u{200B}plain ")
//!     ├── Inline(Strong)
//!     │   └── Text("bold")
//!     └── Text("\u{200B}")
//! ```
//!
//! Every block is one line of markdown. Root children are always blocks once
//! the coordinator has normalized them.
//!
//! ## Modules
//!
//! - **`node`**: ids and node kinds
//! - **`surface`**: the arena and its primitives
//! - **`mutation`**: mutation records and the observation pause guard
//! - **`fragment`**: serde-friendly detached subtrees

pub mod fragment;
pub mod mutation;
pub mod node;
pub mod surface;

pub use fragment::Fragment;
pub use mutation::{Mutation, PauseGuard};
pub use node::{BlockId, BlockKind, InlineKind, Node, NodeId, NodeKind};
pub use surface::Surface;
