//! # Block Classification
//!
//! Every block is exactly one line. A line is classified on its own, with
//! no surrounding context, by the first structural prefix it carries.
//!
//! ## Modules
//!
//! - **`types`**: `Block`, `Classification`, `ClassifyOptions`
//! - **`kinds`**: Block-specific types with owned prefixes (Heading, Rule,
//!   list items, Paragraph)
//! - **`classify`**: `classify` / `classify_with` entry points
//!
//! ## Key Invariants
//!
//! - Blank lines classify to nothing
//! - A `#` run longer than six is paragraph text
//! - Callers strip sentinel chars first; classification never sees them

pub mod classify;
pub mod kinds;
pub mod types;

pub use classify::{classify, classify_with};
pub use types::{Block, Classification, ClassifyOptions};
