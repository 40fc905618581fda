//! # Inline Kinds
//!
//! Delimiter definitions live here, not scattered through the tokenizer and
//! matcher. The parser asks these types; it never hardcodes `**` or `` ` ``.

pub mod delimiter;

pub use delimiter::{Delimiter, DelimiterKind, Family};
