//! # Parsing
//!
//! Line-level block classification, inline delimiter parsing, and the
//! serializer that turns a rendered tree back into markdown.
//!
//! Both parsers are total and side-effect free: they never fail, and
//! malformed markup degrades to literal text.

pub mod blocks;
pub mod inline;
pub mod serialize;

pub use blocks::{Block, Classification, ClassifyOptions, classify, classify_with};
pub use inline::{InlineNode, ParseCache, ParsedInline, parse_detailed, parse_inline};
pub use serialize::{BlockLine, block_lines, inline_to_markdown, read_inline, to_markdown};
