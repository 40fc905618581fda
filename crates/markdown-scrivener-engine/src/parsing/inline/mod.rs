//! # Inline Parsing
//!
//! Delimiter-stack inline parsing over a single line of block content.
//!
//! ## Architecture
//!
//! Parsing runs in three phases, each in its own module:
//!
//! 1. **`tokenize`**: longest-marker-first scan into text and delimiter
//!    tokens, applying the flanking rules from `kinds`
//! 2. **`matcher`**: pairs delimiters with a stack of unmatched openers and
//!    emits `Span`s
//! 3. **`tree`**: drops crossing spans and builds the `InlineNode` AST
//!
//! The parser is total: any input yields a non-empty node list, with
//! unmatched markers degrading to literal text.
//!
//! ## Raw Zone Precedence
//!
//! Code spans take precedence: `` `*not emphasis*` `` parses as a single
//! `Code` node, and nothing inside it is re-parsed.

pub mod cache;
pub mod cursor;
pub mod kinds;
pub mod matcher;
pub mod tokenize;
pub mod tree;
pub mod types;

pub use cache::ParseCache;
pub use types::{InlineNode, Span, SpanKind, is_plain};

/// An AST together with the spans that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInline {
    pub nodes: Vec<InlineNode>,
    /// Spans that became nodes, in no particular order.
    pub spans: Vec<Span>,
}

impl ParsedInline {
    /// Number of marker chars the rendered tree drops before char `offset`
    /// of the source text.
    ///
    /// Subtracting this from a caret offset in the source gives the caret's
    /// visible offset once the markers are consumed.
    pub fn consumed_before(&self, offset: usize) -> usize {
        self.spans
            .iter()
            .map(|s| {
                let open = offset.saturating_sub(s.start).min(s.marker_len);
                let close = offset.saturating_sub(s.inner_end()).min(s.marker_len);
                open + close
            })
            .sum()
    }

    pub fn is_plain(&self) -> bool {
        is_plain(&self.nodes)
    }
}

/// Parses one line of inline markdown into an AST.
pub fn parse_inline(text: &str) -> Vec<InlineNode> {
    parse_detailed(text).nodes
}

/// Like [`parse_inline`], also reporting which spans were used.
pub fn parse_detailed(text: &str) -> ParsedInline {
    if text.trim().is_empty() {
        return ParsedInline {
            nodes: vec![InlineNode::text(text)],
            spans: vec![],
        };
    }

    let chars: Vec<char> = text.chars().collect();
    let tokens = tokenize::tokenize(&chars);
    let spans = tree::resolve_conflicts(matcher::match_delimiters(&tokens, &chars));

    let mut used = vec![];
    let mut nodes = tree::build_nodes(&chars, &spans, 0, chars.len(), &mut used);
    if nodes.is_empty() {
        nodes.push(InlineNode::text(text));
    }

    ParsedInline { nodes, spans: used }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use InlineNode::{Code, Emphasis, Strikethrough, Strong};

    fn t(s: &str) -> InlineNode {
        InlineNode::text(s)
    }

    #[test]
    fn emphasis_after_text() {
        assert_eq!(
            parse_inline("Hello, *world!*"),
            vec![t("Hello, "), Emphasis(vec![t("world!")])]
        );
    }

    #[test]
    fn strong_with_nested_emphasis_and_trailing_text() {
        assert_eq!(
            parse_inline("**bold *italic* **in it"),
            vec![
                Strong(vec![t("bold "), Emphasis(vec![t("italic")]), t(" ")]),
                t("in it"),
            ]
        );
    }

    #[test]
    fn four_asterisks_are_literal() {
        assert_eq!(parse_inline("****bold****"), vec![t("****bold****")]);
    }

    #[test]
    fn triple_asterisks_nest_strong_and_emphasis() {
        assert_eq!(
            parse_inline("***both***"),
            vec![Strong(vec![Emphasis(vec![t("both")])])]
        );
    }

    #[test]
    fn code_is_raw() {
        assert_eq!(
            parse_inline("run `a *b* c` now"),
            vec![t("run "), Code("a *b* c".into()), t(" now")]
        );
    }

    #[test]
    fn strikethrough_and_underscore() {
        assert_eq!(
            parse_inline("~~gone~~ and _it_"),
            vec![
                Strikethrough(vec![t("gone")]),
                t(" and "),
                Emphasis(vec![t("it")])
            ]
        );
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("*")]
    #[case("**")]
    #[case("***")]
    #[case("`")]
    #[case("_ _")]
    #[case("snake_case_words")]
    #[case("**unclosed")]
    #[case("a ** b ** c")]
    fn degenerate_input_is_literal(#[case] input: &str) {
        assert_eq!(parse_inline(input), vec![t(input)]);
    }

    #[rstest]
    #[case("*a **b* c**")]
    #[case("`x``y`")]
    #[case("~~*~~*")]
    #[case("__a_b__c_")]
    #[case("***a**b*")]
    #[case("é*ü*ß")]
    fn parse_is_total_and_lossless(#[case] input: &str) {
        let parsed = parse_detailed(input);
        assert!(!parsed.nodes.is_empty());
        let visible: String = parsed.nodes.iter().map(InlineNode::plain_text).collect();
        let markers: usize = parsed.spans.iter().map(|s| s.marker_len * 2).sum();
        assert_eq!(visible.chars().count() + markers, input.chars().count());
    }

    #[test]
    fn consumed_markers_before_offset() {
        let parsed = parse_detailed("a **bc** d");
        assert_eq!(parsed.consumed_before(2), 0);
        assert_eq!(parsed.consumed_before(3), 1);
        assert_eq!(parsed.consumed_before(5), 2);
        assert_eq!(parsed.consumed_before(8), 4);
        assert_eq!(parsed.consumed_before(10), 4);
    }

    #[test]
    fn plain_text_parses_as_plain() {
        assert!(parse_detailed("just words").is_plain());
        assert!(!parse_detailed("`code`").is_plain());
    }
}
