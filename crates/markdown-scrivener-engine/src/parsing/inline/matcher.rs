use super::{
    kinds::{Delimiter, DelimiterKind},
    tokenize::Token,
    types::{Span, SpanKind},
};

/// An unmatched opening delimiter on the stack.
#[derive(Debug, Clone, Copy)]
struct Opener {
    delimiter: Delimiter,
    pos: usize,
}

/// Phase 2: pairs delimiters with a stack of unmatched openers.
///
/// Returns spans sorted by start offset. They may still cross each other;
/// conflict resolution happens when the tree is built.
pub fn match_delimiters(tokens: &[Token], text: &[char]) -> Vec<Span> {
    let mut stack: Vec<Opener> = vec![];
    let mut spans = vec![];

    for token in tokens {
        let Token::Delimiter { delimiter, pos } = *token else {
            continue;
        };

        if delimiter.kind == DelimiterKind::Code {
            match find_opener(&stack, delimiter) {
                Some(idx) => {
                    let opener = stack[idx];
                    let inner_start = opener.pos + delimiter.len();
                    // An empty span cannot live in the tree, so `` stays text.
                    if pos > inner_start {
                        spans.push(Span {
                            start: opener.pos,
                            end: pos + delimiter.len(),
                            kind: SpanKind::Code,
                            marker_len: delimiter.len(),
                        });
                    }
                    // Everything opened inside the code span dies with it.
                    stack.truncate(idx);
                }
                None => stack.push(Opener { delimiter, pos }),
            }
            continue;
        }

        if stack.iter().any(|o| o.delimiter.kind == DelimiterKind::Code) {
            continue;
        }

        if delimiter.kind == DelimiterKind::StrongEmphasis {
            match_triple(&mut stack, &mut spans, text, delimiter, pos);
            continue;
        }

        match find_opener(&stack, delimiter) {
            Some(idx) => {
                let opener = stack[idx];
                if !is_blank(text, opener.pos + delimiter.len(), pos) {
                    spans.push(Span {
                        start: opener.pos,
                        end: pos + delimiter.len(),
                        kind: span_kind(delimiter.kind),
                        marker_len: delimiter.len(),
                    });
                }
                stack.truncate(idx);
            }
            None => stack.push(Opener { delimiter, pos }),
        }
    }

    spans.sort_by_key(|s| s.start);
    spans
}

/// `***` / `___`: pair with another triple, else close an open double and
/// leave the spare single char as a fresh opener, else open.
fn match_triple(
    stack: &mut Vec<Opener>,
    spans: &mut Vec<Span>,
    text: &[char],
    delimiter: Delimiter,
    pos: usize,
) {
    let (Some(single), Some(double)) = (delimiter.single(), delimiter.double()) else {
        return;
    };

    if let Some(idx) = find_opener(stack, delimiter) {
        let opener = stack[idx];
        if !is_blank(text, opener.pos + delimiter.len(), pos) {
            spans.push(Span {
                start: opener.pos,
                end: pos + delimiter.len(),
                kind: SpanKind::Strong,
                marker_len: double.len(),
            });
            spans.push(Span {
                start: opener.pos + double.len(),
                end: pos + single.len(),
                kind: SpanKind::Emphasis,
                marker_len: single.len(),
            });
        }
        stack.truncate(idx);
        return;
    }

    if let Some(idx) = find_opener(stack, double) {
        let opener = stack[idx];
        if !is_blank(text, opener.pos + double.len(), pos) {
            spans.push(Span {
                start: opener.pos,
                end: pos + double.len(),
                kind: SpanKind::Strong,
                marker_len: double.len(),
            });
        }
        stack.truncate(idx);
        stack.push(Opener {
            delimiter: single,
            pos: pos + double.len(),
        });
        return;
    }

    stack.push(Opener { delimiter, pos });
}

/// Nearest opener with the same marker, searching from the top.
fn find_opener(stack: &[Opener], delimiter: Delimiter) -> Option<usize> {
    stack
        .iter()
        .rposition(|o| o.delimiter.kind == delimiter.kind && o.delimiter.marker == delimiter.marker)
}

fn is_blank(text: &[char], start: usize, end: usize) -> bool {
    text.get(start..end)
        .is_none_or(|inner| inner.iter().all(|c| c.is_whitespace()))
}

fn span_kind(kind: DelimiterKind) -> SpanKind {
    match kind {
        DelimiterKind::Code => SpanKind::Code,
        DelimiterKind::Emphasis => SpanKind::Emphasis,
        DelimiterKind::Strong | DelimiterKind::StrongEmphasis => SpanKind::Strong,
        DelimiterKind::Strikethrough => SpanKind::Strikethrough,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::inline::tokenize::tokenize;
    use pretty_assertions::assert_eq;

    fn spans(s: &str) -> Vec<(usize, usize, SpanKind)> {
        let chars: Vec<char> = s.chars().collect();
        match_delimiters(&tokenize(&chars), &chars)
            .into_iter()
            .map(|s| (s.start, s.end, s.kind))
            .collect()
    }

    #[test]
    fn simple_emphasis() {
        assert_eq!(spans("a *b* c"), vec![(2, 5, SpanKind::Emphasis)]);
    }

    #[test]
    fn whitespace_only_content_never_matches() {
        assert_eq!(spans("** **"), vec![]);
        assert_eq!(spans("~~  ~~"), vec![]);
    }

    #[test]
    fn code_suppresses_inner_delimiters() {
        assert_eq!(spans("`a *b* c`"), vec![(0, 9, SpanKind::Code)]);
    }

    #[test]
    fn code_closes_openers_inside_it() {
        assert_eq!(spans("`*a` b*"), vec![(0, 4, SpanKind::Code)]);
    }

    #[test]
    fn empty_code_span_stays_literal() {
        assert_eq!(spans("``"), vec![]);
    }

    #[test]
    fn triple_pairs_into_strong_and_emphasis() {
        assert_eq!(
            spans("***x***"),
            vec![(0, 7, SpanKind::Strong), (2, 5, SpanKind::Emphasis)]
        );
    }

    #[test]
    fn triple_closes_open_double() {
        // The spare `*` is re-pushed as an opener and never closes.
        assert_eq!(spans("**x***"), vec![(0, 5, SpanKind::Strong)]);
        assert_eq!(
            spans("**x*** y*"),
            vec![(0, 5, SpanKind::Strong), (5, 9, SpanKind::Emphasis)]
        );
    }

    #[test]
    fn unmatched_openers_between_are_discarded() {
        // `_` opened inside `*...*` is dropped when the outer pair closes.
        assert_eq!(spans("*a _b* c_"), vec![(0, 6, SpanKind::Emphasis)]);
    }

    #[test]
    fn unmatched_opener_produces_nothing() {
        assert_eq!(spans("**never closed"), vec![]);
    }
}
