/// A parsed inline node.
///
/// `Code` holds its raw interior; nothing inside a code span is re-parsed.
/// `Emphasis`, `Strong` and `Strikethrough` always carry at least one child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineNode {
    Text(String),
    Code(String),
    Emphasis(Vec<InlineNode>),
    Strong(Vec<InlineNode>),
    Strikethrough(Vec<InlineNode>),
}

impl InlineNode {
    pub fn text(value: impl Into<String>) -> Self {
        InlineNode::Text(value.into())
    }

    /// Returns true for a bare `Text` node.
    pub fn is_text(&self) -> bool {
        matches!(self, InlineNode::Text(_))
    }

    /// Children of a formatting node, empty for leaves.
    pub fn children(&self) -> &[InlineNode] {
        match self {
            InlineNode::Emphasis(c) | InlineNode::Strong(c) | InlineNode::Strikethrough(c) => c,
            InlineNode::Text(_) | InlineNode::Code(_) => &[],
        }
    }

    /// Visible text of this node and its descendants, markers excluded.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.push_plain_text(&mut out);
        out
    }

    fn push_plain_text(&self, out: &mut String) {
        match self {
            InlineNode::Text(v) | InlineNode::Code(v) => out.push_str(v),
            _ => {
                for child in self.children() {
                    child.push_plain_text(out);
                }
            }
        }
    }
}

/// True when an AST carries no formatting at all (a single bare text node).
pub fn is_plain(nodes: &[InlineNode]) -> bool {
    matches!(nodes, [InlineNode::Text(_)])
}

/// The kind of a resolved delimiter match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    Code,
    Emphasis,
    Strong,
    Strikethrough,
}

/// A resolved delimiter match over char offsets of the parsed text.
///
/// `start..end` covers both markers; the interior is
/// `start + marker_len..end - marker_len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub kind: SpanKind,
    pub marker_len: usize,
}

impl Span {
    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    pub fn inner_start(self) -> usize {
        self.start + self.marker_len
    }

    pub fn inner_end(self) -> usize {
        self.end - self.marker_len
    }

    /// Overlapping without one containing the other.
    pub fn crosses(self, other: Span) -> bool {
        let overlap = self.start < other.end && self.end > other.start;
        let nested = (self.start >= other.start && self.end <= other.end)
            || (other.start >= self.start && other.end <= self.end);
        overlap && !nested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: usize, end: usize) -> Span {
        Span {
            start,
            end,
            kind: SpanKind::Emphasis,
            marker_len: 1,
        }
    }

    #[test]
    fn crossing_spans_are_detected() {
        assert!(span(0, 5).crosses(span(3, 8)));
        assert!(!span(0, 8).crosses(span(3, 5)));
        assert!(!span(0, 3).crosses(span(3, 5)));
    }

    #[test]
    fn plain_text_skips_markers() {
        let node = InlineNode::Strong(vec![
            InlineNode::text("bold "),
            InlineNode::Emphasis(vec![InlineNode::text("it")]),
        ]);
        assert_eq!(node.plain_text(), "bold it");
    }

    #[test]
    fn single_text_is_plain() {
        assert!(is_plain(&[InlineNode::text("x")]));
        assert!(!is_plain(&[InlineNode::Code("x".into())]));
        assert!(!is_plain(&[InlineNode::text("a"), InlineNode::text("b")]));
    }
}
