use super::types::{InlineNode, Span, SpanKind};

/// Drops every span that crosses an already accepted one.
///
/// Spans are visited by start offset, shorter first on ties, so the first
/// accepted span wins. The result is laminar: any two spans are disjoint or
/// nested.
pub fn resolve_conflicts(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(a.len().cmp(&b.len())));

    let mut accepted: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        if !accepted.iter().any(|a| span.crosses(*a)) {
            accepted.push(span);
        }
    }
    accepted
}

/// Builds nodes for `text[start..end]`, recording every span that ended up
/// in the tree into `used`.
pub fn build_nodes(
    text: &[char],
    spans: &[Span],
    start: usize,
    end: usize,
    used: &mut Vec<Span>,
) -> Vec<InlineNode> {
    let mut local: Vec<Span> = spans
        .iter()
        .filter(|s| s.start >= start && s.end <= end)
        .copied()
        .collect();
    // Outermost first: a nested span is built by the recursion below.
    local.sort_by(|a, b| a.start.cmp(&b.start).then(b.len().cmp(&a.len())));

    let mut nodes = vec![];
    let mut pos = start;

    for span in local {
        if span.start < pos {
            continue;
        }
        if pos < span.start {
            nodes.push(InlineNode::Text(collect(text, pos, span.start)));
        }

        let (inner_start, inner_end) = (span.inner_start(), span.inner_end());
        let node = match span.kind {
            SpanKind::Code => Some(InlineNode::Code(collect(text, inner_start, inner_end))),
            kind => {
                let mut nested = vec![];
                let children = build_nodes(text, spans, inner_start, inner_end, &mut nested);
                (!children.is_empty()).then(|| {
                    used.append(&mut nested);
                    match kind {
                        SpanKind::Strong => InlineNode::Strong(children),
                        SpanKind::Strikethrough => InlineNode::Strikethrough(children),
                        _ => InlineNode::Emphasis(children),
                    }
                })
            }
        };

        match node {
            Some(node) => {
                used.push(span);
                nodes.push(node);
            }
            None => nodes.push(InlineNode::Text(collect(text, span.start, span.end))),
        }
        pos = span.end;
    }

    if pos < end {
        nodes.push(InlineNode::Text(collect(text, pos, end)));
    }

    merge_text(nodes)
}

fn collect(text: &[char], start: usize, end: usize) -> String {
    text[start..end].iter().collect()
}

/// Adjacent text nodes (left over from degraded spans) become one.
fn merge_text(nodes: Vec<InlineNode>) -> Vec<InlineNode> {
    let mut out: Vec<InlineNode> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let (Some(InlineNode::Text(prev)), InlineNode::Text(next)) = (out.last_mut(), &node) {
            prev.push_str(next);
            continue;
        }
        out.push(node);
    }
    out
}
