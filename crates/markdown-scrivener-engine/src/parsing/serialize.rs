//! Tree to markdown.
//!
//! One line per block. Consecutive list items of the same kind form one
//! list and are separated by a single newline unless the later item is
//! marked as starting a new list; every other pair of blocks gets a blank
//! line between them.

use crate::{
    editing::sentinel::strip_sentinels,
    tree::{BlockKind, InlineKind, NodeId, NodeKind, Surface},
};

use super::{
    blocks::kinds::{Heading, OrderedItem, Rule, UnorderedItem},
    inline::{InlineNode, kinds::Delimiter, parse_inline},
};

/// Emphasis and strong nodes past this count skip the marker search.
const MAX_MARKER_SEARCH: usize = 10;

/// A block with its place in the document's list structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLine {
    pub node: NodeId,
    pub kind: BlockKind,
    /// Number an ordered item is written with; 0 for other blocks.
    pub ordinal: u32,
    /// True when this item belongs to the same list as the block before it.
    pub continues_list: bool,
}

/// Lays out the document's blocks.
///
/// Ordered items are numbered from the start value of the first item in
/// their list.
pub fn block_lines(surface: &Surface) -> Vec<BlockLine> {
    let mut lines: Vec<BlockLine> = vec![];
    for node in surface.blocks() {
        let Some(kind) = surface.block_kind(node) else {
            continue;
        };
        let previous = lines.last();
        let continues_list =
            previous.is_some_and(|p| same_list(p.kind, kind)) && !surface.list_break(node);
        let ordinal = match (kind, previous) {
            (BlockKind::OrderedItem { .. }, Some(p)) if continues_list => {
                p.ordinal.saturating_add(1)
            }
            (BlockKind::OrderedItem { start }, _) => start,
            _ => 0,
        };
        lines.push(BlockLine {
            node,
            kind,
            ordinal,
            continues_list,
        });
    }
    lines
}

/// Serializes the whole document.
pub fn to_markdown(surface: &Surface) -> String {
    let mut out = String::new();

    for (i, line) in block_lines(surface).into_iter().enumerate() {
        if i > 0 {
            out.push_str(if line.continues_list { "\n" } else { "\n\n" });
        }

        let content = inline_to_markdown(&read_inline(surface, line.node));
        match line.kind {
            BlockKind::Paragraph => out.push_str(&content),
            BlockKind::Heading { level } => {
                out.push_str(&Heading::marker(level));
                out.push_str(&content);
            }
            BlockKind::UnorderedItem => {
                out.push_str(UnorderedItem::MARKER);
                out.push_str(&content);
            }
            BlockKind::OrderedItem { .. } => {
                out.push_str(&OrderedItem::marker(line.ordinal));
                out.push_str(&content);
            }
            BlockKind::Rule => out.push_str(Rule::MARKDOWN),
        }
    }

    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn same_list(a: BlockKind, b: BlockKind) -> bool {
    matches!(
        (a, b),
        (BlockKind::UnorderedItem, BlockKind::UnorderedItem)
            | (BlockKind::OrderedItem { .. }, BlockKind::OrderedItem { .. })
    )
}

/// Reads the inline content under `container` back into an AST.
///
/// Sentinels and line breaks are dropped and non-breaking spaces become
/// plain spaces; adjacent text is merged.
pub fn read_inline(surface: &Surface, container: NodeId) -> Vec<InlineNode> {
    let mut out: Vec<InlineNode> = vec![];
    for &child in surface.children(container) {
        let node = match surface.kind(child) {
            Some(NodeKind::Text(value)) => {
                let value: String = strip_sentinels(value)
                    .chars()
                    .filter(|&c| c != '\n')
                    .map(|c| if c == '\u{a0}' { ' ' } else { c })
                    .collect();
                if value.is_empty() {
                    continue;
                }
                InlineNode::Text(value)
            }
            Some(NodeKind::Inline(InlineKind::Code)) => {
                InlineNode::Code(strip_sentinels(&surface.text_content(child)))
            }
            Some(NodeKind::Inline(kind)) => {
                let children = read_inline(surface, child);
                if children.is_empty() {
                    continue;
                }
                match kind {
                    InlineKind::Strong => InlineNode::Strong(children),
                    InlineKind::Strikethrough => InlineNode::Strikethrough(children),
                    _ => InlineNode::Emphasis(children),
                }
            }
            _ => continue,
        };
        if let (Some(InlineNode::Text(prev)), InlineNode::Text(next)) = (out.last_mut(), &node) {
            prev.push_str(next);
            continue;
        }
        out.push(node);
    }
    out
}

/// Serializes an inline AST so that it parses back to the same nodes.
///
/// Emphasis prefers `_` and strong `**`. When the preferred markers would
/// run into neighbouring marker chars and parse differently, every mix of
/// `*` / `_` emphasis and `**` / `__` strong is tried in turn. A tree no
/// mix reproduces is written with the preferred markers.
pub fn inline_to_markdown(nodes: &[InlineNode]) -> String {
    let preferred = Writer::new(None).finish(nodes);
    if nodes.iter().all(InlineNode::is_text) || parse_inline(&preferred) == nodes {
        return preferred;
    }

    let points = nodes.iter().map(choice_points).sum::<usize>();
    if points > MAX_MARKER_SEARCH {
        return preferred;
    }
    (0..1u32 << points)
        .map(|mask| {
            let choices: Vec<bool> = (0..points).map(|i| (mask >> i) & 1 == 1).collect();
            Writer::new(Some(&choices)).finish(nodes)
        })
        .find(|candidate| parse_inline(candidate) == nodes)
        .unwrap_or(preferred)
}

/// Emphasis and strong nodes in `node`'s subtree.
fn choice_points(node: &InlineNode) -> usize {
    match node {
        InlineNode::Emphasis(children) | InlineNode::Strong(children) => {
            1 + children.iter().map(choice_points).sum::<usize>()
        }
        InlineNode::Strikethrough(children) => children.iter().map(choice_points).sum(),
        InlineNode::Text(_) | InlineNode::Code(_) => 0,
    }
}

/// Writes nodes with either the preferred markers or, given `choices`, the
/// underscore family wherever the next choice is `true`.
struct Writer<'a> {
    out: String,
    choices: Option<&'a [bool]>,
    next_choice: usize,
}

impl<'a> Writer<'a> {
    fn new(choices: Option<&'a [bool]>) -> Self {
        Self {
            out: String::new(),
            choices,
            next_choice: 0,
        }
    }

    fn finish(mut self, nodes: &[InlineNode]) -> String {
        self.write_nodes(nodes, None);
        self.out
    }

    fn take_choice(&mut self) -> Option<bool> {
        let choice = self.choices?.get(self.next_choice).copied();
        self.next_choice += 1;
        choice
    }

    fn write_nodes(&mut self, nodes: &[InlineNode], next_outside: Option<char>) {
        for (i, node) in nodes.iter().enumerate() {
            let next = nodes[i + 1..]
                .iter()
                .find_map(first_char)
                .or(next_outside);
            self.write_node(node, next);
        }
    }

    fn write_node(&mut self, node: &InlineNode, next: Option<char>) {
        match node {
            InlineNode::Text(value) => self.out.push_str(value),
            InlineNode::Code(value) => {
                self.out.push_str(Delimiter::CODE.marker);
                self.out.push_str(value);
                self.out.push_str(Delimiter::CODE.marker);
            }
            InlineNode::Strong(children) => {
                let marker = match self.take_choice() {
                    Some(true) => Delimiter::DOUBLE_UNDERSCORE.marker,
                    _ => Delimiter::DOUBLE_STAR.marker,
                };
                self.wrap(marker, children);
            }
            InlineNode::Strikethrough(children) => {
                self.wrap(Delimiter::DOUBLE_TILDE.marker, children)
            }
            InlineNode::Emphasis(children) => {
                let marker = match self.take_choice() {
                    Some(true) => Delimiter::UNDERSCORE.marker,
                    Some(false) => Delimiter::STAR.marker,
                    None => self.emphasis_marker(children, next),
                };
                self.wrap(marker, children);
            }
        }
    }

    /// `_` unless it would touch an alphanumeric or another `_`, then `*`
    /// unless that touches another `*`.
    fn emphasis_marker(&self, children: &[InlineNode], next: Option<char>) -> &'static str {
        let edges = [
            self.out.chars().last(),
            next,
            children.first().and_then(first_char),
            children.last().and_then(last_char),
        ];
        let blocks_underscore = edges[..2].iter().flatten().any(|c| c.is_alphanumeric())
            || edges.contains(&Some('_'));
        if !blocks_underscore {
            Delimiter::UNDERSCORE.marker
        } else if !edges.contains(&Some('*')) {
            Delimiter::STAR.marker
        } else {
            Delimiter::UNDERSCORE.marker
        }
    }

    fn wrap(&mut self, marker: &str, children: &[InlineNode]) {
        self.out.push_str(marker);
        self.write_nodes(children, marker.chars().next());
        self.out.push_str(marker);
    }
}

/// First char a node serializes to with the preferred markers.
fn first_char(node: &InlineNode) -> Option<char> {
    match node {
        InlineNode::Text(value) => value.chars().next(),
        InlineNode::Code(_) => Some('`'),
        InlineNode::Strong(_) => Some('*'),
        InlineNode::Emphasis(_) => Some('_'),
        InlineNode::Strikethrough(_) => Some('~'),
    }
}

/// Last char a node serializes to with the preferred markers.
fn last_char(node: &InlineNode) -> Option<char> {
    match node {
        InlineNode::Text(value) => value.chars().last(),
        _ => first_char(node),
    }
}
