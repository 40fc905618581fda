use crate::{
    error::TreeError,
    parsing::{Block, ClassifyOptions, InlineNode, classify_with, parse_inline},
    tree::{BlockId, Fragment, InlineKind, NodeId, Surface},
};

use super::sentinel::ensure_sentinel;

/// Fragments for an inline AST.
pub fn inline_fragments(nodes: &[InlineNode]) -> Vec<Fragment> {
    nodes.iter().map(inline_fragment).collect()
}

fn inline_fragment(node: &InlineNode) -> Fragment {
    let (kind, children) = match node {
        InlineNode::Text(value) => return Fragment::text(value.clone()),
        InlineNode::Code(value) => (InlineKind::Code, vec![Fragment::text(value.clone())]),
        InlineNode::Emphasis(c) => (InlineKind::Emphasis, inline_fragments(c)),
        InlineNode::Strong(c) => (InlineKind::Strong, inline_fragments(c)),
        InlineNode::Strikethrough(c) => (InlineKind::Strikethrough, inline_fragments(c)),
    };
    Fragment::Inline { kind, children }
}

/// Fragment for a classified line, its content inline-parsed.
pub fn block_fragment(block: &Block, block_id: Option<BlockId>) -> Fragment {
    let children = match block {
        Block::HorizontalRule => vec![],
        _ => inline_fragments(&parse_inline(block.content())),
    };
    Fragment::Block {
        kind: block.kind(),
        block_id,
        list_break: false,
        children,
    }
}

/// Builds a detached, sentinel-normalized block node.
pub fn render_block(
    surface: &mut Surface,
    block: &Block,
    block_id: Option<BlockId>,
) -> Result<NodeId, TreeError> {
    let node = surface.import(&block_fragment(block, block_id));
    ensure_sentinel(surface, node)?;
    Ok(node)
}

/// Replaces everything under `container` with `nodes`.
pub fn render_inline(
    surface: &mut Surface,
    container: NodeId,
    nodes: &[InlineNode],
) -> Result<(), TreeError> {
    surface.clear_children(container)?;
    for fragment in inline_fragments(nodes) {
        let child = surface.import(&fragment);
        surface.append(container, child)?;
    }
    Ok(())
}

/// Replaces the whole document with one block per non-blank line.
///
/// A list item after a blank line starts a new list.
pub fn render_document(
    surface: &mut Surface,
    markdown: &str,
    opts: ClassifyOptions,
) -> Result<Vec<NodeId>, TreeError> {
    surface.clear()?;
    let root = surface.root();
    let mut blocks = vec![];
    let mut after_blank = false;
    for line in markdown.lines() {
        let Some(classified) = classify_with(line, opts) else {
            after_blank = true;
            continue;
        };
        let node = render_block(surface, &classified.block, Some(BlockId::new()))?;
        if after_blank && classified.block.is_list_item() {
            surface.set_list_break(node, true)?;
        }
        surface.append(root, node)?;
        blocks.push(node);
        after_blank = false;
    }
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parsing::to_markdown, tree::BlockKind};
    use insta::assert_snapshot;

    #[test]
    fn rendered_blocks_carry_sentinels() {
        let mut surface = Surface::new();
        let block = Block::Heading {
            level: 2,
            content: "Hi **there**".into(),
        };
        let node = render_block(&mut surface, &block, None).expect("render");
        assert_eq!(surface.block_kind(node), Some(BlockKind::Heading { level: 2 }));
        assert_eq!(surface.text_content(node), "\u{200B}Hi there\u{200B}");
    }

    #[test]
    fn items_after_a_blank_line_start_a_new_list() {
        let mut surface = Surface::new();
        let blocks = render_document(
            &mut surface,
            "1. a\n2. b\n\n5. c\n",
            ClassifyOptions::default(),
        )
        .expect("render");
        let breaks: Vec<bool> = blocks.iter().map(|&b| surface.list_break(b)).collect();
        assert_eq!(breaks, vec![false, false, true]);
    }

    #[test]
    fn document_renders_one_block_per_line() {
        let mut surface = Surface::new();
        let blocks = render_document(
            &mut surface,
            "# Title\n\nSome *text*\n- one\n- two\n\n3. three\n4. four\n***\n",
            ClassifyOptions::default(),
        )
        .expect("render");
        assert_eq!(blocks.len(), 7);
        assert!(blocks.iter().all(|&b| surface.block_id(b).is_some()));
        assert_snapshot!(to_markdown(&surface).trim_end(), @r"
        # Title

        Some _text_

        - one
        - two

        3. three
        4. four

        ----
        ");
    }
}
