use crate::tree::BlockKind;

/// One line of markdown classified by its structural prefix.
///
/// `content` is inline markdown that has not been inline-parsed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, content: String },
    Paragraph { content: String },
    UnorderedListItem { content: String },
    OrderedListItem { content: String, start: u32 },
    HorizontalRule,
}

impl Block {
    /// The host tree kind this block renders as.
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Heading { level, .. } => BlockKind::Heading { level: *level },
            Block::Paragraph { .. } => BlockKind::Paragraph,
            Block::UnorderedListItem { .. } => BlockKind::UnorderedItem,
            Block::OrderedListItem { start, .. } => BlockKind::OrderedItem { start: *start },
            Block::HorizontalRule => BlockKind::Rule,
        }
    }

    /// Inline content, empty for rules.
    pub fn content(&self) -> &str {
        match self {
            Block::Heading { content, .. }
            | Block::Paragraph { content }
            | Block::UnorderedListItem { content }
            | Block::OrderedListItem { content, .. } => content,
            Block::HorizontalRule => "",
        }
    }

    /// True when the line carried a structural prefix (anything but a
    /// paragraph).
    pub fn is_structural(&self) -> bool {
        !matches!(self, Block::Paragraph { .. })
    }

    pub fn is_list_item(&self) -> bool {
        matches!(
            self,
            Block::UnorderedListItem { .. } | Block::OrderedListItem { .. }
        )
    }
}

/// Knobs for [`classify_with`](super::classify_with). Both default to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// Keep an empty structural match (`"# "`) as its structural type
    /// instead of falling back to a literal paragraph.
    pub preserve_structure: bool,
    /// Give preserved empty content a single sentinel char instead of `""`.
    pub include_sentinel: bool,
}

/// A classified line plus where its content began.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub block: Block,
    /// Char offset in the line of the first content char. Carets before it
    /// sat inside the structural prefix.
    pub content_start: usize,
}
