//! Turns the engine's surface into styled terminal lines.

use markdown_scrivener_engine::{
    BlockKind, Editor, InlineKind, NodeId, Surface, parsing::block_lines, tree::NodeKind,
};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const RULE_WIDTH: usize = 40;

/// One frame's worth of document: a line per block and where the caret
/// sits, as (column, row).
pub struct View {
    pub lines: Vec<Line<'static>>,
    pub caret: Option<(u16, u16)>,
}

pub fn render(editor: &Editor) -> View {
    let surface = editor.surface();
    let caret = editor.caret();
    let mut lines = vec![];
    let mut caret_at = None;

    for (row, line) in block_lines(surface).into_iter().enumerate() {
        let (block, kind) = (line.node, line.kind);
        let (prefix, base) = decoration(kind, line.ordinal);
        let mut spans = vec![Span::styled(prefix.clone(), Style::default().fg(Color::DarkGray))];
        if kind == BlockKind::Rule {
            spans.push(Span::styled("─".repeat(RULE_WIDTH), base));
        } else {
            inline_spans(surface, block, base, &mut spans);
        }
        lines.push(Line::from(spans));

        if let Some((id, visible)) = caret
            && surface.block_id(block) == Some(id)
        {
            let col = prefix.chars().count() + visible;
            caret_at = Some((clamp(col), clamp(row)));
        }
    }

    View {
        lines,
        caret: caret_at,
    }
}

fn decoration(kind: BlockKind, ordinal: u32) -> (String, Style) {
    match kind {
        BlockKind::Paragraph => (String::new(), Style::default()),
        BlockKind::Heading { level } => (
            format!("{} ", "#".repeat(level as usize)),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        BlockKind::UnorderedItem => ("• ".to_string(), Style::default()),
        BlockKind::OrderedItem { .. } => (format!("{ordinal}. "), Style::default()),
        BlockKind::Rule => (String::new(), Style::default().fg(Color::DarkGray)),
    }
}

fn inline_spans(surface: &Surface, node: NodeId, style: Style, out: &mut Vec<Span<'static>>) {
    for &child in surface.children(node) {
        match surface.kind(child) {
            Some(NodeKind::Text(text)) => {
                let visible: String = text
                    .chars()
                    .filter(|&c| c != markdown_scrivener_engine::SENTINEL)
                    .collect();
                if !visible.is_empty() {
                    out.push(Span::styled(visible, style));
                }
            }
            Some(NodeKind::Inline(kind)) => {
                inline_spans(surface, child, inline_style(*kind, style), out);
            }
            _ => {}
        }
    }
}

fn inline_style(kind: InlineKind, style: Style) -> Style {
    match kind {
        InlineKind::Strong => style.add_modifier(Modifier::BOLD),
        InlineKind::Emphasis => style.add_modifier(Modifier::ITALIC),
        InlineKind::Strikethrough => style.add_modifier(Modifier::CROSSED_OUT),
        InlineKind::Code => style.fg(Color::Yellow),
    }
}

fn clamp(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use markdown_scrivener_engine::EngineOptions;

    fn plain(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn blocks_get_prefixes() {
        let mut editor = Editor::new(EngineOptions::default());
        editor.set_content("# Title\n\n- a\n\n3. x\n4. y\n\n---\n\nbody");
        let view = render(&editor);
        let text: Vec<String> = view.lines.iter().map(plain).collect();
        assert_eq!(text[0], "# Title");
        assert_eq!(text[1], "• a");
        assert_eq!(text[2], "3. x");
        assert_eq!(text[3], "4. y");
        assert_eq!(text[4], "─".repeat(RULE_WIDTH));
        assert_eq!(text[5], "body");
    }

    #[test]
    fn separate_lists_number_from_their_own_start() {
        let mut editor = Editor::new(EngineOptions::default());
        editor.set_content("1. a\n2. b\n\n5. c");
        let text: Vec<String> = render(&editor).lines.iter().map(plain).collect();
        assert_eq!(text, vec!["1. a", "2. b", "5. c"]);
    }

    #[test]
    fn strong_text_is_bold() {
        let mut editor = Editor::new(EngineOptions::default());
        editor.set_content("a **b**");
        let view = render(&editor);
        let bold = view.lines[0]
            .spans
            .iter()
            .find(|s| s.content == "b")
            .expect("span");
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn caret_column_includes_prefix() {
        let mut editor = Editor::new(EngineOptions::default());
        editor.set_content("## Title");
        let view = render(&editor);
        assert_eq!(view.caret, Some((3, 0)));
    }
}
