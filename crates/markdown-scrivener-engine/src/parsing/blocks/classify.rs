use regex::Captures;

use crate::editing::sentinel::SENTINEL;

use super::{
    kinds::{Heading, OrderedItem, Paragraph, Rule, UnorderedItem},
    types::{Block, Classification, ClassifyOptions},
};

/// Classifies a line with default options.
///
/// Returns `None` for blank lines.
pub fn classify(line: &str) -> Option<Block> {
    classify_with(line, ClassifyOptions::default()).map(|c| c.block)
}

/// Classifies a line into a [`Block`], trying heading, rule, bullet and
/// ordinal prefixes in that order. Anything else is a paragraph.
pub fn classify_with(line: &str, opts: ClassifyOptions) -> Option<Classification> {
    if line.trim().is_empty() {
        return None;
    }

    if let Some(caps) = Heading::regex().captures(line) {
        let level = caps[1].chars().count() as u8;
        let (content, start) = group(line, &caps, 2);
        let content = Heading::strip_closing(content);
        return Some(structural(line, content, start, opts, |content| {
            Block::Heading { level, content }
        }));
    }

    if Rule::is_rule(line) {
        return Some(Classification {
            block: Block::HorizontalRule,
            content_start: line.chars().count(),
        });
    }

    if let Some(caps) = UnorderedItem::regex().captures(line) {
        let (content, start) = group(line, &caps, 1);
        return Some(structural(line, content, start, opts, |content| {
            Block::UnorderedListItem { content }
        }));
    }

    if let Some(caps) = OrderedItem::regex().captures(line)
        && let Ok(number) = caps[1].parse::<u32>()
    {
        let (content, start) = group(line, &caps, 2);
        return Some(structural(line, content, start, opts, |content| {
            Block::OrderedListItem {
                content,
                start: number,
            }
        }));
    }

    Some(paragraph(line))
}

fn paragraph(line: &str) -> Classification {
    let (content, content_start) = Paragraph::content(line);
    Classification {
        block: Block::Paragraph {
            content: content.to_string(),
        },
        content_start,
    }
}

/// Text of capture `idx` and its char offset in `line`.
fn group<'a>(line: &'a str, caps: &Captures<'a>, idx: usize) -> (&'a str, usize) {
    match caps.get(idx) {
        Some(m) => (m.as_str(), line[..m.start()].chars().count()),
        None => ("", line.chars().count()),
    }
}

fn structural(
    line: &str,
    content: &str,
    content_start: usize,
    opts: ClassifyOptions,
    make: impl FnOnce(String) -> Block,
) -> Classification {
    if !content.trim().is_empty() {
        return Classification {
            block: make(content.to_string()),
            content_start,
        };
    }
    if !opts.preserve_structure {
        return paragraph(line);
    }
    let content = if opts.include_sentinel {
        SENTINEL.to_string()
    } else {
        String::new()
    };
    Classification {
        block: make(content),
        content_start: line.chars().count(),
    }
}
