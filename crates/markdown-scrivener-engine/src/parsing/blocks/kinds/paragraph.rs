/// Paragraph block type (marker struct).
///
/// Paragraphs have no delimiters - they are the default block when no other
/// line prefix matches. Their content is the trimmed line.
pub struct Paragraph;

impl Paragraph {
    /// Content of a paragraph line and the char offset it starts at.
    pub fn content(line: &str) -> (&str, usize) {
        let trimmed = line.trim();
        let lead = line.len() - line.trim_start().len();
        (trimmed, line[..lead].chars().count())
    }
}
