use super::{cursor::Cursor, kinds::Delimiter};

/// Phase 1 output: literal text runs and candidate delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Literal text covering `start..end` (char offsets).
    Text { start: usize, end: usize },
    /// A delimiter that passed its flanking rules at `pos`.
    Delimiter { delimiter: Delimiter, pos: usize },
}

/// Scans `text` left to right into tokens.
///
/// At each position the longest valid marker wins. A run of four or more
/// identical marker chars is emitted verbatim as text and never becomes a
/// delimiter.
pub fn tokenize(text: &[char]) -> Vec<Token> {
    let mut cur = Cursor::new(text);
    let mut out = vec![];

    while !cur.eof() {
        let start = cur.pos();

        if let Some(run) = literal_run(&cur) {
            cur.bump_n(run);
            out.push(Token::Text {
                start,
                end: cur.pos(),
            });
            continue;
        }

        if let Some(delimiter) = delimiter_at(&cur) {
            cur.bump_n(delimiter.len());
            out.push(Token::Delimiter {
                delimiter,
                pos: start,
            });
            continue;
        }

        cur.bump();
        while !cur.eof() && literal_run(&cur).is_none() && delimiter_at(&cur).is_none() {
            cur.bump();
        }
        out.push(Token::Text {
            start,
            end: cur.pos(),
        });
    }

    out
}

fn literal_run(cur: &Cursor<'_>) -> Option<usize> {
    let c = cur.peek().filter(|&c| Delimiter::is_marker_char(c))?;
    let run = cur.run_of(c);
    (run >= Delimiter::LITERAL_RUN).then_some(run)
}

fn delimiter_at(cur: &Cursor<'_>) -> Option<Delimiter> {
    Delimiter::BY_LENGTH
        .iter()
        .copied()
        .find(|d| cur.starts_with(d.marker) && d.is_valid_at(cur.s, cur.pos()))
}
