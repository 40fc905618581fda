/// What a delimiter produces when matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelimiterKind {
    Code,
    Emphasis,
    Strong,
    /// `***` / `___`: resolves to a strong span wrapping an emphasis span.
    StrongEmphasis,
    Strikethrough,
}

/// The marker character a delimiter is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Backtick,
    Asterisk,
    Underscore,
    Tilde,
}

impl Family {
    pub fn char(self) -> char {
        match self {
            Family::Backtick => '`',
            Family::Asterisk => '*',
            Family::Underscore => '_',
            Family::Tilde => '~',
        }
    }
}

/// An inline delimiter marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Delimiter {
    pub marker: &'static str,
    pub kind: DelimiterKind,
    pub family: Family,
}

const fn d(marker: &'static str, kind: DelimiterKind, family: Family) -> Delimiter {
    Delimiter {
        marker,
        kind,
        family,
    }
}

impl Delimiter {
    pub const CODE: Delimiter = d("`", DelimiterKind::Code, Family::Backtick);
    pub const STAR: Delimiter = d("*", DelimiterKind::Emphasis, Family::Asterisk);
    pub const UNDERSCORE: Delimiter = d("_", DelimiterKind::Emphasis, Family::Underscore);
    pub const DOUBLE_STAR: Delimiter = d("**", DelimiterKind::Strong, Family::Asterisk);
    pub const DOUBLE_UNDERSCORE: Delimiter = d("__", DelimiterKind::Strong, Family::Underscore);
    pub const TRIPLE_STAR: Delimiter = d("***", DelimiterKind::StrongEmphasis, Family::Asterisk);
    pub const TRIPLE_UNDERSCORE: Delimiter =
        d("___", DelimiterKind::StrongEmphasis, Family::Underscore);
    pub const DOUBLE_TILDE: Delimiter = d("~~", DelimiterKind::Strikethrough, Family::Tilde);

    /// Every marker, longest first, so `***` is tried before `**` before `*`.
    pub const BY_LENGTH: [Delimiter; 8] = [
        Self::TRIPLE_STAR,
        Self::TRIPLE_UNDERSCORE,
        Self::DOUBLE_STAR,
        Self::DOUBLE_UNDERSCORE,
        Self::DOUBLE_TILDE,
        Self::CODE,
        Self::STAR,
        Self::UNDERSCORE,
    ];

    /// Runs of this many identical marker chars or more are literal text.
    pub const LITERAL_RUN: usize = 4;

    /// Marker length in chars (markers are ASCII).
    pub fn len(&self) -> usize {
        self.marker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marker.is_empty()
    }

    pub fn from_marker(marker: &str) -> Option<Delimiter> {
        Self::BY_LENGTH.iter().copied().find(|d| d.marker == marker)
    }

    /// True for any char some delimiter is built from.
    pub fn is_marker_char(c: char) -> bool {
        matches!(c, '`' | '*' | '_' | '~')
    }

    /// The single-char delimiter of the same family (`*` for `***`).
    pub fn single(&self) -> Option<Delimiter> {
        match self.family {
            Family::Asterisk => Some(Self::STAR),
            Family::Underscore => Some(Self::UNDERSCORE),
            _ => None,
        }
    }

    /// The double-char delimiter of the same family (`**` for `***`).
    pub fn double(&self) -> Option<Delimiter> {
        match self.family {
            Family::Asterisk => Some(Self::DOUBLE_STAR),
            Family::Underscore => Some(Self::DOUBLE_UNDERSCORE),
            Family::Tilde => Some(Self::DOUBLE_TILDE),
            Family::Backtick => None,
        }
    }

    /// Applies the flanking rules at `pos` in `text`.
    ///
    /// Backticks and tildes are always valid. Asterisks can open before a
    /// non-space and close after a non-space. Underscores additionally may not
    /// open after an alphanumeric or close before one, so `snake_case_words`
    /// stays literal.
    pub fn is_valid_at(&self, text: &[char], pos: usize) -> bool {
        let before = pos.checked_sub(1).and_then(|p| text.get(p).copied());
        let after = text.get(pos + self.len()).copied();

        let prev_is_space = before.is_none_or(char::is_whitespace);
        let next_is_space = after.is_none_or(char::is_whitespace);
        let prev_is_alnum = before.is_some_and(char::is_alphanumeric);
        let next_is_alnum = after.is_some_and(char::is_alphanumeric);

        let (can_open, can_close) = match self.family {
            Family::Backtick | Family::Tilde => return true,
            Family::Asterisk => (!next_is_space, !prev_is_space),
            Family::Underscore => (
                !next_is_space && !prev_is_alnum,
                !prev_is_space && !next_is_alnum,
            ),
        };
        can_open || can_close
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[rstest]
    #[case("*a", 0, true)]
    #[case("a*", 1, true)]
    #[case("a * b", 2, false)]
    #[case("*", 0, false)]
    #[case("x*y", 1, true)]
    fn asterisk_flanking(#[case] text: &str, #[case] pos: usize, #[case] valid: bool) {
        assert_eq!(Delimiter::STAR.is_valid_at(&chars(text), pos), valid);
    }

    #[rstest]
    #[case("_a", 0, true)]
    #[case("a_", 1, true)]
    #[case("snake_case", 5, false)]
    #[case("a _ b", 2, false)]
    #[case("(_a_)", 3, true)]
    fn underscore_flanking(#[case] text: &str, #[case] pos: usize, #[case] valid: bool) {
        assert_eq!(Delimiter::UNDERSCORE.is_valid_at(&chars(text), pos), valid);
    }

    #[test]
    fn code_and_tilde_are_always_valid() {
        let text = chars(" ` ~~ ");
        assert!(Delimiter::CODE.is_valid_at(&text, 1));
        assert!(Delimiter::DOUBLE_TILDE.is_valid_at(&text, 3));
    }

    #[test]
    fn markers_are_ordered_longest_first() {
        let lens: Vec<usize> = Delimiter::BY_LENGTH.iter().map(Delimiter::len).collect();
        let mut sorted = lens.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(lens, sorted);
    }

    #[test]
    fn triple_markers_know_their_parts() {
        assert_eq!(Delimiter::TRIPLE_STAR.double(), Some(Delimiter::DOUBLE_STAR));
        assert_eq!(Delimiter::TRIPLE_UNDERSCORE.single(), Some(Delimiter::UNDERSCORE));
        assert_eq!(Delimiter::from_marker("~~"), Some(Delimiter::DOUBLE_TILDE));
        assert_eq!(Delimiter::from_marker("~"), None);
    }
}
