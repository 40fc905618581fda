use std::sync::OnceLock;

use regex::Regex;

/// ATX heading block type with owned delimiter constants.
pub struct Heading;

impl Heading {
    /// The heading prefix character.
    pub const PREFIX: char = '#';
    /// Deepest heading level; a longer `#` run is not a heading.
    pub const MAX_LEVEL: u8 = 6;

    /// Matches `# text`, capturing the `#` run and the content.
    pub fn regex() -> &'static Regex {
        static HEADING_REGEX: OnceLock<Regex> = OnceLock::new();
        HEADING_REGEX
            .get_or_init(|| Regex::new(r"^\s*(#{1,6})\s+(.*)$").expect("Invalid heading regex"))
    }

    /// Strips a closing `#` sequence (`## Title ##`) and surrounding space.
    pub fn strip_closing(content: &str) -> &str {
        static CLOSING_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = CLOSING_REGEX
            .get_or_init(|| Regex::new(r"\s+#*$").expect("Invalid closing regex"));
        let trimmed = content.trim();
        match re.find(trimmed) {
            Some(m) => &trimmed[..m.start()],
            None => trimmed,
        }
    }

    /// Prefix written when serializing a heading of `level`.
    pub fn marker(level: u8) -> String {
        let level = level.clamp(1, Self::MAX_LEVEL) as usize;
        format!("{} ", Self::PREFIX.to_string().repeat(level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closing_hashes_are_stripped() {
        assert_eq!(Heading::strip_closing("Title ##"), "Title");
        assert_eq!(Heading::strip_closing("Title  "), "Title");
        assert_eq!(Heading::strip_closing("C#"), "C#");
    }

    #[test]
    fn marker_clamps_level() {
        assert_eq!(Heading::marker(2), "## ");
        assert_eq!(Heading::marker(9), "###### ");
    }

    #[test]
    fn seven_hashes_do_not_match() {
        assert!(Heading::regex().is_match("###### six"));
        assert!(!Heading::regex().is_match("####### seven"));
    }
}
