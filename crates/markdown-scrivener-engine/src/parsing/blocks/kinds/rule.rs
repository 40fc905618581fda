/// Horizontal rule (thematic break) block type.
pub struct Rule;

impl Rule {
    pub const CHARS: [char; 3] = ['*', '-', '_'];
    /// Minimum number of rule characters on the line.
    pub const MIN_RUN: usize = 3;
    /// What a rule serializes to.
    pub const MARKDOWN: &'static str = "----";

    /// True for three or more of the same rule char, optionally separated
    /// by whitespace, and nothing else.
    pub fn is_rule(line: &str) -> bool {
        let mut marks = line.chars().filter(|c| !c.is_whitespace());
        let Some(first) = marks.next().filter(|c| Self::CHARS.contains(c)) else {
            return false;
        };
        let mut count = 1;
        for c in marks {
            if c != first {
                return false;
            }
            count += 1;
        }
        count >= Self::MIN_RUN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("***", true)]
    #[case("---", true)]
    #[case("___", true)]
    #[case("- - -", true)]
    #[case("*\t*\t*\t", true)]
    #[case("  -----", true)]
    #[case("*-*", false)]
    #[case("**", false)]
    #[case("--- x", false)]
    #[case("===", false)]
    fn recognises_rules(#[case] line: &str, #[case] expected: bool) {
        assert_eq!(Rule::is_rule(line), expected);
    }
}
