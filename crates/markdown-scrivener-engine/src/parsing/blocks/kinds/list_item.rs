use std::sync::OnceLock;

use regex::Regex;

/// Bulleted list item: `- `, `* ` or `+ `.
pub struct UnorderedItem;

impl UnorderedItem {
    pub const BULLETS: [char; 3] = ['-', '*', '+'];
    /// The bullet written on serialization.
    pub const MARKER: &'static str = "- ";

    pub fn regex() -> &'static Regex {
        static UNORDERED_REGEX: OnceLock<Regex> = OnceLock::new();
        UNORDERED_REGEX
            .get_or_init(|| Regex::new(r"^\s*[-*+]\s+(.*)$").expect("Invalid bullet regex"))
    }
}

/// Numbered list item: `1. ` or `1) `.
pub struct OrderedItem;

impl OrderedItem {
    pub fn regex() -> &'static Regex {
        static ORDERED_REGEX: OnceLock<Regex> = OnceLock::new();
        ORDERED_REGEX
            .get_or_init(|| Regex::new(r"^\s*(\d+)[.)]\s+(.*)$").expect("Invalid ordinal regex"))
    }

    /// Prefix written when serializing item number `n`.
    pub fn marker(n: u32) -> String {
        format!("{n}. ")
    }
}
