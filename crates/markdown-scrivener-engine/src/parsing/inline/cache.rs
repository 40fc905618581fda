use indexmap::IndexMap;

use super::{ParsedInline, parse_detailed};

/// Bounded memo of inline parse results keyed by source text.
///
/// Eviction is first-in first-out once `capacity` entries are held.
#[derive(Debug, Clone)]
pub struct ParseCache {
    entries: IndexMap<String, ParsedInline>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl ParseCache {
    pub const DEFAULT_CAPACITY: usize = 1000;

    pub fn new(capacity: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    /// Returns the cached parse of `text`, parsing on a miss.
    pub fn parse(&mut self, text: &str) -> ParsedInline {
        if let Some(parsed) = self.entries.get(text) {
            self.hits += 1;
            return parsed.clone();
        }

        self.misses += 1;
        let parsed = parse_detailed(text);
        while self.entries.len() >= self.capacity {
            self.entries.shift_remove_index(0);
        }
        self.entries.insert(text.to_string(), parsed.clone());
        parsed
    }

    /// True when `text` would produce at least one formatting node.
    pub fn has_formatting(&mut self, text: &str) -> bool {
        !self.parse(text).is_plain()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

impl Default for ParseCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_parse_hits_cache() {
        let mut cache = ParseCache::new(4);
        let first = cache.parse("**a**");
        let second = cache.parse("**a**");
        assert_eq!(first, second);
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn oldest_entry_is_evicted_first() {
        let mut cache = ParseCache::new(2);
        cache.parse("a");
        cache.parse("b");
        cache.parse("c");
        assert_eq!(cache.len(), 2);
        cache.parse("b");
        cache.parse("a");
        assert_eq!(cache.stats(), (1, 4));
    }

    #[test]
    fn zero_capacity_still_holds_one() {
        let mut cache = ParseCache::new(0);
        cache.parse("x");
        assert_eq!(cache.len(), 1);
        assert!(cache.has_formatting("*x*"));
        assert!(!cache.has_formatting("x"));
    }
}
