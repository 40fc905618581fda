/// A cursor for character-by-character inline scanning.
///
/// Operates over a pre-split `char` slice so every position is a char
/// offset, which is the unit the cursor model and spans use.
#[derive(Clone)]
pub struct Cursor<'a> {
    /// The characters being scanned.
    pub s: &'a [char],
    /// Current index into `s`.
    pub i: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a new cursor at the start of `s`.
    pub fn new(s: &'a [char]) -> Self {
        Self { s, i: 0 }
    }

    /// Returns the current char offset.
    pub fn pos(&self) -> usize {
        self.i
    }

    /// Returns true if at end of input.
    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    /// Peeks at the current char without advancing.
    pub fn peek(&self) -> Option<char> {
        self.s.get(self.i).copied()
    }

    /// The char immediately before the current position.
    pub fn prev(&self) -> Option<char> {
        self.i.checked_sub(1).and_then(|p| self.s.get(p).copied())
    }

    /// The char `n` positions ahead of the current one.
    pub fn peek_at(&self, n: usize) -> Option<char> {
        self.s.get(self.i + n).copied()
    }

    /// Checks if the remaining input starts with the given pattern.
    pub fn starts_with(&self, pat: &str) -> bool {
        let mut idx = self.i;
        for c in pat.chars() {
            if self.s.get(idx) != Some(&c) {
                return false;
            }
            idx += 1;
        }
        true
    }

    /// Length of the run of `c` starting at the current position.
    pub fn run_of(&self, c: char) -> usize {
        self.s[self.i.min(self.s.len())..]
            .iter()
            .take_while(|&&x| x == c)
            .count()
    }

    /// Advances by one char, returning the consumed char.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.s.get(self.i).copied()?;
        self.i += 1;
        Some(c)
    }

    /// Advances by `n` chars.
    pub fn bump_n(&mut self, n: usize) {
        self.i += n;
    }
}
