/// A byte cursor over one block's raw text.
///
/// All delimiters recognised by the inline parser are ASCII, so the cursor
/// only ever stops on a character boundary when a construct matches.
#[derive(Clone)]
pub struct Cursor<'a> {
    /// The text being scanned.
    pub s: &'a str,
    /// Current byte index into `s`.
    pub i: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    pub fn pos(&self) -> usize {
        self.i
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    /// Peeks at the current byte without advancing.
    pub fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i).copied()
    }

    /// Checks if the remaining input starts with the given byte pattern.
    pub fn starts_with(&self, pat: &[u8]) -> bool {
        self.s
            .as_bytes()
            .get(self.i..)
            .is_some_and(|rest| rest.starts_with(pat))
    }

    /// Advances by one byte, returning the consumed byte.
    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.i += 1;
        Some(b)
    }

    /// Advances by `n` bytes.
    pub fn bump_n(&mut self, n: usize) {
        self.i += n;
    }

    /// Skips ASCII spaces and tabs.
    pub fn skip_blanks(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.i += 1;
        }
    }

    /// Advances until `pat` is next, returning the start of `pat`.
    ///
    /// Leaves the cursor untouched and returns `None` if `pat` never occurs.
    pub fn seek(&mut self, pat: &[u8]) -> Option<usize> {
        if pat.is_empty() {
            return Some(self.i);
        }
        let rest = self.s.as_bytes().get(self.i..)?;
        let offset = rest.windows(pat.len()).position(|w| w == pat)?;
        self.i += offset;
        Some(self.i)
    }

    /// The character immediately before the cursor, if any.
    pub fn prev_char(&self) -> Option<char> {
        self.s.get(..self.i)?.chars().next_back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_basics() {
        let mut cur = Cursor::new("hello");
        assert_eq!(cur.pos(), 0);
        assert!(!cur.eof());
        assert_eq!(cur.peek(), Some(b'h'));
        assert_eq!(cur.bump(), Some(b'h'));
        assert_eq!(cur.pos(), 1);
    }

    #[test]
    fn cursor_starts_with() {
        let cur = Cursor::new("((abc))");
        assert!(cur.starts_with(b"(("));
        assert!(!cur.starts_with(b"))"));
    }

    #[test]
    fn empty_string_input() {
        let cur = Cursor::new("");
        assert!(cur.eof());
        assert_eq!(cur.peek(), None);
        assert_eq!(cur.prev_char(), None);
    }

    #[test]
    fn starts_with_pattern_longer_than_remaining() {
        let mut cur = Cursor::new("ab");
        assert!(!cur.starts_with(b"abcdef"));
        cur.bump();
        assert!(!cur.starts_with(b"bc"));
        assert!(cur.starts_with(b"b"));
    }

    #[test]
    fn starts_with_past_end_is_false() {
        let mut cur = Cursor::new("hi");
        cur.bump_n(10);
        assert!(cur.eof());
        assert!(!cur.starts_with(b"h"));
    }

    #[test]
    fn bump_at_eof_returns_none() {
        let mut cur = Cursor::new("x");
        assert_eq!(cur.bump(), Some(b'x'));
        assert_eq!(cur.bump(), None);
        assert_eq!(cur.bump(), None);
    }

    #[test]
    fn seek_finds_pattern() {
        let mut cur = Cursor::new("abc))def");
        assert_eq!(cur.seek(b"))"), Some(3));
        assert_eq!(cur.pos(), 3);
    }

    #[test]
    fn seek_without_match_leaves_cursor() {
        let mut cur = Cursor::new("abc");
        cur.bump();
        assert_eq!(cur.seek(b"))"), None);
        assert_eq!(cur.pos(), 1);
    }

    #[test]
    fn skip_blanks_stops_at_text() {
        let mut cur = Cursor::new("  \tx");
        cur.skip_blanks();
        assert_eq!(cur.peek(), Some(b'x'));
    }

    #[test]
    fn prev_char_handles_multibyte() {
        let mut cur = Cursor::new("é#");
        cur.bump_n("é".len());
        assert_eq!(cur.prev_char(), Some('é'));
    }
}
