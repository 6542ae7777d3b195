/// A byte range `[start, end)` into a block's raw text.
///
/// Inline nodes store spans rather than copied text; slicing the source with
/// any span reproduces the exact characters it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    /// Inclusive start byte offset.
    pub start: usize,
    /// Exclusive end byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length in bytes. Uses saturating subtraction for safety.
    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the span is empty (start >= end).
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// The text this span covers in `source`.
    #[must_use]
    pub fn slice(self, source: &str) -> &str {
        &source[self.start..self.end]
    }

    /// Narrows the span to exclude leading and trailing whitespace.
    #[must_use]
    pub fn trim(self, source: &str) -> Self {
        let text = self.slice(source);
        let lead = text.len() - text.trim_start().len();
        let trail = text.len() - text.trim_end().len();
        if lead == text.len() {
            return Self::new(self.start, self.start);
        }
        Self::new(self.start + lead, self.end - trail)
    }
}
