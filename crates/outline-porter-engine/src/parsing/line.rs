use std::sync::LazyLock;

use regex::Regex;

/// `key:: value` with an optional (possibly empty) value.
static PROPERTY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^\s:][^\s]*?)::(?:\s+(.*?))?\s*$").expect("property line regex is valid")
});

/// The key that carries a block's explicit identity.
pub const ID_KEY: &str = "id";

/// Block marker, recognised after leading indentation.
pub const MARKER: &str = "- ";

/// How leading whitespace maps onto nesting depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndentStyle {
    /// Columns per nesting level. A tab always counts as one full level.
    pub width: usize,
}

impl IndentStyle {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
        }
    }

    /// Convert leading whitespace to a depth level.
    pub fn calculate_depth(&self, line: &str) -> usize {
        let columns: usize = line
            .chars()
            .take_while(|c| c.is_whitespace())
            .map(|c| if c == '\t' { self.width } else { 1 })
            .sum();
        columns / self.width
    }
}

impl Default for IndentStyle {
    fn default() -> Self {
        Self::new(2)
    }
}

/// What a single line contributes, decided from the line alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Empty or whitespace only.
    Blank,
    /// A `- ` line opening a new block.
    BlockStart { level: usize, content: &'a str },
    /// A `key:: value` line.
    Property { key: &'a str, value: &'a str },
    /// Anything else.
    Other,
}

impl LineKind<'_> {
    /// Returns the id value if this is an `id::` property line with a value.
    pub fn as_id(&self) -> Option<&str> {
        match self {
            LineKind::Property { key, value }
                if key.eq_ignore_ascii_case(ID_KEY) && !value.is_empty() =>
            {
                Some(value)
            }
            _ => None,
        }
    }
}

/// Classifies individual lines for the page parser.
///
/// Phase 1 of page parsing: no line looks at its neighbours.
#[derive(Debug, Default, Clone, Copy)]
pub struct OutlineLineClassifier {
    pub indent: IndentStyle,
}

impl OutlineLineClassifier {
    pub fn new(indent: IndentStyle) -> Self {
        Self { indent }
    }

    pub fn classify<'a>(&self, line: &'a str) -> LineKind<'a> {
        let line = line.trim_end_matches(['\r', '\n']);
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return LineKind::Blank;
        }

        let unindented = line.trim_start();
        if let Some(content) = unindented.strip_prefix(MARKER) {
            return LineKind::BlockStart {
                level: self.indent.calculate_depth(line),
                content: content.trim_end(),
            };
        }
        if trimmed == MARKER.trim_end() {
            return LineKind::BlockStart {
                level: self.indent.calculate_depth(line),
                content: "",
            };
        }

        if let Some(caps) = PROPERTY_LINE.captures(trimmed)
            && let Some(key) = caps.get(1)
        {
            return LineKind::Property {
                key: key.as_str(),
                value: caps.get(2).map_or("", |v| v.as_str()),
            };
        }

        LineKind::Other
    }
}
