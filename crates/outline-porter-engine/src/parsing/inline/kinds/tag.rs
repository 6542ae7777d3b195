/// Bare `#tag`.
pub struct Tag;

impl Tag {
    pub const HASH: u8 = b'#';

    /// Characters that end a tag token (whitespace also ends it).
    pub const TERMINATORS: &'static [char] = &['#', '[', ']', '(', ')', '{', '}'];

    /// Sentence punctuation dropped from the end of a token.
    pub const TRAILING: &'static [char] = &[',', '.', ';', ':', '!', '?', '"', '\''];

    /// Brackets and quotes a tag may sit directly inside, as in `(#tag)`.
    pub const OPENERS: &'static [char] = &['(', '[', '{', '"', '\''];

    /// Tags start at the beginning of text, after whitespace or after an
    /// opener. `C#` and `page#anchor` stay text.
    pub fn may_follow(prev: Option<char>) -> bool {
        prev.is_none_or(|c| c.is_whitespace() || Self::OPENERS.contains(&c))
    }

    pub fn ends_token(c: char) -> bool {
        c.is_whitespace() || Self::TERMINATORS.contains(&c)
    }
}
