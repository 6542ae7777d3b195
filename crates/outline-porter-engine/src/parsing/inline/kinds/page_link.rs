/// `[[Page Name]]`, optionally written as a tag: `#[[Page Name]]`.
pub struct PageLink;

impl PageLink {
    pub const OPEN: &'static [u8; 2] = b"[[";
    pub const CLOSE: &'static [u8; 2] = b"]]";
    pub const TAG_OPEN: &'static [u8; 3] = b"#[[";
}
