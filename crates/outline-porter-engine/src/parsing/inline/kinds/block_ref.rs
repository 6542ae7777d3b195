/// `((block-id))`.
pub struct BlockRef;

impl BlockRef {
    pub const OPEN: &'static [u8; 2] = b"((";
    pub const CLOSE: &'static [u8; 2] = b"))";
}

/// `{{embed ((block-id))}}` or `{{embed [[Page]]}}`.
pub struct Embed;

impl Embed {
    pub const OPEN: &'static [u8; 7] = b"{{embed";
    pub const CLOSE: &'static [u8; 2] = b"}}";
}
