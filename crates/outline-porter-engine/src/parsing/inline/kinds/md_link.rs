/// Markdown links and images: `[text](target)` / `![alt](target)`, with an
/// optional attribute block right after: `{:width 300 :height 200}`.
pub struct MdLink;

impl MdLink {
    pub const IMAGE_BANG: u8 = b'!';
    pub const TEXT_OPEN: u8 = b'[';
    pub const TEXT_CLOSE: u8 = b']';
    pub const TARGET_OPEN: u8 = b'(';
    pub const TARGET_CLOSE: u8 = b')';
    pub const ATTRS_OPEN: &'static [u8; 2] = b"{:";
    pub const ATTRS_CLOSE: u8 = b'}';
}

/// Raster image extensions, lower case.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "bmp", "tif", "tiff", "ico", "avif", "heic",
];

/// Whether `path` names a raster image by its extension.
pub fn is_image_path(path: &str) -> bool {
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
    file.rsplit_once('.').is_some_and(|(_, ext)| {
        IMAGE_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    })
}

/// Width and height from an attribute block body such as
/// `:height 309, :width 580`.
pub fn parse_dimensions(attrs: &str) -> (Option<u32>, Option<u32>) {
    let mut width = None;
    let mut height = None;
    let mut tokens = attrs
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty());

    while let Some(key) = tokens.next() {
        let slot = match key {
            ":width" => &mut width,
            ":height" => &mut height,
            _ => continue,
        };
        if let Some(value) = tokens.next() {
            *slot = parse_dimension(value);
        }
    }

    (width, height)
}

fn parse_dimension(value: &str) -> Option<u32> {
    let value = value.trim_matches('"');
    value.parse::<u32>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0 && *v <= f64::from(u32::MAX))
            .map(|v| v.round() as u32)
    })
}
