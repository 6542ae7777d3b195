use relative_path::{RelativePath, RelativePathBuf};

/// A raw note file as read from the source root.
///
/// Produced once by file discovery and consumed once by the page parser.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    path: RelativePathBuf,
    content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<RelativePathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Get the path relative to the source root
    pub fn path(&self) -> &RelativePath {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Page name for this file: last path segment with its extension stripped.
    pub fn page_name(&self) -> String {
        Self::extract_page_name(&self.path)
    }

    fn extract_page_name(path: &RelativePath) -> String {
        path.file_stem()
            .filter(|stem| !stem.is_empty())
            .or_else(|| path.file_name())
            .unwrap_or("Untitled")
            .to_string()
    }
}
