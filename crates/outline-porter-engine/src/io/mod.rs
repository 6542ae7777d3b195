use crate::models::SourceFile;
use relative_path::{RelativePath, RelativePathBuf};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid notes directory: {0}")]
    InvalidNotesDir(String),
}

/// Which files under the source root count as notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Extensions without the leading dot, compared case-insensitively.
    pub extensions: Vec<String>,
    /// Directory names never descended into, at any depth.
    pub skip_dirs: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["md".to_string()],
            skip_dirs: ["logseq", ".git", "assets"].map(String::from).to_vec(),
        }
    }
}

impl ScanOptions {
    fn is_note(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    fn skips(&self, dir: &Path) -> bool {
        dir.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.skip_dirs.iter().any(|s| s == name))
    }
}

/// Read a note file and return its content
pub fn read_file(relative_path: &RelativePath, notes_root: &Path) -> Result<String, IoError> {
    let absolute_path = relative_path.to_path(notes_root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    fs::read_to_string(&absolute_path).map_err(IoError::Io)
}

/// Read any file as raw bytes
pub fn read_bytes(relative_path: &RelativePath, root: &Path) -> Result<Vec<u8>, IoError> {
    let absolute_path = relative_path.to_path(root);
    if !absolute_path.is_file() {
        return Err(IoError::NotFound(absolute_path));
    }
    fs::read(&absolute_path).map_err(IoError::Io)
}

/// Write content to a file, creating parent directories
pub fn write_file(
    relative_path: &RelativePath,
    root: &Path,
    content: impl AsRef<[u8]>,
) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(root);

    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(&absolute_path, content).map_err(IoError::Io)
}

/// Scan for note files in the notes directory, sorted by path
pub fn scan_note_files(notes_root: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>, IoError> {
    validate_notes_dir(notes_root)?;

    let mut files = Vec::new();
    scan_directory_recursive(notes_root, options, &mut files)?;
    files.sort();
    Ok(files)
}

/// Scan and read every note file. Files that cannot be read are skipped.
pub fn load_source_files(
    notes_root: &Path,
    options: &ScanOptions,
) -> Result<Vec<SourceFile>, IoError> {
    let mut sources = Vec::new();
    for path in scan_note_files(notes_root, options)? {
        let relative = match path
            .strip_prefix(notes_root)
            .ok()
            .and_then(|p| RelativePathBuf::from_path(p).ok())
        {
            Some(relative) => relative,
            None => {
                log::warn!("skipping {}: not representable under the notes root", path.display());
                continue;
            }
        };
        match read_file(&relative, notes_root) {
            Ok(content) => sources.push(SourceFile::new(relative, content)),
            Err(e) => log::warn!("skipping unreadable note {relative}: {e}"),
        }
    }
    log::debug!("loaded {} note files from {}", sources.len(), notes_root.display());
    Ok(sources)
}

fn scan_directory_recursive(
    dir: &Path,
    options: &ScanOptions,
    files: &mut Vec<PathBuf>,
) -> Result<(), IoError> {
    let entries = fs::read_dir(dir).map_err(IoError::Io)?;

    for entry in entries {
        let entry = entry.map_err(IoError::Io)?;
        let path = entry.path();

        if path.is_dir() {
            if options.skips(&path) {
                log::debug!("not descending into {}", path.display());
                continue;
            }
            scan_directory_recursive(&path, options, files)?;
        } else if options.is_note(&path) {
            files.push(path);
        }
    }

    Ok(())
}

pub fn validate_notes_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidNotesDir(format!(
            "{} is not a directory",
            path.display()
        )));
    }

    Ok(())
}
