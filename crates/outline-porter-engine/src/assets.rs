//! Asset Migrator: uploads locally referenced files and maps their old
//! link targets to where the host stored them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use relative_path::{Component, RelativePath, RelativePathBuf};

use crate::host::{AssetUpload, Host, HostError, NotifyLevel};
use crate::io::{IoError, read_bytes};
use crate::models::Page;
use crate::parsing::inline::{InlineNode, parse_inline};

/// Link target as written in the source (`../assets/a.png`) to the path the
/// host assigned on upload.
pub type AssetPathMap = HashMap<String, String>;

/// Where asset bytes come from.
pub trait AssetSource: Send + Sync {
    /// Reads `path`, relative to the assets directory.
    ///
    /// Returns [`IoError::InvalidNotesDir`] when the assets directory itself
    /// is missing and [`IoError::NotFound`] for a missing file.
    fn read_asset(&self, path: &RelativePath) -> Result<Vec<u8>, IoError>;
}

/// Reads assets from `<root>/<assets_dir>`.
#[derive(Debug, Clone)]
pub struct FsAssetSource {
    dir: PathBuf,
}

impl FsAssetSource {
    pub fn new(root: &Path, assets_dir: &str) -> Self {
        Self {
            dir: root.join(assets_dir),
        }
    }
}

impl AssetSource for FsAssetSource {
    fn read_asset(&self, path: &RelativePath) -> Result<Vec<u8>, IoError> {
        if !self.dir.is_dir() {
            return Err(IoError::InvalidNotesDir(format!(
                "assets directory {} not found",
                self.dir.display()
            )));
        }
        let normalized = path.normalize();
        if normalized.components().any(|c| c == Component::ParentDir) {
            return Err(IoError::NotFound(normalized.to_path(&self.dir)));
        }
        read_bytes(&normalized, &self.dir)
    }
}

/// Counts and mappings produced by one [`migrate_assets`] call.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AssetMigration {
    /// Newly uploaded paths only.
    pub map: AssetPathMap,
    pub uploaded: usize,
    pub failed: usize,
    /// Referenced but not readable from the source.
    pub missing: usize,
}

/// Distinct asset link targets in first-seen order.
pub fn collect_asset_paths<'a>(
    pages: impl IntoIterator<Item = &'a Page>,
    prefix: &str,
) -> Vec<String> {
    let mut found = IndexSet::new();
    for page in pages {
        for block in page.walk() {
            let raw = block.content.as_str();
            for node in parse_inline(raw) {
                if let InlineNode::Link { target, .. } = node {
                    let target = target.slice(raw);
                    if target.starts_with(prefix) && target.len() > prefix.len() {
                        found.insert(target.to_string());
                    }
                }
            }
        }
    }
    found.into_iter().collect()
}

/// Uploads every asset referenced by `pages` that is not in `known` yet.
///
/// Missing files and failed uploads are reported and left out of the map.
/// Only a fatal host error is returned.
pub async fn migrate_assets<H: Host + ?Sized>(
    pages: &[&Page],
    source: &dyn AssetSource,
    host: &H,
    prefix: &str,
    known: &AssetPathMap,
) -> Result<AssetMigration, HostError> {
    let mut migration = AssetMigration::default();
    let paths: Vec<String> = collect_asset_paths(pages.iter().copied(), prefix)
        .into_iter()
        .filter(|p| !known.contains_key(p))
        .collect();
    if paths.is_empty() {
        return Ok(migration);
    }

    let mut uploads = Vec::with_capacity(paths.len());
    for path in paths {
        let relative = RelativePathBuf::from(&path[prefix.len()..]);
        match source.read_asset(&relative) {
            Ok(bytes) => uploads.push(AssetUpload {
                name: relative.normalize().into_string(),
                source_path: path,
                bytes,
            }),
            Err(IoError::InvalidNotesDir(message)) => {
                log::warn!("{message}; skipping asset upload");
                host.notify(NotifyLevel::Warn, &format!("Assets not imported: {message}"));
                return Ok(migration);
            }
            Err(e) => {
                log::warn!("asset {path} skipped: {e}");
                host.notify(NotifyLevel::Warn, &format!("Asset not found: {path}"));
                migration.missing += 1;
            }
        }
    }
    if uploads.is_empty() {
        return Ok(migration);
    }

    let sources: Vec<String> = uploads.iter().map(|u| u.source_path.clone()).collect();
    let outcome = match host.upload_assets(uploads).await {
        Ok(outcome) => outcome,
        Err(e) if !e.is_fatal() => {
            log::warn!("upload of {} assets failed: {e}", sources.len());
            host.notify(NotifyLevel::Warn, &format!("Asset upload failed: {e}"));
            migration.failed += sources.len();
            return Ok(migration);
        }
        Err(e) => return Err(e),
    };

    let source_at = |index: usize| {
        sources.get(index).ok_or_else(|| {
            HostError::invalid("upload-assets", format!("unknown upload index {index}"))
        })
    };
    for uploaded in outcome.uploaded {
        let original = source_at(uploaded.original_index)?;
        log::debug!("asset {original} -> {}", uploaded.path);
        migration.map.insert(original.clone(), uploaded.path);
        migration.uploaded += 1;
    }
    for failed in outcome.failed {
        let original = source_at(failed.original_index)?;
        log::warn!("asset {original} failed to upload: {}", failed.reason);
        migration.failed += 1;
    }
    Ok(migration)
}
