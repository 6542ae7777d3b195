use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::assets::{AssetPathMap, AssetSource, FsAssetSource, migrate_assets};
use crate::graph::{Graph, build_graph};
use crate::host::{Host, NotifyLevel};
use crate::io::{ScanOptions, load_source_files};
use crate::models::{Page, SourceFile, UuidMap};
use crate::parsing::{ParseOptions, parse_file_with};
use crate::transform::DEFAULT_ASSETS_PREFIX;

use super::{BatchImporter, BatchReport, ImportError};

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Pages per batch; each batch is two undo groups.
    pub batch_size: usize,
    pub page_delay: Duration,
    pub parse: ParseOptions,
    /// Link targets starting with this are local assets.
    pub assets_prefix: String,
    /// Assets directory name under the source root.
    pub assets_dir: String,
    pub scan: ScanOptions,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            page_delay: DEFAULT_PAGE_DELAY,
            parse: ParseOptions::default(),
            assets_prefix: DEFAULT_ASSETS_PREFIX.to_string(),
            assets_dir: "assets".to_string(),
            scan: ScanOptions::default(),
        }
    }
}

impl ImportOptions {
    fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum RunOutcome {
    #[default]
    Completed,
    /// No note files were found; nothing was written.
    NothingToImport,
    /// A fatal error stopped the run. Earlier batches stay written.
    Aborted { message: String },
}

/// Summary of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub outcome: RunOutcome,
    pub pages_total: usize,
    pub batches: usize,
    pub pages_imported: usize,
    pub pages_failed: usize,
    pub blocks_created: usize,
    pub refs_rewritten: usize,
    pub assets_uploaded: usize,
    pub assets_failed: usize,
    pub assets_missing: usize,
}

impl ImportReport {
    fn nothing_to_import() -> Self {
        Self {
            outcome: RunOutcome::NothingToImport,
            ..Self::default()
        }
    }

    fn absorb(&mut self, batch: BatchReport) {
        self.batches += 1;
        self.pages_imported += batch.pages_imported;
        self.pages_failed += batch.pages_failed;
        self.blocks_created += batch.blocks_created;
        self.refs_rewritten += batch.refs_rewritten;
    }
}

/// Imports every note under `root` into `host`.
///
/// Never fails: every problem ends up in a notification and in the
/// returned report.
pub async fn run_import<H: Host + ?Sized>(
    root: &Path,
    host: &H,
    options: &ImportOptions,
) -> ImportReport {
    let sources = match load_source_files(root, &options.scan).map_err(ImportError::from) {
        Ok(sources) => sources,
        Err(e) => {
            log::warn!("cannot read source root {}: {e}", root.display());
            host.notify(NotifyLevel::Warn, &format!("Nothing to import: {e}"));
            return ImportReport::nothing_to_import();
        }
    };
    let assets = FsAssetSource::new(root, &options.assets_dir);
    import_files(sources, &assets, host, options).await
}

/// Parses `sources` into one graph and imports it batch by batch.
pub async fn import_files<H: Host + ?Sized>(
    sources: Vec<SourceFile>,
    assets: &dyn AssetSource,
    host: &H,
    options: &ImportOptions,
) -> ImportReport {
    if sources.is_empty() {
        log::warn!("no note files found");
        host.notify(NotifyLevel::Warn, "No note files found to import");
        return ImportReport::nothing_to_import();
    }

    let graph = build_graph(sources.iter().map(|s| parse_file_with(s, &options.parse)));
    log::info!(
        "parsed {} pages with {} referenceable blocks",
        graph.page_count(),
        graph.block_count()
    );

    let mut report = ImportReport {
        pages_total: graph.page_count(),
        ..ImportReport::default()
    };
    match import_graph(&graph, assets, host, options, &mut report).await {
        Ok(()) => {
            log::info!(
                "import finished: {} pages imported, {} failed",
                report.pages_imported,
                report.pages_failed
            );
            host.notify(
                NotifyLevel::Success,
                &format!(
                    "Imported {} of {} pages",
                    report.pages_imported, report.pages_total
                ),
            );
        }
        Err(e) => {
            log::error!("import aborted: {e}");
            host.notify(NotifyLevel::Error, &format!("Import aborted: {e}"));
            report.outcome = RunOutcome::Aborted {
                message: e.to_string(),
            };
        }
    }
    report
}

async fn import_graph<H: Host + ?Sized>(
    graph: &Graph,
    assets: &dyn AssetSource,
    host: &H,
    options: &ImportOptions,
    report: &mut ImportReport,
) -> Result<(), ImportError> {
    let pages: Vec<&Page> = graph.pages.values().collect();
    let total = pages.len();
    let mut uuid_map = UuidMap::new();
    let mut asset_map = AssetPathMap::new();
    let mut done = 0;

    for batch in pages.chunks(options.effective_batch_size()) {
        let migration =
            migrate_assets(batch, assets, host, &options.assets_prefix, &asset_map).await?;
        report.assets_uploaded += migration.uploaded;
        report.assets_failed += migration.failed;
        report.assets_missing += migration.missing;
        asset_map.extend(migration.map);

        let batch_report = BatchImporter::new(host, graph, &asset_map, &mut uuid_map)
            .with_assets_prefix(&options.assets_prefix)
            .with_page_delay(options.page_delay)
            .import_batch(batch)
            .await?;
        report.absorb(batch_report);

        done += batch.len();
        log::info!("batch {}: {done} / {total} pages", report.batches);
        host.notify(NotifyLevel::Info, &format!("{done} / {total}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::tests::{create_test_bytes, create_test_file, create_test_notes_dir};
    use pretty_assertions::assert_eq;

    fn quick() -> ImportOptions {
        ImportOptions {
            page_delay: Duration::ZERO,
            ..ImportOptions::default()
        }
    }

    #[tokio::test]
    async fn empty_directory_is_nothing_to_import() {
        let dir = create_test_notes_dir();
        let host = MemoryHost::new();

        let report = run_import(dir.path(), &host, &quick()).await;

        assert_eq!(report.outcome, RunOutcome::NothingToImport);
        assert_eq!(host.block_count(), 0);
        assert_eq!(host.notifications()[0].0, NotifyLevel::Warn);
    }

    #[tokio::test]
    async fn missing_root_is_nothing_to_import() {
        let host = MemoryHost::new();
        let report = run_import(Path::new("/no/such/graph"), &host, &quick()).await;
        assert_eq!(report.outcome, RunOutcome::NothingToImport);
    }

    #[tokio::test]
    async fn imports_directory_with_assets() {
        let dir = create_test_notes_dir();
        create_test_file(&dir, "pages/Foo.md", "- Hello ![pic](../assets/p.png)");
        create_test_bytes(&dir, "assets/p.png", b"img");
        let host = MemoryHost::new();

        let report = run_import(dir.path(), &host, &quick()).await;

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.pages_imported, 1);
        assert_eq!(report.assets_uploaded, 1);
        assert_eq!(host.assets().len(), 1);
    }

    #[tokio::test]
    async fn progress_is_reported_per_batch() {
        let sources: Vec<_> = (0..5)
            .map(|i| SourceFile::new(format!("p{i}.md"), "- x"))
            .collect();
        let dir = create_test_notes_dir();
        let host = MemoryHost::new();
        let options = ImportOptions {
            batch_size: 2,
            ..quick()
        };

        let report = import_files(
            sources,
            &FsAssetSource::new(dir.path(), "assets"),
            &host,
            &options,
        )
        .await;

        assert_eq!(report.batches, 3);
        assert_eq!(host.undo_groups(), 6);
        let progress: Vec<_> = host
            .notifications()
            .into_iter()
            .filter(|(level, _)| *level == NotifyLevel::Info)
            .map(|(_, message)| message)
            .collect();
        assert_eq!(progress, vec!["2 / 5", "4 / 5", "5 / 5"]);
    }

    #[tokio::test]
    async fn zero_batch_size_is_clamped() {
        let sources = vec![SourceFile::new("a.md", "- a"), SourceFile::new("b.md", "- b")];
        let dir = create_test_notes_dir();
        let host = MemoryHost::new();
        let options = ImportOptions {
            batch_size: 0,
            ..quick()
        };

        let report = import_files(
            sources,
            &FsAssetSource::new(dir.path(), "assets"),
            &host,
            &options,
        )
        .await;
        assert_eq!(report.batches, 2);
    }

    #[tokio::test]
    async fn fatal_error_aborts_the_run() {
        let sources = vec![SourceFile::new("a.md", "- a")];
        let dir = create_test_notes_dir();
        let host = MemoryHost::new().lose_fetched_blocks();

        let report = import_files(
            sources,
            &FsAssetSource::new(dir.path(), "assets"),
            &host,
            &quick(),
        )
        .await;

        assert!(matches!(report.outcome, RunOutcome::Aborted { .. }));
        let (level, message) = host.notifications().pop().unwrap();
        assert_eq!(level, NotifyLevel::Error);
        assert!(message.starts_with("Import aborted"));
    }

    #[test]
    fn report_serializes_outcome_tag() {
        let json = serde_json::to_value(ImportReport::nothing_to_import()).unwrap();
        assert_eq!(json["outcome"]["status"], "nothing-to-import");
    }
}
