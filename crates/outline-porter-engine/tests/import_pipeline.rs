use std::fs;
use std::time::Duration;

use outline_porter_engine::host::memory::StoredBlock;
use outline_porter_engine::{
    Fragment, FsAssetSource, ImportOptions, MemoryHost, NotifyLevel, RunOutcome, SourceFile,
    build_graph, import_files, parse_file, run_import,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::TempDir;

fn options(batch_size: usize) -> ImportOptions {
    ImportOptions {
        batch_size,
        page_delay: Duration::ZERO,
        ..ImportOptions::default()
    }
}

fn pages(count: usize) -> Vec<SourceFile> {
    (1..=count)
        .map(|i| SourceFile::new(format!("pages/P{i:03}.md"), format!("- page {i}")))
        .collect()
}

fn first_text(block: &StoredBlock) -> String {
    match block.content.first() {
        Some(Fragment::Text { v }) => v.clone(),
        other => panic!("expected text, got {other:?}"),
    }
}

#[test]
fn foo_example_parses_and_resolves() {
    let file = SourceFile::new(
        "pages/Foo.md",
        "- First block\n  id:: abc-123\n- Second block references ((abc-123))",
    );
    let page = parse_file(&file);
    assert_eq!(page.name, "Foo");
    assert_eq!(page.blocks.len(), 2);

    let graph = build_graph([page]);
    let assets = outline_porter_engine::AssetPathMap::new();
    let targets = outline_porter_engine::UuidMap::new();
    let ctx = outline_porter_engine::ResolveContext::new(&graph, &assets, &targets);
    let second = &graph.page("Foo").unwrap().blocks[1].content;
    let fragments = outline_porter_engine::to_fragments(second, &ctx);

    assert!(fragments.iter().any(|f| matches!(
        f,
        Fragment::BlockRef { v, resolved: true, .. } if v == "First block"
    )));
}

#[tokio::test]
async fn foo_example_end_to_end() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("pages")).unwrap();
    fs::write(
        dir.path().join("pages/Foo.md"),
        "- First block\n  id:: abc-123\n- Second block references ((abc-123))",
    )
    .unwrap();
    let host = MemoryHost::new();

    let report = run_import(dir.path(), &host, &options(50)).await;

    assert_eq!(report.outcome, RunOutcome::Completed);
    let roots = host.roots();
    assert_eq!(roots.len(), 1);
    assert_eq!(first_text(&roots[0]), "Foo");

    let blocks = host.children(roots[0].id);
    assert_eq!(blocks.len(), 2);
    assert_eq!(first_text(&blocks[0]), "First block");
    assert_eq!(
        blocks[1].content[1],
        Fragment::BlockRef {
            v: "First block".to_string(),
            id: "abc-123".to_string(),
            target: Some(blocks[0].id),
            embed: false,
            resolved: true,
        }
    );
}

#[rstest]
#[case(1, 50, 1)]
#[case(50, 50, 1)]
#[case(51, 50, 2)]
#[case(7, 3, 3)]
#[tokio::test]
async fn batch_count_is_ceil_of_pages_over_size(
    #[case] count: usize,
    #[case] batch_size: usize,
    #[case] batches: usize,
) {
    let dir = TempDir::new().unwrap();
    let host = MemoryHost::new();

    let report = import_files(
        pages(count),
        &FsAssetSource::new(dir.path(), "assets"),
        &host,
        &options(batch_size),
    )
    .await;

    assert_eq!(report.batches, batches);
    assert_eq!(report.pages_imported, count);
    // Two undo groups per batch, all closed.
    assert_eq!(host.undo_groups(), 2 * batches);
    assert_eq!(host.open_undo_groups(), 0);
}

#[tokio::test]
async fn failing_page_does_not_stop_later_pages() {
    let mut sources = pages(7);
    sources[2] = SourceFile::new("pages/P003.md", "- explode here");
    let dir = TempDir::new().unwrap();
    let host = MemoryHost::new().fail_creates_containing("explode");

    let report = import_files(
        sources,
        &FsAssetSource::new(dir.path(), "assets"),
        &host,
        &options(3),
    )
    .await;

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.pages_failed, 1);
    assert_eq!(report.pages_imported, 6);
    let titles: Vec<_> = host.roots().iter().map(first_text).collect();
    assert_eq!(
        titles,
        vec!["P001", "P002", "P003", "P004", "P005", "P006", "P007"]
    );
    assert!(
        host.notifications()
            .iter()
            .any(|(level, m)| *level == NotifyLevel::Error && m.contains("P003"))
    );
}

#[tokio::test]
async fn forward_reference_within_a_batch_is_linked() {
    let sources = vec![
        SourceFile::new("pages/A.md", "- points at ((later))"),
        SourceFile::new("pages/B.md", "- the target\n  id:: later"),
    ];
    let dir = TempDir::new().unwrap();
    let host = MemoryHost::new();

    let report = import_files(
        sources,
        &FsAssetSource::new(dir.path(), "assets"),
        &host,
        &options(50),
    )
    .await;

    assert_eq!(report.refs_rewritten, 1);
    let roots = host.roots();
    let target = host.children(roots[1].id)[0].id;
    let referring = &host.children(roots[0].id)[0];
    assert!(referring.content.iter().any(|f| matches!(
        f,
        Fragment::BlockRef { target: Some(t), .. } if *t == target
    )));
}

#[tokio::test]
async fn forward_reference_into_a_later_batch_stays_unlinked() {
    let sources = vec![
        SourceFile::new("pages/A.md", "- points at ((later))"),
        SourceFile::new("pages/B.md", "- the target\n  id:: later"),
    ];
    let dir = TempDir::new().unwrap();
    let host = MemoryHost::new();

    let report = import_files(
        sources,
        &FsAssetSource::new(dir.path(), "assets"),
        &host,
        &options(1),
    )
    .await;

    assert_eq!(report.refs_rewritten, 0);
    let referring = &host.children(host.roots()[0].id)[0];
    assert!(referring.content.iter().any(|f| matches!(
        f,
        Fragment::BlockRef { target: None, resolved: true, .. }
    )));
}

#[tokio::test]
async fn assets_are_uploaded_once_and_rewritten() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("pages")).unwrap();
    fs::create_dir_all(dir.path().join("assets")).unwrap();
    fs::write(dir.path().join("assets/a.png"), b"png").unwrap();
    fs::write(dir.path().join("pages/One.md"), "- ![x](../assets/a.png)").unwrap();
    fs::write(
        dir.path().join("pages/Two.md"),
        "- again ![y](../assets/a.png)\n- ![z](../assets/missing.png)",
    )
    .unwrap();
    let host = MemoryHost::new();

    let report = run_import(dir.path(), &host, &options(1)).await;

    assert_eq!(report.assets_uploaded, 1);
    assert_eq!(report.assets_missing, 1);
    assert_eq!(host.assets().len(), 1);

    let one = host.children(host.roots()[0].id);
    assert_eq!(
        one[0].content,
        vec![Fragment::Image {
            src: "assets/a.png".to_string(),
            alt: "x".to_string(),
            width: None,
            height: None,
        }]
    );
    let two = host.children(host.roots()[1].id);
    assert_eq!(
        two[1].content,
        vec![Fragment::text("attachment not found: ../assets/missing.png")]
    );
}

#[tokio::test]
async fn skipped_directories_are_not_imported() {
    let dir = TempDir::new().unwrap();
    for (path, content) in [
        ("pages/Kept.md", "- kept"),
        ("logseq/bak/pages/Kept.md", "- stale backup"),
    ] {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    let host = MemoryHost::new();

    let report = run_import(dir.path(), &host, &options(50)).await;

    assert_eq!(report.pages_total, 1);
    let kept = host.children(host.roots()[0].id);
    assert_eq!(first_text(&kept[0]), "kept");
}
