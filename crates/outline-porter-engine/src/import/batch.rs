use std::time::Duration;

use crate::assets::AssetPathMap;
use crate::graph::Graph;
use crate::host::{
    BlockSnapshot, BlockType, Host, HostError, NotifyLevel, Position, TargetProperty,
    UndoGroupOptions, run_as_one_undo_group,
};
use crate::models::{Block, Page, Properties, TargetId, UuidMap};
use crate::transform::{DEFAULT_ASSETS_PREFIX, Fragment, ResolveContext, to_fragments};

use super::ImportError;

/// What one batch did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub pages_imported: usize,
    pub pages_failed: usize,
    pub blocks_created: usize,
    /// Blocks whose content pass 2 rewrote.
    pub refs_rewritten: usize,
}

/// A created block whose references still lacked a target id.
struct Deferred<'a> {
    id: TargetId,
    raw: &'a str,
    written: Vec<Fragment>,
}

/// Imports one batch of pages.
///
/// The uuid map is borrowed for the whole run so later batches resolve
/// blocks created by earlier ones.
pub struct BatchImporter<'a, H: Host + ?Sized> {
    host: &'a H,
    graph: &'a Graph,
    assets: &'a AssetPathMap,
    assets_prefix: &'a str,
    page_delay: Duration,
    uuid_map: &'a mut UuidMap,
}

impl<'a, H: Host + ?Sized> BatchImporter<'a, H> {
    pub fn new(
        host: &'a H,
        graph: &'a Graph,
        assets: &'a AssetPathMap,
        uuid_map: &'a mut UuidMap,
    ) -> Self {
        Self {
            host,
            graph,
            assets,
            assets_prefix: DEFAULT_ASSETS_PREFIX,
            page_delay: Duration::ZERO,
            uuid_map,
        }
    }

    pub fn with_assets_prefix(mut self, prefix: &'a str) -> Self {
        self.assets_prefix = prefix;
        self
    }

    /// Pause between two pages, giving the host time to settle.
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Runs both passes over `pages`.
    ///
    /// A page that fails with a non-fatal error is reported and skipped. A
    /// fatal error stops the batch and is returned.
    pub async fn import_batch(&mut self, pages: &[&'a Page]) -> Result<BatchReport, ImportError> {
        let host = self.host;
        let mut report = BatchReport::default();
        let mut deferred = Vec::new();

        run_as_one_undo_group(host, UndoGroupOptions::default(), async {
            for (i, page) in pages.iter().copied().enumerate() {
                if i > 0 && !self.page_delay.is_zero() {
                    tokio::time::sleep(self.page_delay).await;
                }
                match self.create_page(page, &mut deferred).await {
                    Ok(created) => {
                        report.pages_imported += 1;
                        report.blocks_created += created;
                    }
                    Err(e) if !e.is_fatal() => {
                        log::warn!("page {:?} failed: {e}", page.name);
                        host.notify(
                            NotifyLevel::Error,
                            &format!("Failed to import page {}: {e}", page.name),
                        );
                        report.pages_failed += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok::<_, ImportError>(())
        })
        .await?;

        log::debug!("{} blocks deferred to the rewrite pass", deferred.len());
        report.refs_rewritten = run_as_one_undo_group(
            host,
            UndoGroupOptions::default(),
            self.rewrite_deferred(&deferred),
        )
        .await?;

        Ok(report)
    }

    /// Pass 1 for one page. Returns the number of blocks created.
    async fn create_page(
        &mut self,
        page: &'a Page,
        deferred: &mut Vec<Deferred<'a>>,
    ) -> Result<usize, ImportError> {
        let heading = self
            .host
            .create_block(
                None,
                Position::LastChild,
                vec![Fragment::text(&page.name)],
                BlockType::Heading { level: 1 },
            )
            .await?;
        self.set_properties(heading, &page.properties).await?;

        // Parents are fetched once and referenced by index from the stack.
        let mut parents: Vec<BlockSnapshot> = vec![self.snapshot(heading).await?];
        let mut stack: Vec<(usize, &'a Block)> =
            page.blocks.iter().rev().map(|b| (0, b)).collect();
        let mut created = 1;

        while let Some((parent, block)) = stack.pop() {
            let content = self.transform(&block.content);
            let pending = content.iter().any(Fragment::is_pending_ref);
            let written = pending.then(|| content.clone());

            let id = self
                .host
                .create_block(Some(&parents[parent]), Position::LastChild, content, BlockType::Text)
                .await?;
            created += 1;

            if let Some(uuid) = &block.id {
                self.uuid_map.insert(uuid.clone(), id);
            }
            self.set_properties(id, &block.properties).await?;
            if let Some(written) = written {
                log::debug!("block {id} has forward references; deferring");
                deferred.push(Deferred {
                    id,
                    raw: &block.content,
                    written,
                });
            }

            if !block.children.is_empty() {
                parents.push(self.snapshot(id).await?);
                let index = parents.len() - 1;
                stack.extend(block.children.iter().rev().map(|c| (index, c)));
            }
        }
        Ok(created)
    }

    /// Pass 2. Returns the number of blocks updated.
    async fn rewrite_deferred(&self, deferred: &[Deferred<'a>]) -> Result<usize, ImportError> {
        let mut rewritten = 0;
        for block in deferred {
            let content = self.transform(block.raw);
            if content == block.written {
                continue;
            }
            match self.host.update_block_content(block.id, content).await {
                Ok(()) => rewritten += 1,
                Err(e) if !e.is_fatal() => {
                    log::warn!("rewriting block {} failed: {e}", block.id);
                    self.host.notify(
                        NotifyLevel::Error,
                        &format!("Failed to update references in block {}: {e}", block.id),
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(rewritten)
    }

    fn transform(&self, raw: &str) -> Vec<Fragment> {
        let ctx = ResolveContext::new(self.graph, self.assets, &*self.uuid_map)
            .with_assets_prefix(self.assets_prefix);
        to_fragments(raw, &ctx)
    }

    async fn set_properties(&self, id: TargetId, properties: &Properties) -> Result<(), HostError> {
        if properties.is_empty() {
            return Ok(());
        }
        let properties = properties
            .iter()
            .map(|(name, value)| TargetProperty {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();
        self.host.set_block_properties(&[id], properties).await
    }

    /// A reference to a block created moments ago. Anything but a block is a
    /// broken host.
    async fn snapshot(&self, id: TargetId) -> Result<BlockSnapshot, HostError> {
        self.host
            .fetch_block(id)
            .await?
            .ok_or_else(|| HostError::invalid("fetch-block", format!("created block {id} is missing")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::host::MemoryHost;
    use crate::models::{PropertyValue, SourceFile};
    use crate::parsing::parse_file;
    use pretty_assertions::assert_eq;

    fn graph(files: &[(&str, &str)]) -> Graph {
        build_graph(
            files
                .iter()
                .map(|(path, content)| parse_file(&SourceFile::new(*path, *content))),
        )
    }

    async fn import(host: &MemoryHost, graph: &Graph, uuid_map: &mut UuidMap) -> BatchReport {
        let assets = AssetPathMap::new();
        let pages: Vec<&Page> = graph.pages.values().collect();
        BatchImporter::new(host, graph, &assets, uuid_map)
            .import_batch(&pages)
            .await
            .unwrap()
    }

    fn texts(blocks: &[crate::host::memory::StoredBlock]) -> Vec<String> {
        blocks
            .iter()
            .map(|b| match &b.content[..] {
                [Fragment::Text { v }] => v.clone(),
                other => format!("{other:?}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn creates_heading_and_tree_in_pre_order() {
        let graph = graph(&[("pages/Foo.md", "tags:: x\n- a\n  - b\n  - c\n- d")]);
        let host = MemoryHost::new();
        let report = import(&host, &graph, &mut UuidMap::new()).await;

        assert_eq!(report.pages_imported, 1);
        assert_eq!(report.blocks_created, 5);

        let roots = host.roots();
        assert_eq!(texts(&roots), vec!["Foo"]);
        assert_eq!(roots[0].kind, BlockType::Heading { level: 1 });
        assert_eq!(
            roots[0].properties.get("tags"),
            Some(&PropertyValue::Text("x".to_string()))
        );

        let top = host.children(roots[0].id);
        assert_eq!(texts(&top), vec!["a", "d"]);
        assert_eq!(texts(&host.children(top[0].id)), vec!["b", "c"]);
        assert_eq!(host.undo_groups(), 2);
    }

    #[tokio::test]
    async fn records_ids_and_block_properties() {
        let graph = graph(&[("Foo.md", "- a\n  id:: abc\n  status:: done")]);
        let host = MemoryHost::new();
        let mut uuid_map = UuidMap::new();
        import(&host, &graph, &mut uuid_map).await;

        let id = uuid_map["abc"];
        let block = host.block(id).unwrap();
        assert_eq!(texts(&[block.clone()]), vec!["a"]);
        assert_eq!(
            block.properties.get("status"),
            Some(&PropertyValue::Text("done".to_string()))
        );
        assert!(!block.properties.contains_key("id"));
    }

    #[tokio::test]
    async fn backward_reference_needs_no_rewrite() {
        let graph = graph(&[("Foo.md", "- target\n  id:: t\n- see ((t))")]);
        let host = MemoryHost::new();
        let mut uuid_map = UuidMap::new();
        let report = import(&host, &graph, &mut uuid_map).await;

        assert_eq!(report.refs_rewritten, 0);
        assert_eq!(host.counts().update_block_content, 0);
    }

    #[tokio::test]
    async fn forward_reference_is_rewritten_in_pass_two() {
        let graph = graph(&[("A.md", "- see ((t))"), ("B.md", "- target\n  id:: t")]);
        let host = MemoryHost::new();
        let mut uuid_map = UuidMap::new();
        let report = import(&host, &graph, &mut uuid_map).await;

        assert_eq!(report.refs_rewritten, 1);
        let page_a = host.roots()[0].id;
        let referring = &host.children(page_a)[0];
        assert!(referring.content.iter().any(|f| matches!(
            f,
            Fragment::BlockRef { target: Some(t), .. } if *t == uuid_map["t"]
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn delay_only_separates_pages() {
        let graph = graph(&[("A.md", "- a"), ("B.md", "- b"), ("C.md", "- c")]);
        let pages: Vec<&Page> = graph.pages.values().collect();
        let host = MemoryHost::new();
        let assets = AssetPathMap::new();
        let mut uuid_map = UuidMap::new();

        let start = tokio::time::Instant::now();
        let report = BatchImporter::new(&host, &graph, &assets, &mut uuid_map)
            .with_page_delay(Duration::from_millis(10))
            .import_batch(&pages)
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert_eq!(report.pages_imported, 3);
        assert!(elapsed >= Duration::from_millis(20), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(30), "elapsed {elapsed:?}");
    }

    #[tokio::test]
    async fn rejected_rewrite_is_reported_not_fatal() {
        let graph = graph(&[("A.md", "- see ((t))"), ("B.md", "- target\n  id:: t")]);
        let host = MemoryHost::new().fail_updates_containing("target");
        let report = import(&host, &graph, &mut UuidMap::new()).await;

        assert_eq!(report.pages_imported, 2);
        assert_eq!(report.refs_rewritten, 0);
        assert_eq!(host.counts().update_block_content, 1);
        assert!(host.notifications().iter().any(|(level, message)| {
            *level == NotifyLevel::Error && message.starts_with("Failed to update references")
        }));
    }

    #[tokio::test]
    async fn rejected_page_does_not_stop_the_batch() {
        let graph = graph(&[("A.md", "- ok"), ("B.md", "- BOOM"), ("C.md", "- fine")]);
        let host = MemoryHost::new().fail_creates_containing("BOOM");
        let report = import(&host, &graph, &mut UuidMap::new()).await;

        assert_eq!(report.pages_imported, 2);
        assert_eq!(report.pages_failed, 1);
        assert_eq!(texts(&host.roots()), vec!["A", "B", "C"]);
        assert!(host.notifications().iter().any(|(level, message)| {
            *level == NotifyLevel::Error && message.starts_with("Failed to import page B")
        }));
        assert_eq!(host.open_undo_groups(), 0);
    }

    #[tokio::test]
    async fn invalid_fetch_is_fatal() {
        let graph = graph(&[("A.md", "- a")]);
        let host = MemoryHost::new().lose_fetched_blocks();
        let assets = AssetPathMap::new();
        let mut uuid_map = UuidMap::new();
        let pages: Vec<&Page> = graph.pages.values().collect();

        let result = BatchImporter::new(&host, &graph, &assets, &mut uuid_map)
            .import_batch(&pages)
            .await;

        assert!(result.is_err_and(|e| e.is_fatal()));
        assert_eq!(host.undo_groups(), 1);
        assert_eq!(host.open_undo_groups(), 0);
    }

    #[tokio::test]
    async fn deep_nesting_does_not_recurse() {
        let content: String = (0..2_000)
            .map(|depth| format!("{}- level {depth}\n", "  ".repeat(depth)))
            .collect();
        let graph = graph(&[("Deep.md", content.as_str())]);
        let host = MemoryHost::new();
        let report = import(&host, &graph, &mut UuidMap::new()).await;
        assert_eq!(report.blocks_created, 2_001);
    }
}
