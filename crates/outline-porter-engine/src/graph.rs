//! Aggregates parsed pages into one graph with a global block-id index.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::models::{Block, Page};

/// Every page of the import plus an index of blocks that declare an id.
#[derive(Debug, Default)]
pub struct Graph {
    /// Keyed by page name, in insertion (file discovery) order.
    pub pages: IndexMap<String, Page>,
    /// Block id to its page name and child-index path within that page.
    blocks: HashMap<String, (String, Vec<usize>)>,
}

/// Builds the graph. Pages with a duplicate name replace the earlier page;
/// duplicate block ids resolve to the last one registered.
pub fn build_graph(pages: impl IntoIterator<Item = Page>) -> Graph {
    let mut graph = Graph::default();
    for page in pages {
        if graph.pages.contains_key(&page.name) {
            log::warn!("duplicate page name {:?}; keeping the later file", page.name);
        }
        // Keep first-seen position so ordering stays discovery order.
        graph.pages.insert(page.name.clone(), page);
    }
    graph.reindex();
    graph
}

impl Graph {
    /// Looks up a block by its explicit id.
    pub fn block(&self, id: &str) -> Option<&Block> {
        let (page, path) = self.blocks.get(id)?;
        let (first, rest) = path.split_first()?;
        let mut block = self.pages.get(page)?.blocks.get(*first)?;
        for index in rest {
            block = block.children.get(*index)?;
        }
        Some(block)
    }

    pub fn page(&self, name: &str) -> Option<&Page> {
        self.pages.get(name)
    }

    /// Number of indexed block ids.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn reindex(&mut self) {
        self.blocks.clear();
        for (name, page) in &self.pages {
            // Pre-order with an explicit stack; nesting depth is unbounded.
            let mut stack: Vec<(Vec<usize>, &Block)> = page
                .blocks
                .iter()
                .enumerate()
                .rev()
                .map(|(i, b)| (vec![i], b))
                .collect();
            while let Some((path, block)) = stack.pop() {
                for (i, child) in block.children.iter().enumerate().rev() {
                    let mut child_path = path.clone();
                    child_path.push(i);
                    stack.push((child_path, child));
                }
                if let Some(id) = &block.id
                    && let Some((previous, _)) =
                        self.blocks.insert(id.clone(), (name.clone(), path))
                {
                    log::debug!("block id {id} declared again; {previous} loses it to {name}");
                }
            }
        }
    }
}
