//! An in-memory [`Host`] used for dry runs and tests.
//!
//! Implements every command faithfully enough to inspect what an import
//! would write: block tree, properties, uploaded assets, undo groups and
//! notifications. Failures can be injected per command.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;

use super::{
    AssetUpload, BlockSnapshot, BlockType, FailedUpload, Host, HostError, NotifyLevel, Position,
    TargetProperty, UndoGroupOptions, UploadOutcome, UploadedAsset,
};
use crate::models::{PropertyValue, TargetId};
use crate::transform::Fragment;

/// A block as stored by the in-memory host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredBlock {
    pub id: TargetId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<TargetId>,
    pub kind: BlockType,
    pub content: Vec<Fragment>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, PropertyValue>,
    #[serde(skip)]
    pub children: Vec<TargetId>,
}

/// A nested view of the stored document, for export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentNode {
    #[serde(flatten)]
    pub block: StoredBlock,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocumentNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredAsset {
    pub path: String,
    pub source_path: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Counts of every write command received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommandCounts {
    pub create_block: usize,
    pub update_block_content: usize,
    pub set_block_properties: usize,
    pub fetch_block: usize,
    pub upload_assets: usize,
}

/// Which commands should fail, for exercising error paths.
#[derive(Debug, Default, Clone)]
struct Failures {
    /// Reject a create whose text contains this marker.
    create_text: Option<String>,
    /// Reject an update whose text contains this marker.
    update_text: Option<String>,
    /// Answer `fetch_block` with `None` for existing blocks.
    fetch_missing: bool,
    /// Report uploads with these names as failed.
    upload_names: Vec<String>,
    /// Reject every upload call outright.
    upload_unavailable: bool,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    blocks: BTreeMap<TargetId, StoredBlock>,
    roots: Vec<TargetId>,
    assets: Vec<StoredAsset>,
    notifications: Vec<(NotifyLevel, String)>,
    undo_groups: usize,
    open_groups: usize,
    counts: CommandCounts,
}

#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<State>,
    failures: Failures,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects `create_block` when any text fragment contains `marker`.
    pub fn fail_creates_containing(mut self, marker: impl Into<String>) -> Self {
        self.failures.create_text = Some(marker.into());
        self
    }

    /// Rejects `update_block_content` when any fragment text contains `marker`.
    pub fn fail_updates_containing(mut self, marker: impl Into<String>) -> Self {
        self.failures.update_text = Some(marker.into());
        self
    }

    /// Makes `fetch_block` return `None`, an invalid answer for a block that
    /// was just created.
    pub fn lose_fetched_blocks(mut self) -> Self {
        self.failures.fetch_missing = true;
        self
    }

    /// Reports uploads of `name` as failed.
    pub fn fail_upload_of(mut self, name: impl Into<String>) -> Self {
        self.failures.upload_names.push(name.into());
        self
    }

    /// Makes every `upload_assets` call fail as if the host went away.
    pub fn uploads_unavailable(mut self) -> Self {
        self.failures.upload_unavailable = true;
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn block(&self, id: TargetId) -> Option<StoredBlock> {
        self.state().blocks.get(&id).cloned()
    }

    /// Top-level blocks in document order.
    pub fn roots(&self) -> Vec<StoredBlock> {
        let state = self.state();
        state
            .roots
            .iter()
            .filter_map(|id| state.blocks.get(id).cloned())
            .collect()
    }

    pub fn children(&self, id: TargetId) -> Vec<StoredBlock> {
        let state = self.state();
        state
            .blocks
            .get(&id)
            .map(|b| {
                b.children
                    .iter()
                    .filter_map(|c| state.blocks.get(c).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn block_count(&self) -> usize {
        self.state().blocks.len()
    }

    /// The whole document as a tree, top-level blocks first.
    pub fn document(&self) -> Vec<DocumentNode> {
        let state = self.state();
        let mut nodes = Vec::with_capacity(state.roots.len());
        for root in &state.roots {
            if let Some(node) = build_node(&state, *root) {
                nodes.push(node);
            }
        }
        nodes
    }

    pub fn assets(&self) -> Vec<StoredAsset> {
        self.state().assets.clone()
    }

    pub fn notifications(&self) -> Vec<(NotifyLevel, String)> {
        self.state().notifications.clone()
    }

    /// Closed undo groups.
    pub fn undo_groups(&self) -> usize {
        self.state().undo_groups
    }

    pub fn open_undo_groups(&self) -> usize {
        self.state().open_groups
    }

    pub fn counts(&self) -> CommandCounts {
        self.state().counts
    }
}

/// Iterative so deep trees cannot overflow the stack.
fn build_node(state: &State, id: TargetId) -> Option<DocumentNode> {
    // Post-order: children are finished before their parent is assembled.
    let mut finished: BTreeMap<TargetId, DocumentNode> = BTreeMap::new();
    let mut stack = vec![(id, false)];
    while let Some((current, expanded)) = stack.pop() {
        let block = state.blocks.get(&current)?;
        if expanded {
            let children = block
                .children
                .iter()
                .filter_map(|c| finished.remove(c))
                .collect();
            finished.insert(
                current,
                DocumentNode {
                    block: block.clone(),
                    children,
                },
            );
        } else {
            stack.push((current, true));
            stack.extend(block.children.iter().map(|c| (*c, false)));
        }
    }
    finished.remove(&id)
}

/// `assets/<name>`, with a numeric suffix when that path is already taken.
fn unique_asset_path(stored: &[StoredAsset], name: &str) -> String {
    let taken = |path: &str| stored.iter().any(|a| a.path == path);
    let path = format!("assets/{name}");
    if !taken(&path) {
        return path;
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.contains('/') => (stem, Some(ext)),
        _ => (name, None),
    };
    (1..)
        .map(|n| match ext {
            Some(ext) => format!("assets/{stem}_{n}.{ext}"),
            None => format!("assets/{stem}_{n}"),
        })
        .find(|candidate| !taken(candidate))
        .unwrap_or(path)
}

fn text_contains(content: &[Fragment], marker: &str) -> bool {
    content.iter().any(|f| match f {
        Fragment::Text { v } | Fragment::Code { v } | Fragment::Link { v, .. } => {
            v.contains(marker)
        }
        Fragment::PageRef { v, .. } | Fragment::BlockRef { v, .. } => v.contains(marker),
        Fragment::Image { .. } => false,
    })
}

#[async_trait]
impl Host for MemoryHost {
    async fn create_block(
        &self,
        parent: Option<&BlockSnapshot>,
        position: Position,
        content: Vec<Fragment>,
        kind: BlockType,
    ) -> Result<TargetId, HostError> {
        const COMMAND: &str = "create-block";
        let mut state = self.state();
        state.counts.create_block += 1;

        if let Some(marker) = &self.failures.create_text
            && text_contains(&content, marker)
        {
            return Err(HostError::rejected(COMMAND, format!("refused content {marker:?}")));
        }

        let reference = parent.map(|p| p.id);
        if let Some(r) = reference
            && !state.blocks.contains_key(&r)
        {
            return Err(HostError::rejected(COMMAND, format!("no block {r}")));
        }

        // Resolve (parent, index) for the new block.
        let (new_parent, index) = match (position, reference) {
            (Position::FirstChild, p) => (p, Some(0)),
            (Position::LastChild, p) => (p, None),
            (Position::Before | Position::After, None) => {
                return Err(HostError::rejected(
                    COMMAND,
                    "sibling position needs a reference block",
                ));
            }
            (Position::Before | Position::After, Some(sibling)) => {
                let owner = state.blocks.get(&sibling).and_then(|b| b.parent);
                let siblings = match owner {
                    Some(o) => state.blocks.get(&o).map(|b| &b.children),
                    None => Some(&state.roots),
                };
                let at = siblings
                    .and_then(|s| s.iter().position(|c| *c == sibling))
                    .unwrap_or(0);
                let offset = usize::from(position == Position::After);
                (owner, Some(at + offset))
            }
        };

        state.next_id += 1;
        let id = TargetId(state.next_id);
        state.blocks.insert(
            id,
            StoredBlock {
                id,
                parent: new_parent,
                kind,
                content,
                properties: IndexMap::new(),
                children: vec![],
            },
        );

        let siblings = match new_parent {
            Some(p) => match state.blocks.get_mut(&p) {
                Some(b) => &mut b.children,
                None => return Err(HostError::invalid(COMMAND, format!("lost parent {p}"))),
            },
            None => &mut state.roots,
        };
        match index {
            Some(i) => siblings.insert(i.min(siblings.len()), id),
            None => siblings.push(id),
        }
        Ok(id)
    }

    async fn update_block_content(
        &self,
        id: TargetId,
        content: Vec<Fragment>,
    ) -> Result<(), HostError> {
        const COMMAND: &str = "update-block-content";
        let mut state = self.state();
        state.counts.update_block_content += 1;

        if let Some(marker) = &self.failures.update_text
            && text_contains(&content, marker)
        {
            return Err(HostError::rejected(COMMAND, format!("refused content {marker:?}")));
        }
        match state.blocks.get_mut(&id) {
            Some(block) => {
                block.content = content;
                Ok(())
            }
            None => Err(HostError::rejected(COMMAND, format!("no block {id}"))),
        }
    }

    async fn set_block_properties(
        &self,
        ids: &[TargetId],
        properties: Vec<TargetProperty>,
    ) -> Result<(), HostError> {
        const COMMAND: &str = "set-block-properties";
        let mut state = self.state();
        state.counts.set_block_properties += 1;

        if let Some(missing) = ids.iter().find(|id| !state.blocks.contains_key(id)) {
            return Err(HostError::rejected(COMMAND, format!("no block {missing}")));
        }
        for id in ids {
            if let Some(block) = state.blocks.get_mut(id) {
                for property in &properties {
                    block
                        .properties
                        .insert(property.name.clone(), property.value.clone());
                }
            }
        }
        Ok(())
    }

    async fn begin_undo_group(&self, _options: UndoGroupOptions) -> Result<(), HostError> {
        self.state().open_groups += 1;
        Ok(())
    }

    async fn end_undo_group(&self) -> Result<(), HostError> {
        let mut state = self.state();
        if state.open_groups == 0 {
            return Err(HostError::invalid("run-as-one-undo-group", "no open group"));
        }
        state.open_groups -= 1;
        state.undo_groups += 1;
        Ok(())
    }

    async fn fetch_block(&self, id: TargetId) -> Result<Option<BlockSnapshot>, HostError> {
        let mut state = self.state();
        state.counts.fetch_block += 1;
        if self.failures.fetch_missing {
            return Ok(None);
        }
        Ok(state.blocks.get(&id).map(|b| BlockSnapshot {
            id: b.id,
            parent: b.parent,
            children: b.children.clone(),
        }))
    }

    async fn upload_assets(&self, files: Vec<AssetUpload>) -> Result<UploadOutcome, HostError> {
        let mut state = self.state();
        state.counts.upload_assets += 1;
        if self.failures.upload_unavailable {
            return Err(HostError::Unavailable("asset store offline".to_string()));
        }

        let mut outcome = UploadOutcome::default();
        for (original_index, file) in files.into_iter().enumerate() {
            if self.failures.upload_names.contains(&file.name) {
                outcome.failed.push(FailedUpload {
                    original_index,
                    reason: "upload refused".to_string(),
                });
                continue;
            }
            let path = unique_asset_path(&state.assets, &file.name);
            state.assets.push(StoredAsset {
                path: path.clone(),
                source_path: file.source_path,
                bytes: file.bytes,
            });
            outcome.uploaded.push(UploadedAsset {
                original_index,
                path,
            });
        }
        Ok(outcome)
    }

    fn notify(&self, level: NotifyLevel, message: &str) {
        self.state().notifications.push((level, message.to_string()));
    }
}
