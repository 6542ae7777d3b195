//! # Host command surface
//!
//! The target knowledge base is only ever reached through [`Host`]: a narrow
//! set of create/update/query commands plus fire-and-forget notifications.
//! The importer never reads and rewrites the host's document state directly.
//!
//! All commands are async so hosts backed by an RPC bridge and hosts living
//! in memory look the same to the importer.

pub mod memory;

use std::future::Future;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{PropertyValue, TargetId};
use crate::transform::Fragment;

pub use memory::MemoryHost;

/// Where a new block goes relative to the reference block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Position {
    Before,
    After,
    FirstChild,
    LastChild,
}

/// Type descriptor passed along with a create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BlockType {
    Heading { level: u8 },
    Text,
}

/// A stable reference to an existing target block, as returned by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSnapshot {
    pub id: TargetId,
    pub parent: Option<TargetId>,
    pub children: Vec<TargetId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetProperty {
    pub name: String,
    pub value: PropertyValue,
}

/// Options for one undo group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoGroupOptions {
    pub undoable: bool,
    pub top_level: bool,
}

impl Default for UndoGroupOptions {
    fn default() -> Self {
        Self {
            undoable: true,
            top_level: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyLevel {
    Info,
    Success,
    Warn,
    Error,
}

/// A local file handed to the host's asset store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUpload {
    /// Link target as written in the source text.
    pub source_path: String,
    /// Path below the assets directory, e.g. `diagrams/x.png`.
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadOutcome {
    pub uploaded: Vec<UploadedAsset>,
    pub failed: Vec<FailedUpload>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    /// Index into the submitted upload list.
    pub original_index: usize,
    /// Where the host stored the file.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUpload {
    pub original_index: usize,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum HostError {
    /// The host refused a single command. Scoped to the item being written.
    #[error("{command} was rejected: {message}")]
    Rejected {
        command: &'static str,
        message: String,
    },
    /// The host answered with something structurally wrong.
    #[error("{command} returned an invalid result: {message}")]
    InvalidResponse {
        command: &'static str,
        message: String,
    },
    /// The command surface itself is gone.
    #[error("host unavailable: {0}")]
    Unavailable(String),
}

impl HostError {
    pub fn rejected(command: &'static str, message: impl Into<String>) -> Self {
        Self::Rejected {
            command,
            message: message.into(),
        }
    }

    pub fn invalid(command: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            command,
            message: message.into(),
        }
    }

    /// Fatal errors abort the whole run; the rest stay local to a page or item.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, HostError::Rejected { .. })
    }
}

/// The create/update/query commands the importer consumes.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the importer itself only ever
/// issues one command at a time.
#[async_trait]
pub trait Host: Send + Sync {
    /// Creates a block and returns its new id. A `parent` of `None` with a
    /// child position targets the top level of the document.
    async fn create_block(
        &self,
        parent: Option<&BlockSnapshot>,
        position: Position,
        content: Vec<Fragment>,
        kind: BlockType,
    ) -> Result<TargetId, HostError>;

    async fn update_block_content(
        &self,
        id: TargetId,
        content: Vec<Fragment>,
    ) -> Result<(), HostError>;

    async fn set_block_properties(
        &self,
        ids: &[TargetId],
        properties: Vec<TargetProperty>,
    ) -> Result<(), HostError>;

    /// Opens an undo group; every write until [`Host::end_undo_group`] is one
    /// undo step.
    async fn begin_undo_group(&self, options: UndoGroupOptions) -> Result<(), HostError>;

    async fn end_undo_group(&self) -> Result<(), HostError>;

    async fn fetch_block(&self, id: TargetId) -> Result<Option<BlockSnapshot>, HostError>;

    async fn upload_assets(&self, files: Vec<AssetUpload>) -> Result<UploadOutcome, HostError>;

    /// Fire-and-forget user feedback.
    fn notify(&self, level: NotifyLevel, message: &str);
}

/// Runs `body` as one undo step.
///
/// The group is closed even when `body` fails; the body's error wins over an
/// error from closing.
pub async fn run_as_one_undo_group<H, F, T, E>(
    host: &H,
    options: UndoGroupOptions,
    body: F,
) -> Result<T, E>
where
    H: Host + ?Sized,
    F: Future<Output = Result<T, E>>,
    E: From<HostError>,
{
    host.begin_undo_group(options).await?;
    let result = body.await;
    let closed = host.end_undo_group().await;
    let value = result?;
    closed?;
    Ok(value)
}
