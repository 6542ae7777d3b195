//! Moves an outliner's Markdown notes into a block-based knowledge base.
//!
//! Files are parsed into pages of nested blocks, merged into one graph, then
//! written to a [`Host`] in batches, rewriting inline syntax and local
//! attachments along the way.

pub mod assets;
pub mod graph;
pub mod host;
pub mod import;
pub mod io;
pub mod models;
pub mod parsing;
pub mod transform;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use assets::{AssetPathMap, AssetSource, FsAssetSource};
pub use graph::{Graph, build_graph};
pub use host::{Host, HostError, MemoryHost, NotifyLevel};
pub use import::{ImportError, ImportOptions, ImportReport, RunOutcome, import_files, run_import};
pub use io::{IoError, ScanOptions};
pub use models::{Block, Page, PropertyValue, SourceFile, TargetId, UuidMap};
pub use parsing::{ParseOptions, parse_file, parse_file_with};
pub use transform::{Fragment, ResolveContext, to_fragments};
