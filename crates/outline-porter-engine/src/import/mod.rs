//! # Batch import
//!
//! Drives parsed pages into a [`Host`](crate::host::Host) in fixed-size
//! batches. Each batch runs two undo groups: pass 1 creates every block,
//! pass 2 rewrites the blocks whose references could only be resolved once
//! the whole batch existed.

mod batch;
mod error;
mod run;

pub use batch::{BatchImporter, BatchReport};
pub use error::ImportError;
pub use run::{ImportOptions, ImportReport, RunOutcome, import_files, run_import};
