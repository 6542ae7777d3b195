pub mod page;
pub mod source_file;
pub mod target;

pub use page::{Block, Page, PreOrder, Properties, PropertyValue};
pub use source_file::SourceFile;
pub use target::{TargetId, UuidMap};
