//! # Parsing
//!
//! Two layers, both infallible:
//!
//! - **`line`** + **`page`**: raw file text into a [`Page`](crate::models::Page)
//!   tree. Lines are classified one at a time, then a level stack builds the
//!   block hierarchy.
//! - **`inline`**: one block's raw text into spans of typed syntax.

pub mod inline;
pub mod line;
pub mod page;
pub mod span;

pub use line::{IndentStyle, LineKind, OutlineLineClassifier};
pub use page::{PageBuilder, ParseOptions, parse_file, parse_file_with};
pub use span::Span;
