//! # Inline Kinds
//!
//! Inline-specific types that own their syntax delimiters.
//!
//! ## Types
//!
//! - **`CodeSpan`**: `TICK` - raw zone that suppresses other parsing
//! - **`Embed`** / **`BlockRef`**: `{{embed ...}}` and `((id))`
//! - **`PageLink`**: `[[name]]` and `#[[name]]`
//! - **`Tag`**: bare `#tag` plus its token boundary rules
//! - **`MdLink`**: `[text](target)`, `![alt](target)` and `{:...}` attributes
//!
//! The parser calls these constants; it never hardcodes delimiters.

pub mod block_ref;
pub mod code_span;
pub mod md_link;
pub mod page_link;
pub mod tag;

pub use block_ref::{BlockRef, Embed};
pub use code_span::CodeSpan;
pub use md_link::{MdLink, is_image_path, parse_dimensions};
pub use page_link::PageLink;
pub use tag::Tag;
