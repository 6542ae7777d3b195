//! # Inline Parsing
//!
//! Cursor-based inline parsing of a single block's raw text.
//!
//! ## Architecture
//!
//! One left-to-right scan with an explicit cursor. At every position the
//! recognisers run in a fixed precedence order; the first that finds a closed
//! construct consumes it, otherwise the byte becomes part of a text run.
//! Because nothing is rewritten in place, overlapping syntaxes can never be
//! transformed twice.
//!
//! ## Modules
//!
//! - **`types`**: `InlineNode` enum (spans only, no resolution)
//! - **`kinds`**: Inline-specific types with owned delimiters
//! - **`cursor`**: `Cursor` for byte-by-byte scanning
//! - **`parser`**: `parse_inline()` main entry point with `try_parse_*` helpers
//!
//! ## Raw Zone Precedence
//!
//! Code spans come first: `` `((abc))` `` parses as a single CodeSpan,
//! not as text containing a block reference.

pub mod cursor;
pub mod kinds;
pub mod parser;
pub mod types;

pub use parser::parse_inline;
pub use types::InlineNode;
