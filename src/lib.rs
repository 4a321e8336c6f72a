// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::match_like_matches_macro)]
#![allow(clippy::needless_range_loop)]

//! # pdf_rewrite
//!
//! Search and replace literal text inside PDF content streams, losslessly.
//!
//! The library takes a page's decompressed content stream, finds every
//! occurrence of a search string in the text its show-text operators paint
//! (even when the string is split across several `Tj`/`TJ` operations or
//! hidden behind a custom font encoding), and splices in a replacement.
//! Everything a match does not touch is emitted byte-for-byte.
//!
//! ## Pipeline
//!
//! 1. [`content::parse_operations`] tokenizes the stream into operations,
//!    each carrying its source byte span.
//! 2. [`rewrite::assembler`] decodes show-text operands through the page's
//!    [fonts](fonts::Font) and groups them into text runs.
//! 3. [`rewrite::matcher`] finds literal, non-overlapping occurrences.
//! 4. [`rewrite::rebuilder`] re-encodes the replacement and rebuilds only
//!    the operands a match landed in.
//! 5. [`content::serialize_operations`] writes the stream back, copying
//!    untouched operations verbatim.
//!
//! ## Quick Start
//!
//! ```
//! use pdf_rewrite::fonts::{BaseEncoding, Font, FontArena, SimpleEncoding};
//! use pdf_rewrite::{RewriteResult, rewrite_content_stream};
//! use std::collections::HashMap;
//!
//! # fn main() -> pdf_rewrite::Result<()> {
//! let mut arena = FontArena::new();
//! let f1 = arena.insert(Font::simple(
//!     "F1",
//!     SimpleEncoding::new(BaseEncoding::WinAnsi, &[]),
//! ));
//! let mut fonts = HashMap::new();
//! fonts.insert("F1".to_string(), f1);
//!
//! let stream = b"BT /F1 12 Tf (Inkscape 1.1.2 created this) Tj ET";
//! let result = rewrite_content_stream(stream, &fonts, &arena, "1.1.2", "pleasure")?;
//! assert_eq!(
//!     result,
//!     RewriteResult::Rewritten(b"BT /F1 12 Tf (Inkscape pleasure created this) Tj ET".to_vec())
//! );
//! # Ok(())
//! # }
//! ```
//!
//! Obtaining the decompressed stream and the page's font resources (and
//! writing the result back into a document) is the caller's business; this
//! crate owns only the stream-level rewrite.

pub mod content;
pub mod error;
pub mod fonts;
pub mod lexer;
pub mod object;
pub mod rewrite;

pub use content::{Operation, parse_operations, serialize_operations};
pub use error::{Error, Result};
pub use fonts::{Font, FontArena, FontHandle};
pub use object::{Object, StringFormat};
pub use rewrite::{RewriteResult, rewrite_content_stream, rewrite_page};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
