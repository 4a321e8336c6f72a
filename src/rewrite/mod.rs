//! The rewrite pipeline: parse, assemble, match, re-encode, rebuild.
//!
//! [`rewrite_content_stream`] is the crate's main entry point. It finds
//! every occurrence of a literal search string in the text a page's
//! content stream paints and replaces it, touching only the operations a
//! match lands in. [`rewrite_page`] is the same operation with page
//! attribution on errors for callers iterating a document.

pub mod assembler;
pub mod matcher;
pub mod rebuilder;

pub use assembler::{CharOrigin, TextRun};
pub use matcher::Match;

use crate::content::{parse_operations, serialize_operations};
use crate::error::{Error, Result};
use crate::fonts::{FontArena, FontHandle};
use assembler::assemble_runs;
use matcher::find_matches;
use rebuilder::apply_matches;
use std::collections::HashMap;

/// Outcome of a rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteResult {
    /// The search string did not occur; the input stream is the output
    Unchanged,
    /// At least one occurrence was replaced
    Rewritten(Vec<u8>),
}

impl RewriteResult {
    /// The output bytes, borrowing the input when nothing changed.
    pub fn into_bytes(self, input: &[u8]) -> Vec<u8> {
        match self {
            RewriteResult::Unchanged => input.to_vec(),
            RewriteResult::Rewritten(bytes) => bytes,
        }
    }
}

/// Replace every occurrence of `search` in the text painted by a content
/// stream.
///
/// `fonts` maps the page's font resource names to handles into `arena`.
/// Replacement text is encoded with the font each match was decoded under;
/// the rewrite is all-or-nothing, so any failure leaves no partial output.
///
/// # Errors
///
/// - [`Error::EmptySearch`](crate::error::Error::EmptySearch) for an empty
///   search string.
/// - Parse, font resolution, decode and encode errors from the stages,
///   unchanged.
pub fn rewrite_content_stream(
    data: &[u8],
    fonts: &HashMap<String, FontHandle>,
    arena: &FontArena,
    search: &str,
    replacement: &str,
) -> Result<RewriteResult> {
    if search.is_empty() {
        return Err(Error::EmptySearch);
    }

    let mut operations = parse_operations(data)?;
    let runs = assemble_runs(&operations, fonts, arena)?;
    let needle: Vec<char> = search.chars().collect();

    let mut modified = vec![false; operations.len()];
    let mut total_matches = 0;
    for run in &runs {
        let matches = find_matches(&run.text, &needle, &run.origins);
        if matches.is_empty() {
            continue;
        }
        // Encode only for fonts that actually hold a match, so a font that
        // cannot represent the replacement never aborts an unrelated page
        let encoded = arena.get(run.font).encode(replacement)?;
        apply_matches(&mut operations, &mut modified, run, &matches, &encoded)?;
        total_matches += matches.len();
    }

    if total_matches == 0 {
        log::debug!("search text {:?} not found", search);
        return Ok(RewriteResult::Unchanged);
    }

    log::debug!(
        "replaced {} occurrence(s) of {:?} with {:?}",
        total_matches,
        search,
        replacement
    );
    Ok(RewriteResult::Rewritten(serialize_operations(
        data, &operations, &modified,
    )))
}

/// [`rewrite_content_stream`] with page attribution: any failure is
/// wrapped in [`Error::PageRewrite`](crate::error::Error::PageRewrite)
/// carrying the zero-based page index.
pub fn rewrite_page(
    page: usize,
    data: &[u8],
    fonts: &HashMap<String, FontHandle>,
    arena: &FontArena,
    search: &str,
    replacement: &str,
) -> Result<RewriteResult> {
    rewrite_content_stream(data, fonts, arena, search, replacement)
        .map_err(|e| e.on_page(page))
}
