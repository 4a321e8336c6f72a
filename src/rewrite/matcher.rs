//! Literal matching over a run's decoded text.
//!
//! Single pass, left to right, non-overlapping: after a match the scan
//! resumes at the match end, so freshly inserted replacement text is never
//! re-scanned and a replacement containing the search string cannot
//! recurse. Comparison is exact codepoint equality; no case folding or
//! Unicode normalization.

use super::assembler::CharOrigin;

/// A match as a half-open codepoint range into the run's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// First matched codepoint index
    pub start: usize,
    /// One past the last matched codepoint index
    pub end: usize,
}

/// Find all non-overlapping occurrences of `needle` in `text`.
///
/// `origins` runs parallel to `text`. A candidate whose boundary would
/// fall inside a group of characters sharing one source span (a
/// multi-character mapping such as a ligature) is skipped, since those
/// bytes cannot be split; the scan continues one character later.
pub fn find_matches(text: &[char], needle: &[char], origins: &[CharOrigin]) -> Vec<Match> {
    debug_assert_eq!(text.len(), origins.len());
    let mut matches = Vec::new();
    if needle.is_empty() || needle.len() > text.len() {
        return matches;
    }

    let mut i = 0;
    while i + needle.len() <= text.len() {
        if text[i..i + needle.len()] != *needle {
            i += 1;
            continue;
        }

        let end = i + needle.len();
        if splits_shared_span(origins, i) || splits_shared_span(origins, end) {
            log::warn!(
                "skipping match at codepoint {}: boundary falls inside a multi-character mapping",
                i
            );
            i += 1;
            continue;
        }

        matches.push(Match { start: i, end });
        i = end;
    }

    matches
}

/// True when the boundary before codepoint `index` would separate two
/// characters decoded from the same source bytes.
fn splits_shared_span(origins: &[CharOrigin], index: usize) -> bool {
    if index == 0 || index >= origins.len() {
        return false;
    }
    origins[index - 1] == origins[index]
}
