//! Error types for the rewrite library.
//!
//! This module defines all error types that can occur while tokenizing,
//! decoding, and rewriting a content stream. None of them are transient;
//! a failing page is rejected whole rather than partially rewritten.

/// Result type alias for rewrite operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during content-stream rewriting.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The tokenizer could not parse an operation at a specific byte offset
    #[error("Malformed content stream at byte {offset}: {reason}")]
    MalformedStream {
        /// Byte offset where parsing failed
        offset: usize,
        /// Reason for parse failure
        reason: String,
    },

    /// A byte code in the existing text has no Unicode mapping in its font
    #[error("Font '{font}' has no Unicode mapping for code 0x{code:04X}")]
    UnmappableCode {
        /// Name of the font being decoded
        font: String,
        /// The character code without a mapping
        code: u32,
    },

    /// A replacement character has no encoding in the font
    #[error("Character '{ch}' (U+{:04X}) cannot be encoded in font '{font}'", *ch as u32)]
    UnrepresentableCharacter {
        /// Name of the font being encoded into
        font: String,
        /// The character that has no code
        ch: char,
    },

    /// A `Tf` operand named a font absent from the page's resources
    #[error("Font resource '/{name}' not found")]
    FontNotFound {
        /// The resource name from the content stream
        name: String,
    },

    /// Font error (structural, e.g. text shown before any font selection)
    #[error("Font error: {0}")]
    Font(String),

    /// The search string was empty
    #[error("Search string must not be empty")]
    EmptySearch,

    /// A page rewrite failed; wraps the underlying error with the page index
    #[error("Rewrite of page {page} failed: {source}")]
    PageRewrite {
        /// Zero-based page index
        page: usize,
        /// The underlying failure
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap this error with the page it occurred on.
    pub fn on_page(self, page: usize) -> Error {
        Error::PageRewrite {
            page,
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_stream_error() {
        let err = Error::MalformedStream {
            offset: 1234,
            reason: "unterminated string".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("1234"));
        assert!(msg.contains("unterminated string"));
    }

    #[test]
    fn test_unmappable_code_error() {
        let err = Error::UnmappableCode {
            font: "F1".to_string(),
            code: 0x8140,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("F1"));
        assert!(msg.contains("8140"));
    }

    #[test]
    fn test_unrepresentable_character_error() {
        let err = Error::UnrepresentableCharacter {
            font: "F2".to_string(),
            ch: 'ß',
        };
        let msg = format!("{}", err);
        assert!(msg.contains("F2"));
        assert!(msg.contains('ß'));
        assert!(msg.contains("00DF"));
    }

    #[test]
    fn test_page_wrapping() {
        let err = Error::EmptySearch.on_page(3);
        let msg = format!("{}", err);
        assert!(msg.contains("page 3"));
        assert!(msg.contains("must not be empty"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
