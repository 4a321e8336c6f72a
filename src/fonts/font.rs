//! Font objects and the decode/encode capability.
//!
//! A [`Font`] pairs a resource name with one of two closed encoding
//! variants: simple fonts decode one byte per character through a 256-entry
//! table, composite fonts decode variable-width codes (1-4 bytes, chosen by
//! codespace ranges) through a ToUnicode CMap. Both variants expose the
//! same capability: `decode` bytes to Unicode text with per-character
//! source byte spans, and `encode` replacement text back to bytes.
//!
//! Fonts are immutable once built and live in a [`FontArena`], addressed
//! by copyable [`FontHandle`]s; their tables are never extended to make a
//! replacement fit.

use super::cmap::ToUnicodeCMap;
use super::encoding::SimpleEncoding;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::ops::Range;

/// Composite (CID) font encoding: codespace-driven code widths plus a
/// ToUnicode mapping and its reverse for re-encoding.
#[derive(Debug, Clone)]
pub struct CompositeEncoding {
    cmap: ToUnicodeCMap,
    /// Single-character targets only; `(width, code)` with the lowest code
    /// winning ties. Characters that appear only inside multi-character
    /// (ligature) targets cannot be produced by `encode`.
    reverse: HashMap<char, (u8, u32)>,
}

impl CompositeEncoding {
    /// Build from a parsed CMap.
    pub fn new(cmap: ToUnicodeCMap) -> CompositeEncoding {
        let mut reverse: HashMap<char, (u8, u32)> = HashMap::new();
        for (width, code, text) in cmap.mappings() {
            let mut chars = text.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                let key = (width, code);
                reverse
                    .entry(c)
                    .and_modify(|existing| {
                        if key < *existing {
                            *existing = key;
                        }
                    })
                    .or_insert(key);
            }
        }
        CompositeEncoding { cmap, reverse }
    }

    /// Width of the next code in `bytes`, per the codespace ranges.
    ///
    /// Absent ranges default to 2-byte codes (the Identity-H convention).
    fn next_code_width(&self, bytes: &[u8]) -> Option<u8> {
        let ranges = self.cmap.codespace();
        if ranges.is_empty() {
            return Some(2);
        }
        ranges.iter().find(|r| r.contains(bytes)).map(|r| r.width)
    }
}

/// Encoding variant of a font. Closed set: exactly these two kinds exist.
#[derive(Debug, Clone)]
pub enum FontEncoding {
    /// One byte per character through a 256-entry table
    Simple(SimpleEncoding),
    /// Variable-width codes through a ToUnicode CMap
    Composite(CompositeEncoding),
}

/// A font as seen by the rewrite pipeline: a name for diagnostics plus its
/// encoding tables.
#[derive(Debug, Clone)]
pub struct Font {
    /// Resource name (e.g. "F1"), used in error messages
    pub name: String,
    /// Decode/encode tables
    pub encoding: FontEncoding,
}

impl Font {
    /// Build a simple font.
    pub fn simple(name: impl Into<String>, encoding: SimpleEncoding) -> Font {
        Font {
            name: name.into(),
            encoding: FontEncoding::Simple(encoding),
        }
    }

    /// Build a composite font from a parsed ToUnicode CMap.
    pub fn composite(name: impl Into<String>, cmap: ToUnicodeCMap) -> Font {
        Font {
            name: name.into(),
            encoding: FontEncoding::Composite(CompositeEncoding::new(cmap)),
        }
    }

    /// Decode a string operand's bytes to Unicode text.
    ///
    /// Returns the text plus one byte span into `bytes` per `char` of the
    /// text. Several chars share one span when a single code maps to a
    /// multi-character target (a ligature expansion).
    ///
    /// # Errors
    ///
    /// [`Error::UnmappableCode`](crate::error::Error::UnmappableCode) when a
    /// code has no mapping; partial results are never returned.
    pub fn decode(&self, bytes: &[u8]) -> Result<(String, Vec<Range<usize>>)> {
        match &self.encoding {
            FontEncoding::Simple(enc) => {
                let mut text = String::with_capacity(bytes.len());
                let mut spans = Vec::with_capacity(bytes.len());
                for (i, &code) in bytes.iter().enumerate() {
                    let c = enc.decode_code(code).ok_or(Error::UnmappableCode {
                        font: self.name.clone(),
                        code: code as u32,
                    })?;
                    text.push(c);
                    spans.push(i..i + 1);
                }
                Ok((text, spans))
            },
            FontEncoding::Composite(enc) => {
                let mut text = String::new();
                let mut spans = Vec::new();
                let mut pos = 0;
                while pos < bytes.len() {
                    let rest = &bytes[pos..];
                    let width = enc.next_code_width(rest).ok_or(Error::UnmappableCode {
                        font: self.name.clone(),
                        code: rest[0] as u32,
                    })? as usize;
                    if rest.len() < width {
                        return Err(Error::MalformedStream {
                            offset: pos,
                            reason: format!(
                                "string ends inside a {}-byte character code",
                                width
                            ),
                        });
                    }
                    let code = rest[..width].iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
                    let mapped =
                        enc.cmap.lookup(width as u8, code).ok_or(Error::UnmappableCode {
                            font: self.name.clone(),
                            code,
                        })?;
                    for c in mapped.chars() {
                        text.push(c);
                        spans.push(pos..pos + width);
                    }
                    pos += width;
                }
                Ok((text, spans))
            },
        }
    }

    /// Encode replacement text into this font's byte codes.
    ///
    /// Only codes the font already maps are used; the tables are never
    /// extended. When several codes decode to the same character the
    /// lowest code wins, so `decode(encode(text)) == text`.
    ///
    /// # Errors
    ///
    /// [`Error::UnrepresentableCharacter`](crate::error::Error::UnrepresentableCharacter)
    /// for the first character no code produces.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        match &self.encoding {
            FontEncoding::Simple(enc) => text
                .chars()
                .map(|ch| {
                    enc.encode_char(ch).ok_or(Error::UnrepresentableCharacter {
                        font: self.name.clone(),
                        ch,
                    })
                })
                .collect(),
            FontEncoding::Composite(enc) => {
                let mut out = Vec::new();
                for ch in text.chars() {
                    let &(width, code) =
                        enc.reverse.get(&ch).ok_or(Error::UnrepresentableCharacter {
                            font: self.name.clone(),
                            ch,
                        })?;
                    for i in (0..width).rev() {
                        out.push((code >> (8 * i as u32)) as u8);
                    }
                }
                Ok(out)
            },
        }
    }
}

/// Copyable handle into a [`FontArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontHandle(usize);

/// Owner of all fonts used by a rewrite. Fonts are inserted once and only
/// read afterwards; handles stay valid for the arena's lifetime.
#[derive(Debug, Default)]
pub struct FontArena {
    fonts: Vec<Font>,
}

impl FontArena {
    /// Create an empty arena.
    pub fn new() -> FontArena {
        FontArena::default()
    }

    /// Add a font, returning its handle.
    pub fn insert(&mut self, font: Font) -> FontHandle {
        self.fonts.push(font);
        FontHandle(self.fonts.len() - 1)
    }

    /// Look up a font by handle.
    pub fn get(&self, handle: FontHandle) -> &Font {
        &self.fonts[handle.0]
    }
}
