//! ToUnicode CMap parser.
//!
//! CMap (Character Map) streams define the mapping from character codes to
//! Unicode text for composite fonts. A code is 1-4 bytes wide; the
//! `begincodespacerange` section declares which byte sequences form valid
//! codes of each width, and `bfchar`/`bfrange` sections map codes to
//! Unicode strings (ISO 32000-1:2008, Section 9.10.3).
//!
//! Codes are keyed by `(width, value)` because a 1-byte `<41>` and a
//! 2-byte `<0041>` are distinct codes that may map to different text.

use crate::error::Result;
use regex::Regex;
use std::collections::HashMap;

/// One codespace range: codes of `width` bytes whose every byte lies
/// between the corresponding `low` and `high` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodespaceRange {
    /// Code width in bytes (1-4)
    pub width: u8,
    /// Low bound, first `width` bytes significant
    pub low: [u8; 4],
    /// High bound, first `width` bytes significant
    pub high: [u8; 4],
}

impl CodespaceRange {
    /// Byte-wise containment test against the first `width` bytes of `input`.
    pub fn contains(&self, input: &[u8]) -> bool {
        let w = self.width as usize;
        if input.len() < w {
            return false;
        }
        (0..w).all(|i| self.low[i] <= input[i] && input[i] <= self.high[i])
    }
}

/// A parsed ToUnicode CMap: codespace ranges plus code-to-text mappings.
#[derive(Debug, Clone, Default)]
pub struct ToUnicodeCMap {
    codespace: Vec<CodespaceRange>,
    mappings: HashMap<(u8, u32), String>,
}

impl ToUnicodeCMap {
    /// Parse a decompressed ToUnicode CMap stream.
    pub fn parse(data: &[u8]) -> Result<ToUnicodeCMap> {
        let content = String::from_utf8_lossy(data);
        let mut cmap = ToUnicodeCMap::default();

        for section in extract_sections(&content, "begincodespacerange", "endcodespacerange") {
            for line in section.lines() {
                if let Some(range) = parse_codespace_line(line) {
                    log::trace!(
                        "codespace range: width {} bytes {:02X?}..{:02X?}",
                        range.width,
                        &range.low[..range.width as usize],
                        &range.high[..range.width as usize]
                    );
                    cmap.codespace.push(range);
                }
            }
        }

        // bfchar sections: <srcCode> <dstString>
        for section in extract_sections(&content, "beginbfchar", "endbfchar") {
            for line in section.lines() {
                if let Some((width, src, dst)) = parse_bfchar_line(line) {
                    log::trace!("bfchar: {}-byte 0x{:04X} -> {:?}", width, src, dst);
                    cmap.mappings.insert((width, src), dst);
                }
            }
        }

        // bfrange sections: <srcCodeLo> <srcCodeHi> <dstString>
        //               or: <srcCodeLo> <srcCodeHi> [<dst0> <dst1> ...]
        for section in extract_sections(&content, "beginbfrange", "endbfrange") {
            for line in section.lines() {
                if let Some(mappings) = parse_bfrange_line(line) {
                    log::trace!("bfrange: {} mappings parsed", mappings.len());
                    for (width, src, dst) in mappings {
                        cmap.mappings.insert((width, src), dst);
                    }
                }
            }
        }

        log::debug!(
            "parsed ToUnicode CMap: {} codespace ranges, {} mappings",
            cmap.codespace.len(),
            cmap.mappings.len()
        );
        Ok(cmap)
    }

    /// Declared codespace ranges, in source order.
    pub fn codespace(&self) -> &[CodespaceRange] {
        &self.codespace
    }

    /// Unicode text for a code of the given width.
    pub fn lookup(&self, width: u8, code: u32) -> Option<&str> {
        self.mappings.get(&(width, code)).map(String::as_str)
    }

    /// Iterate all `(width, code) -> text` mappings.
    pub fn mappings(&self) -> impl Iterator<Item = (u8, u32, &str)> {
        self.mappings.iter().map(|(&(w, c), s)| (w, c, s.as_str()))
    }
}

/// Extract sections between begin and end markers.
fn extract_sections<'a>(content: &'a str, begin: &str, end: &str) -> Vec<&'a str> {
    let mut sections = Vec::new();
    let mut remaining = content;

    while let Some(begin_pos) = remaining.find(begin) {
        let after_begin = &remaining[begin_pos + begin.len()..];
        if let Some(end_pos) = after_begin.find(end) {
            sections.push(&after_begin[..end_pos]);
            remaining = &after_begin[end_pos + end.len()..];
        } else {
            break;
        }
    }

    sections
}

/// Code width in bytes implied by a hex token's digit count.
fn hex_width(hex: &str) -> u8 {
    (hex.len().div_ceil(2)).min(4) as u8
}

/// Parse a codespace line: `<low> <high>`.
fn parse_codespace_line(line: &str) -> Option<CodespaceRange> {
    lazy_static::lazy_static! {
        static ref RE: Regex = Regex::new(r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>").unwrap();
    }

    RE.captures(line).and_then(|caps| {
        let low_hex = &caps[1];
        let high_hex = &caps[2];
        let width = hex_width(low_hex);
        if width == 0 || width != hex_width(high_hex) {
            log::warn!("codespace bounds of unequal width: {}", line.trim());
            return None;
        }

        let mut low = [0u8; 4];
        let mut high = [0u8; 4];
        let low_val = u32::from_str_radix(low_hex, 16).ok()?;
        let high_val = u32::from_str_radix(high_hex, 16).ok()?;
        for i in 0..width {
            let shift = 8 * (width - 1 - i) as u32;
            low[i as usize] = (low_val >> shift) as u8;
            high[i as usize] = (high_val >> shift) as u8;
        }

        Some(CodespaceRange { width, low, high })
    })
}

/// Decode a destination hex token into Unicode text.
///
/// A token of up to 4 digits is one code point; 8 digits may be a UTF-16
/// surrogate pair or two code points (a ligature); longer tokens split
/// into 4-digit UTF-16 units.
fn decode_dst_hex(dst_hex: &str) -> Option<String> {
    if dst_hex.len() <= 4 {
        let dst_code = u32::from_str_radix(dst_hex, 16).ok()?;
        return Some(char::from_u32(dst_code)?.to_string());
    }

    if dst_hex.len() == 8 {
        let dst_code = u32::from_str_radix(dst_hex, 16).ok()?;
        if let Some(decoded) = decode_utf16_surrogate_pair(dst_code) {
            return Some(decoded);
        }
    }

    // Multi-character mapping (ligatures): 4-digit UTF-16 units
    let units: Vec<u16> = (0..dst_hex.len())
        .step_by(4)
        .filter_map(|i| {
            let end = (i + 4).min(dst_hex.len());
            u16::from_str_radix(&dst_hex[i..end], 16).ok()
        })
        .collect();
    let result: String = char::decode_utf16(units.into_iter())
        .filter_map(|r| r.ok())
        .collect();
    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

/// Decode a UTF-16 surrogate pair packed into a 32-bit value.
///
/// Some CMaps write code points above U+FFFF as 8 hex digits holding the
/// high and low surrogate, e.g. `D835DF0C` for U+1D70C.
fn decode_utf16_surrogate_pair(value: u32) -> Option<String> {
    let high = (value >> 16) as u16;
    let low = (value & 0xFFFF) as u16;

    // High surrogate: 0xD800-0xDBFF, low surrogate: 0xDC00-0xDFFF
    if (0xD800..=0xDBFF).contains(&high) && (0xDC00..=0xDFFF).contains(&low) {
        let codepoint = 0x10000 + (((high & 0x3FF) as u32) << 10) + ((low & 0x3FF) as u32);
        char::from_u32(codepoint).map(|ch| ch.to_string())
    } else {
        None
    }
}

/// Parse a bfchar line: `<src> <dst>`.
fn parse_bfchar_line(line: &str) -> Option<(u8, u32, String)> {
    lazy_static::lazy_static! {
        static ref RE: Regex = Regex::new(r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>").unwrap();
    }

    RE.captures(line).and_then(|caps| {
        let src_hex = &caps[1];
        let width = hex_width(src_hex);
        let src = u32::from_str_radix(src_hex, 16).ok()?;
        let dst = decode_dst_hex(&caps[2])?;
        Some((width, src, dst))
    })
}

/// Parse a bfrange line in either the sequential or the array form.
fn parse_bfrange_line(line: &str) -> Option<Vec<(u8, u32, String)>> {
    lazy_static::lazy_static! {
        // <start> <end> <dst>
        static ref RE_SEQ: Regex = Regex::new(
            r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>"
        ).unwrap();
        // <start> <end> [<dst0> <dst1> ...]
        static ref RE_ARRAY: Regex = Regex::new(
            r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>\s*\[((?:\s*<[0-9A-Fa-f]+>\s*)+)\]"
        ).unwrap();
        static ref RE_HEX: Regex = Regex::new(r"<([0-9A-Fa-f]+)>").unwrap();
    }

    // Array form first so its bracket is not misread as a third hex token
    if let Some(caps) = RE_ARRAY.captures(line) {
        let width = hex_width(&caps[1]);
        let start = u32::from_str_radix(&caps[1], 16).ok()?;
        let end = u32::from_str_radix(&caps[2], 16).ok()?;
        let array_str = &caps[3];

        let dst_hexes: Vec<&str> = RE_HEX
            .captures_iter(array_str)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
            .collect();

        let range_size = (end.checked_sub(start)? as usize) + 1;
        if dst_hexes.len() != range_size {
            log::warn!(
                "bfrange array size mismatch: expected {} entries for 0x{:X}-0x{:X}, got {}",
                range_size,
                start,
                end,
                dst_hexes.len()
            );
        }

        let mut result = Vec::new();
        for (i, &dst_hex) in dst_hexes.iter().take(range_size).enumerate() {
            if let Some(dst) = decode_dst_hex(dst_hex) {
                result.push((width, start + i as u32, dst));
            }
        }
        return Some(result);
    }

    if let Some(caps) = RE_SEQ.captures(line) {
        let width = hex_width(&caps[1]);
        let start = u32::from_str_radix(&caps[1], 16).ok()?;
        let end = u32::from_str_radix(&caps[2], 16).ok()?;
        let dst_start = u32::from_str_radix(&caps[3], 16).ok()?;

        let mut result = Vec::new();
        let range_size = end.checked_sub(start)?.min(10000); // safety limit
        for i in 0..=range_size {
            let src = start + i;
            let dst_code = dst_start.wrapping_add(i);
            let text = if dst_code > 0xFFFF {
                decode_utf16_surrogate_pair(dst_code)
            } else {
                char::from_u32(dst_code).map(|ch| ch.to_string())
            };
            if let Some(text) = text {
                result.push((width, src, text));
            }
        }
        return Some(result);
    }

    None
}
