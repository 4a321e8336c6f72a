//! Content stream parser.
//!
//! Parses a page's decompressed content stream into a sequence of
//! operations. Content streams use postfix notation where operands come
//! before the operator:
//!
//! ```text
//! BT
//!   /F1 12 Tf
//!   100 700 Td
//!   (Hello, World!) Tj
//! ET
//! ```
//!
//! Every operation records the byte span it was parsed from, so operations
//! the rewrite never touches can later be re-emitted byte-for-byte. Parsing
//! is strict: a rewriter that re-serializes the stream cannot afford to
//! guess past malformed bytes, so any unrecognized operand syntax, an
//! unterminated string, or an unbalanced array fails with
//! [`Error::MalformedStream`](crate::error::Error::MalformedStream).

use crate::error::{Error, Result};
use crate::lexer::{Token, is_whitespace, token};
use crate::object::{Object, StringFormat};
use std::collections::HashMap;
use std::ops::Range;

/// One operation: an operator word plus its preceding operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Operator word (e.g. "Tj", "TJ", "Tf", "BT")
    pub operator: String,
    /// Operands in source order
    pub operands: Vec<Object>,
    /// Source byte span from the first operand byte to the end of the
    /// operator word (inline images span through their `EI`)
    pub raw: Range<usize>,
}

impl Operation {
    /// Check whether this operation paints text.
    pub fn is_show_text(&self) -> bool {
        matches!(self.operator.as_str(), "Tj" | "TJ" | "'" | "\"")
    }
}

/// Parse a content stream into a sequence of operations.
///
/// # Errors
///
/// Returns [`Error::MalformedStream`](crate::error::Error::MalformedStream)
/// if the stream contains an unterminated string, an unbalanced array or
/// dictionary, or operand syntax that cannot be recognized.
pub fn parse_operations(data: &[u8]) -> Result<Vec<Operation>> {
    let mut operations = Vec::new();
    let mut input = data;

    loop {
        input = skip_ws_slice(input);
        if input.is_empty() {
            break;
        }

        let op_start = offset_of(data, input);
        let (rest, op) = parse_one_operation(data, input, op_start)?;
        operations.push(op);
        input = rest;
    }

    log::trace!("parsed {} operations from {} bytes", operations.len(), data.len());
    Ok(operations)
}

/// Parse a single operation (operands then operator) starting at `op_start`.
fn parse_one_operation<'a>(
    data: &'a [u8],
    input: &'a [u8],
    op_start: usize,
) -> Result<(&'a [u8], Operation)> {
    let mut operands = Vec::new();
    let mut remaining = input;

    loop {
        let before = skip_ws_slice(remaining);
        if before.is_empty() {
            return Err(malformed(data, before, "operands without an operator"));
        }
        let tok_offset = offset_of(data, before);

        let (rest, tok) = next_token(data, before)?;
        match tok {
            Token::Operator(name) => {
                if name == "BI" {
                    // Inline image: opaque BI ... ID <binary> EI operation
                    let (rest, end) = skip_inline_image(data, rest)?;
                    return Ok((
                        rest,
                        Operation {
                            operator: "BI".to_string(),
                            operands,
                            raw: op_start..end,
                        },
                    ));
                }
                let end = offset_of(data, rest);
                return Ok((
                    rest,
                    Operation {
                        operator: name.to_string(),
                        operands,
                        raw: op_start..end,
                    },
                ));
            },
            _ => {
                let (rest, obj) = finish_object(data, before, tok, rest, tok_offset)?;
                operands.push(obj);
                remaining = rest;
            },
        }
    }
}

/// Turn a non-operator token into an operand object, recursing into arrays
/// and dictionaries.
fn finish_object<'a>(
    data: &'a [u8],
    token_input: &'a [u8],
    tok: Token<'a>,
    rest: &'a [u8],
    tok_offset: usize,
) -> Result<(&'a [u8], Object)> {
    match tok {
        Token::Null => Ok((rest, Object::Null)),
        Token::True => Ok((rest, Object::Boolean(true))),
        Token::False => Ok((rest, Object::Boolean(false))),
        Token::Integer(i) => Ok((rest, Object::Integer(i))),
        Token::Real(r) => Ok((rest, Object::Real(r))),
        Token::Name(name) => Ok((rest, Object::Name(name))),
        Token::LiteralString(raw) => {
            let decoded = decode_literal_string_escapes(raw);
            Ok((rest, Object::String(decoded, StringFormat::Literal)))
        },
        Token::HexString(raw) => {
            let decoded = decode_hex(raw)
                .map_err(|reason| Error::MalformedStream { offset: tok_offset, reason })?;
            Ok((rest, Object::String(decoded, StringFormat::Hex)))
        },
        Token::ArrayStart => parse_array(data, rest),
        Token::DictStart => parse_dictionary(data, rest),
        Token::ArrayEnd | Token::DictEnd | Token::Operator(_) => {
            Err(malformed(data, token_input, "unexpected token in operand position"))
        },
    }
}

/// Parse array items after `[` until the matching `]`.
fn parse_array<'a>(data: &'a [u8], input: &'a [u8]) -> Result<(&'a [u8], Object)> {
    let mut items = Vec::new();
    let mut remaining = input;

    loop {
        let before = skip_ws_slice(remaining);
        if before.is_empty() {
            return Err(malformed(data, before, "unbalanced array"));
        }
        let tok_offset = offset_of(data, before);
        let (rest, tok) = next_token(data, before)?;
        if tok == Token::ArrayEnd {
            return Ok((rest, Object::Array(items)));
        }
        let (rest, obj) = finish_object(data, before, tok, rest, tok_offset)?;
        items.push(obj);
        remaining = rest;
    }
}

/// Parse dictionary entries after `<<` until the matching `>>`.
fn parse_dictionary<'a>(data: &'a [u8], input: &'a [u8]) -> Result<(&'a [u8], Object)> {
    let mut dict = HashMap::new();
    let mut remaining = input;

    loop {
        let before = skip_ws_slice(remaining);
        if before.is_empty() {
            return Err(malformed(data, before, "unbalanced dictionary"));
        }
        let (rest, tok) = next_token(data, before)?;
        match tok {
            Token::DictEnd => return Ok((rest, Object::Dictionary(dict))),
            Token::Name(key) => {
                let value_input = skip_ws_slice(rest);
                let tok_offset = offset_of(data, value_input);
                let (rest, value_tok) = next_token(data, value_input)?;
                let (rest, value) = finish_object(data, value_input, value_tok, rest, tok_offset)?;
                dict.insert(key, value);
                remaining = rest;
            },
            _ => return Err(malformed(data, before, "dictionary key must be a name")),
        }
    }
}

/// Skip the binary payload of an inline image, returning the remaining
/// input and the byte offset just past `EI`.
///
/// The bytes for "EI" can occur inside the image data itself, so `EI` only
/// counts when preceded by whitespace and followed by whitespace or end of
/// stream (ISO 32000-1:2008, Section 8.9.7).
fn skip_inline_image<'a>(data: &'a [u8], input: &'a [u8]) -> Result<(&'a [u8], usize)> {
    let bytes = input;
    let mut i = 0;
    while i + 2 < bytes.len() {
        if is_whitespace(bytes[i]) && &bytes[i + 1..i + 3] == b"EI" {
            let after = i + 3;
            if after == bytes.len() || is_whitespace(bytes[after]) {
                let rest = &bytes[after..];
                return Ok((rest, offset_of(data, rest)));
            }
        }
        i += 1;
    }
    Err(malformed(data, input, "inline image without EI terminator"))
}

/// Run the lexer and map its failures into `MalformedStream`.
fn next_token<'a>(data: &'a [u8], input: &'a [u8]) -> Result<(&'a [u8], Token<'a>)> {
    token(input).map_err(|e| {
        let reason = match e {
            nom::Err::Failure(_) => "unterminated string".to_string(),
            _ => "unrecognized operand syntax".to_string(),
        };
        malformed_with(data, input, reason)
    })
}

fn malformed(data: &[u8], at: &[u8], reason: &str) -> Error {
    malformed_with(data, at, reason.to_string())
}

fn malformed_with(data: &[u8], at: &[u8], reason: String) -> Error {
    Error::MalformedStream {
        offset: offset_of(data, at),
        reason,
    }
}

/// Byte offset of a suffix slice within the original buffer.
fn offset_of(data: &[u8], rest: &[u8]) -> usize {
    data.len() - rest.len()
}

/// Skip whitespace and comments without token machinery.
fn skip_ws_slice(input: &[u8]) -> &[u8] {
    let mut rest = input;
    loop {
        let start = rest;
        while !rest.is_empty() && is_whitespace(rest[0]) {
            rest = &rest[1..];
        }
        if !rest.is_empty() && rest[0] == b'%' {
            while !rest.is_empty() && rest[0] != b'\r' && rest[0] != b'\n' {
                rest = &rest[1..];
            }
        }
        if rest.len() == start.len() {
            return rest;
        }
    }
}

/// Decode escape sequences in PDF literal strings.
///
/// Literal strings support escape sequences per ISO 32000-1:2008,
/// Section 7.3.4.2: `\n`, `\r`, `\t`, `\b`, `\f`, `\(`, `\)`, `\\`,
/// `\ddd` (octal, 1-3 digits), and `\<newline>` line continuation.
/// Unknown escapes keep the backslash literally.
pub fn decode_literal_string_escapes(raw: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        if raw[i] == b'\\' && i + 1 < raw.len() {
            match raw[i + 1] {
                b'n' => {
                    result.push(b'\n');
                    i += 2;
                },
                b'r' => {
                    result.push(b'\r');
                    i += 2;
                },
                b't' => {
                    result.push(b'\t');
                    i += 2;
                },
                b'b' => {
                    result.push(8);
                    i += 2;
                },
                b'f' => {
                    result.push(12);
                    i += 2;
                },
                b'(' => {
                    result.push(b'(');
                    i += 2;
                },
                b')' => {
                    result.push(b')');
                    i += 2;
                },
                b'\\' => {
                    result.push(b'\\');
                    i += 2;
                },
                b'\n' => {
                    i += 2;
                },
                b'\r' => {
                    i += 2;
                    if i < raw.len() && raw[i] == b'\n' {
                        i += 1;
                    }
                },
                c if c.is_ascii_digit() && c < b'8' => {
                    let start = i + 1;
                    let mut octal_value = 0u32;
                    let mut octal_len = 0;

                    for j in 0..3 {
                        if start + j < raw.len() {
                            let digit = raw[start + j];
                            if (b'0'..b'8').contains(&digit) {
                                octal_value = octal_value * 8 + (digit - b'0') as u32;
                                octal_len += 1;
                            } else {
                                break;
                            }
                        } else {
                            break;
                        }
                    }

                    result.push((octal_value & 0xFF) as u8);
                    i += 1 + octal_len;
                },
                _ => {
                    result.push(b'\\');
                    i += 1;
                },
            }
        } else {
            result.push(raw[i]);
            i += 1;
        }
    }

    result
}

/// Decode a hex string to bytes.
///
/// Whitespace is ignored; an odd number of digits pads the final digit
/// with 0 per the PDF syntax rules.
pub fn decode_hex(hex_bytes: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let digits: Vec<u8> = hex_bytes
        .iter()
        .filter(|&&c| !c.is_ascii_whitespace())
        .copied()
        .collect();

    let mut result = Vec::with_capacity(digits.len() / 2 + 1);
    for chunk in digits.chunks(2) {
        let hi = hex_digit(chunk[0]).ok_or_else(|| format!("invalid hex digit 0x{:02X}", chunk[0]))?;
        let lo = if chunk.len() == 2 {
            hex_digit(chunk[1]).ok_or_else(|| format!("invalid hex digit 0x{:02X}", chunk[1]))?
        } else {
            0
        };
        result.push((hi << 4) | lo);
    }
    Ok(result)
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_text() {
        let stream = b"BT /F1 12 Tf 100 700 Td (Hello) Tj ET";
        let ops = parse_operations(stream).unwrap();
        assert_eq!(ops.len(), 5);

        assert_eq!(ops[0].operator, "BT");
        assert_eq!(ops[1].operator, "Tf");
        assert_eq!(ops[1].operands[0], Object::Name("F1".to_string()));
        assert_eq!(ops[1].operands[1], Object::Integer(12));
        assert_eq!(ops[2].operator, "Td");
        assert_eq!(ops[3].operator, "Tj");
        assert_eq!(
            ops[3].operands[0],
            Object::String(b"Hello".to_vec(), StringFormat::Literal)
        );
        assert_eq!(ops[4].operator, "ET");
    }

    #[test]
    fn test_raw_spans_cover_source() {
        let stream = b"BT  (Hi) Tj ET";
        let ops = parse_operations(stream).unwrap();
        assert_eq!(&stream[ops[0].raw.clone()], b"BT");
        assert_eq!(&stream[ops[1].raw.clone()], b"(Hi) Tj");
        assert_eq!(&stream[ops[2].raw.clone()], b"ET");
    }

    #[test]
    fn test_parse_tj_array() {
        let stream = b"[(Hel) -100 (lo)] TJ";
        let ops = parse_operations(stream).unwrap();
        assert_eq!(ops.len(), 1);
        let arr = ops[0].operands[0].as_array().unwrap();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr[0].as_string(), Some(&b"Hel"[..]));
        assert_eq!(arr[1], Object::Integer(-100));
        assert_eq!(arr[2].as_string(), Some(&b"lo"[..]));
    }

    #[test]
    fn test_parse_hex_string_operand() {
        let stream = b"<00480065> Tj";
        let ops = parse_operations(stream).unwrap();
        assert_eq!(
            ops[0].operands[0],
            Object::String(vec![0x00, 0x48, 0x00, 0x65], StringFormat::Hex)
        );
    }

    #[test]
    fn test_parse_quote_operators() {
        let stream = b"(Text1) ' 1 0.5 (Text2) \"";
        let ops = parse_operations(stream).unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].operator, "'");
        assert_eq!(ops[1].operator, "\"");
        assert_eq!(ops[1].operands.len(), 3);
    }

    #[test]
    fn test_parse_bdc_dictionary_operand() {
        let stream = b"/Span << /MCID 0 >> BDC (x) Tj EMC";
        let ops = parse_operations(stream).unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].operator, "BDC");
        match &ops[0].operands[1] {
            Object::Dictionary(d) => assert_eq!(d["MCID"], Object::Integer(0)),
            other => panic!("expected dictionary, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_inline_image_opaque() {
        let stream = b"q BI /W 2 /H 2 ID \x00\x01EI\x02 EI Q";
        let ops = parse_operations(stream).unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[1].operator, "BI");
        // The spurious EI inside the binary data is not a terminator
        assert!(String::from_utf8_lossy(&stream[ops[1].raw.clone()]).ends_with("EI"));
        assert_eq!(ops[2].operator, "Q");
    }

    #[test]
    fn test_unterminated_string_fails() {
        let err = parse_operations(b"BT (oops Tj ET").unwrap_err();
        match err {
            crate::error::Error::MalformedStream { reason, .. } => {
                assert!(reason.contains("unterminated"));
            },
            other => panic!("expected MalformedStream, got {:?}", other),
        }
    }

    #[test]
    fn test_unbalanced_array_fails() {
        let err = parse_operations(b"[(Hello) -2 ").unwrap_err();
        match err {
            crate::error::Error::MalformedStream { reason, .. } => {
                assert!(reason.contains("array"));
            },
            other => panic!("expected MalformedStream, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_operands_fail() {
        assert!(parse_operations(b"BT 12 34").is_err());
    }

    #[test]
    fn test_parse_empty_stream() {
        assert!(parse_operations(b"").unwrap().is_empty());
        assert!(parse_operations(b"  \n\t ").unwrap().is_empty());
    }

    #[test]
    fn test_comments_are_skipped() {
        let ops = parse_operations(b"% setup\nBT ET").unwrap();
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn test_escape_decoding() {
        assert_eq!(decode_literal_string_escapes(b"a\\(b\\)"), b"a(b)");
        assert_eq!(decode_literal_string_escapes(b"\\101"), b"A");
        assert_eq!(decode_literal_string_escapes(b"line\\\ncont"), b"linecont");
        assert_eq!(decode_literal_string_escapes(b"\\q"), b"\\q");
    }

    #[test]
    fn test_decode_hex_padding() {
        assert_eq!(decode_hex(b"48656C6C6F").unwrap(), b"Hello");
        assert_eq!(decode_hex(b"48 65").unwrap(), vec![0x48, 0x65]);
        assert_eq!(decode_hex(b"4").unwrap(), vec![0x40]);
    }
}
