//! Operand value types for content-stream operations.
//!
//! Content-stream operands are a small subset of the full PDF object model:
//! numbers, byte-strings, names, arrays, and (for marked-content operators)
//! dictionaries. Strings remember whether they were spelled as a literal
//! `(...)` or hex `<...>` so a rewritten operand keeps its source family.

use std::collections::HashMap;

/// How a string operand was spelled in the source stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    /// Parenthesized literal string: `(Hello)`
    Literal,
    /// Hexadecimal string: `<48656C6C6F>`
    Hex,
}

/// A content-stream operand value.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// String (byte array) with its source spelling
    String(Vec<u8>, StringFormat),
    /// Name (starting with /)
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary (key-value pairs), e.g. a BDC property list
    Dictionary(HashMap<String, Object>),
}

impl Object {
    /// Get the type name of this object (without data).
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::String(..) => "String",
            Object::Name(_) => "Name",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
        }
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to cast to a number, widening integers to `f64`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to string (bytes).
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::String(s, _) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Check if this object is a number (integer or real).
    pub fn is_number(&self) -> bool {
        matches!(self, Object::Integer(_) | Object::Real(_))
    }

    /// Serialize this object in content-stream syntax onto `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Object::Null => out.extend_from_slice(b"null"),
            Object::Boolean(true) => out.extend_from_slice(b"true"),
            Object::Boolean(false) => out.extend_from_slice(b"false"),
            Object::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
            Object::Real(r) => write_real(*r, out),
            Object::String(bytes, StringFormat::Literal) => write_literal_string(bytes, out),
            Object::String(bytes, StringFormat::Hex) => write_hex_string(bytes, out),
            Object::Name(name) => write_name(name, out),
            Object::Array(items) => {
                out.push(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(b' ');
                    }
                    item.write_to(out);
                }
                out.push(b']');
            },
            Object::Dictionary(dict) => {
                out.extend_from_slice(b"<<");
                // Keys are sorted so serialization is deterministic
                let mut keys: Vec<&String> = dict.keys().collect();
                keys.sort();
                for key in keys {
                    write_name(key, out);
                    out.push(b' ');
                    dict[key].write_to(out);
                }
                out.extend_from_slice(b">>");
            },
        }
    }
}

/// Write a real number without an exponent and without trailing zeros.
fn write_real(r: f64, out: &mut Vec<u8>) {
    if r == r.trunc() && r.abs() < 1e15 {
        out.extend_from_slice(format!("{:.1}", r).as_bytes());
    } else {
        out.extend_from_slice(r.to_string().as_bytes());
    }
}

/// Write a literal string with the escaping the PDF syntax requires.
///
/// Balanced parentheses would not strictly need escaping, but escaping every
/// parenthesis keeps the writer independent of the string's contents.
fn write_literal_string(bytes: &[u8], out: &mut Vec<u8>) {
    out.push(b'(');
    for &b in bytes {
        match b {
            b'(' => out.extend_from_slice(b"\\("),
            b')' => out.extend_from_slice(b"\\)"),
            b'\\' => out.extend_from_slice(b"\\\\"),
            0x0A => out.extend_from_slice(b"\\n"),
            0x0D => out.extend_from_slice(b"\\r"),
            0x09 => out.extend_from_slice(b"\\t"),
            0x08 => out.extend_from_slice(b"\\b"),
            0x0C => out.extend_from_slice(b"\\f"),
            b => out.push(b),
        }
    }
    out.push(b')');
}

/// Write a hex string: uppercase pairs, no interior whitespace.
fn write_hex_string(bytes: &[u8], out: &mut Vec<u8>) {
    out.push(b'<');
    for b in bytes {
        out.extend_from_slice(format!("{:02X}", b).as_bytes());
    }
    out.push(b'>');
}

/// Write a name, applying `#XX` escapes to delimiter and whitespace bytes.
fn write_name(name: &str, out: &mut Vec<u8>) {
    out.push(b'/');
    for &b in name.as_bytes() {
        let needs_escape = matches!(
            b,
            b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C |
            b'/' | b'%' | b'#' |
            b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}'
        ) || !(0x21..=0x7E).contains(&b);
        if needs_escape {
            out.extend_from_slice(format!("#{:02X}", b).as_bytes());
        } else {
            out.push(b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serialized(obj: &Object) -> Vec<u8> {
        let mut out = Vec::new();
        obj.write_to(&mut out);
        out
    }

    #[test]
    fn test_object_accessors() {
        assert_eq!(Object::Integer(42).as_integer(), Some(42));
        assert_eq!(Object::Integer(42).as_number(), Some(42.0));
        assert_eq!(Object::Real(1.5).as_number(), Some(1.5));
        assert_eq!(Object::Name("F1".to_string()).as_name(), Some("F1"));
        assert!(Object::Null.as_integer().is_none());
        assert!(Object::Real(0.0).is_number());
        assert!(!Object::Name("x".to_string()).is_number());
    }

    #[test]
    fn test_write_integer() {
        assert_eq!(serialized(&Object::Integer(-120)), b"-120");
    }

    #[test]
    fn test_write_real_trims() {
        assert_eq!(serialized(&Object::Real(1.5)), b"1.5");
        assert_eq!(serialized(&Object::Real(-0.002)), b"-0.002");
        assert_eq!(serialized(&Object::Real(3.0)), b"3.0");
    }

    #[test]
    fn test_write_literal_string_escapes() {
        let obj = Object::String(b"a(b)c\\".to_vec(), StringFormat::Literal);
        assert_eq!(serialized(&obj), b"(a\\(b\\)c\\\\)");

        let obj = Object::String(b"line\nbreak".to_vec(), StringFormat::Literal);
        assert_eq!(serialized(&obj), b"(line\\nbreak)");
    }

    #[test]
    fn test_write_literal_string_high_bytes_raw() {
        let obj = Object::String(vec![0xE9, 0x41], StringFormat::Literal);
        assert_eq!(serialized(&obj), &[b'(', 0xE9, 0x41, b')']);
    }

    #[test]
    fn test_write_hex_string() {
        let obj = Object::String(vec![0x00, 0x48, 0xFF], StringFormat::Hex);
        assert_eq!(serialized(&obj), b"<0048FF>");
    }

    #[test]
    fn test_write_name_escapes() {
        assert_eq!(serialized(&Object::Name("F1".to_string())), b"/F1");
        assert_eq!(serialized(&Object::Name("A B".to_string())), b"/A#20B");
    }

    #[test]
    fn test_write_array() {
        let obj = Object::Array(vec![
            Object::String(b"Hi".to_vec(), StringFormat::Literal),
            Object::Integer(-100),
            Object::String(b"there".to_vec(), StringFormat::Literal),
        ]);
        assert_eq!(serialized(&obj), b"[(Hi) -100 (there)]");
    }

    #[test]
    fn test_write_empty_array() {
        assert_eq!(serialized(&Object::Array(vec![])), b"[]");
    }

    #[test]
    fn test_type_name() {
        assert_eq!(Object::Null.type_name(), "Null");
        assert_eq!(
            Object::String(vec![], StringFormat::Hex).type_name(),
            "String"
        );
    }
}
