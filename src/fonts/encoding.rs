//! Simple font encodings.
//!
//! Simple fonts map single byte codes to glyphs through a 256-entry table:
//! a named base encoding (WinAnsiEncoding, MacRomanEncoding,
//! StandardEncoding) optionally patched by `/Differences` glyph-name
//! overrides (ISO 32000-1:2008, Section 9.6.6). This module builds the
//! decode table and its reverse for re-encoding replacement text.

use std::collections::HashMap;

/// Named base encoding of a simple font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseEncoding {
    /// StandardEncoding (Adobe standard Latin)
    Standard,
    /// WinAnsiEncoding (Windows-1252)
    WinAnsi,
    /// MacRomanEncoding
    MacRoman,
}

impl BaseEncoding {
    /// Resolve an encoding name from a font dictionary.
    pub fn from_name(name: &str) -> Option<BaseEncoding> {
        match name {
            "StandardEncoding" => Some(BaseEncoding::Standard),
            "WinAnsiEncoding" => Some(BaseEncoding::WinAnsi),
            "MacRomanEncoding" => Some(BaseEncoding::MacRoman),
            _ => None,
        }
    }
}

/// Look up a byte code in a base encoding table.
pub fn base_encoding_lookup(base: BaseEncoding, code: u8) -> Option<char> {
    // ASCII printable range is shared by all three encodings
    if (32..=126).contains(&code) {
        return Some(code as char);
    }

    match base {
        BaseEncoding::WinAnsi => {
            // Extended range based on Windows-1252
            let unicode = match code {
                0x80 => '\u{20AC}', // Euro sign
                0x82 => '\u{201A}', // Single low-9 quotation mark
                0x83 => '\u{0192}', // Latin small letter f with hook
                0x84 => '\u{201E}', // Double low-9 quotation mark
                0x85 => '\u{2026}', // Horizontal ellipsis
                0x86 => '\u{2020}', // Dagger
                0x87 => '\u{2021}', // Double dagger
                0x88 => '\u{02C6}', // Modifier letter circumflex accent
                0x89 => '\u{2030}', // Per mille sign
                0x8A => '\u{0160}', // Latin capital letter S with caron
                0x8B => '\u{2039}', // Single left-pointing angle quotation mark
                0x8C => '\u{0152}', // Latin capital ligature OE
                0x8E => '\u{017D}', // Latin capital letter Z with caron
                0x91 => '\u{2018}', // Left single quotation mark
                0x92 => '\u{2019}', // Right single quotation mark
                0x93 => '\u{201C}', // Left double quotation mark
                0x94 => '\u{201D}', // Right double quotation mark
                0x95 => '\u{2022}', // Bullet
                0x96 => '\u{2013}', // En dash
                0x97 => '\u{2014}', // Em dash
                0x98 => '\u{02DC}', // Small tilde
                0x99 => '\u{2122}', // Trade mark sign
                0x9A => '\u{0161}', // Latin small letter s with caron
                0x9B => '\u{203A}', // Single right-pointing angle quotation mark
                0x9C => '\u{0153}', // Latin small ligature oe
                0x9E => '\u{017E}', // Latin small letter z with caron
                0x9F => '\u{0178}', // Latin capital letter Y with diaeresis
                // 0xA0-0xFF: direct mapping to Unicode (ISO-8859-1)
                _ if code >= 0xA0 => code as char,
                _ => return None,
            };
            Some(unicode)
        },
        BaseEncoding::Standard => {
            // Extended range uses ISO Latin-1 for most characters
            if code >= 0xA0 {
                Some(code as char)
            } else {
                None
            }
        },
        BaseEncoding::MacRoman => {
            // MacRoman extended characters
            // PDF Spec: ISO 32000-1:2008, Annex D.2
            let unicode = match code {
                0x80 => '\u{00C4}', // Adieresis
                0x81 => '\u{00C5}', // Aring
                0x82 => '\u{00C7}', // Ccedilla
                0x83 => '\u{00C9}', // Eacute
                0x84 => '\u{00D1}', // Ntilde
                0x85 => '\u{00D6}', // Odieresis
                0x86 => '\u{00DC}', // Udieresis
                0x87 => '\u{00E1}', // aacute
                0x88 => '\u{00E0}', // agrave
                0x89 => '\u{00E2}', // acircumflex
                0x8A => '\u{00E4}', // adieresis
                0x8B => '\u{00E3}', // atilde
                0x8C => '\u{00E5}', // aring
                0x8D => '\u{00E7}', // ccedilla
                0x8E => '\u{00E9}', // eacute
                0x8F => '\u{00E8}', // egrave
                0x90 => '\u{00EA}', // ecircumflex
                0x91 => '\u{00EB}', // edieresis
                0x92 => '\u{00ED}', // iacute
                0x93 => '\u{00EC}', // igrave
                0x94 => '\u{00EE}', // icircumflex
                0x95 => '\u{00EF}', // idieresis
                0x96 => '\u{00F1}', // ntilde
                0x97 => '\u{00F3}', // oacute
                0x98 => '\u{00F2}', // ograve
                0x99 => '\u{00F4}', // ocircumflex
                0x9A => '\u{00F6}', // odieresis
                0x9B => '\u{00F5}', // otilde
                0x9C => '\u{00FA}', // uacute
                0x9D => '\u{00F9}', // ugrave
                0x9E => '\u{00FB}', // ucircumflex
                0x9F => '\u{00FC}', // udieresis
                0xA5 => '\u{2022}', // bullet
                0xAA => '\u{2122}', // trademark
                0xC4 => '\u{0192}', // florin
                0xC9 => '\u{2026}', // ellipsis
                0xCA => '\u{00A0}', // nonbreaking space
                0xD0 => '\u{2013}', // endash
                0xD1 => '\u{2014}', // emdash
                0xD2 => '\u{201C}', // quotedblleft
                0xD3 => '\u{201D}', // quotedblright
                0xD4 => '\u{2018}', // quoteleft
                0xD5 => '\u{2019}', // quoteright
                0xD6 => '\u{00F7}', // divide
                0xDE => '\u{FB01}', // fi ligature
                0xDF => '\u{FB02}', // fl ligature
                0xE0 => '\u{2020}', // dagger
                0xE1 => '\u{00B0}', // degree
                _ => return None,
            };
            Some(unicode)
        },
    }
}

/// Resolve a glyph name to its Unicode character.
///
/// Covers common Adobe Glyph List names plus the `uniXXXX` and `uXXXX`
/// forms used by font subsets (ISO 32000-1:2008, Section 9.10.2).
pub fn glyph_name_to_unicode(glyph_name: &str) -> Option<char> {
    // Single-character names map to themselves ("a" -> 'a', "A" -> 'A')
    if glyph_name.len() == 1 {
        let c = glyph_name.chars().next()?;
        if c.is_ascii_alphanumeric() {
            return Some(c);
        }
    }

    // Common Adobe Glyph List names
    if let Some(c) = agl_lookup(glyph_name) {
        return Some(c);
    }

    // "uniXXXX" format (e.g. uni0041 -> A)
    if glyph_name.starts_with("uni") && glyph_name.len() == 7 {
        if let Ok(code_point) = u32::from_str_radix(&glyph_name[3..], 16) {
            if let Some(c) = char::from_u32(code_point) {
                return Some(c);
            }
        }
    }

    // "uXXXX" format (e.g. u0041 -> A)
    if glyph_name.starts_with('u') && glyph_name.len() >= 5 {
        if let Ok(code_point) = u32::from_str_radix(&glyph_name[1..], 16) {
            if let Some(c) = char::from_u32(code_point) {
                return Some(c);
            }
        }
    }

    log::debug!("Unknown glyph name: '{}'", glyph_name);
    None
}

fn agl_lookup(name: &str) -> Option<char> {
    let c = match name {
        "space" => ' ',
        "exclam" => '!',
        "quotedbl" => '"',
        "numbersign" => '#',
        "dollar" => '$',
        "percent" => '%',
        "ampersand" => '&',
        "quotesingle" => '\'',
        "parenleft" => '(',
        "parenright" => ')',
        "asterisk" => '*',
        "plus" => '+',
        "comma" => ',',
        "hyphen" => '-',
        "period" => '.',
        "slash" => '/',
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        "colon" => ':',
        "semicolon" => ';',
        "less" => '<',
        "equal" => '=',
        "greater" => '>',
        "question" => '?',
        "at" => '@',
        "bracketleft" => '[',
        "backslash" => '\\',
        "bracketright" => ']',
        "asciicircum" => '^',
        "underscore" => '_',
        "grave" => '`',
        "braceleft" => '{',
        "bar" => '|',
        "braceright" => '}',
        "asciitilde" => '~',
        "bullet" => '\u{2022}',
        "dagger" => '\u{2020}',
        "daggerdbl" => '\u{2021}',
        "ellipsis" => '\u{2026}',
        "emdash" => '\u{2014}',
        "endash" => '\u{2013}',
        "florin" => '\u{0192}',
        "fraction" => '\u{2044}',
        "guilsinglleft" => '\u{2039}',
        "guilsinglright" => '\u{203A}',
        "guillemotleft" => '\u{00AB}',
        "guillemotright" => '\u{00BB}',
        "minus" => '\u{2212}',
        "perthousand" => '\u{2030}',
        "quotedblbase" => '\u{201E}',
        "quotedblleft" => '\u{201C}',
        "quotedblright" => '\u{201D}',
        "quoteleft" => '\u{2018}',
        "quoteright" => '\u{2019}',
        "quotesinglbase" => '\u{201A}',
        "trademark" => '\u{2122}',
        "copyright" => '\u{00A9}',
        "registered" => '\u{00AE}',
        "degree" => '\u{00B0}',
        "Euro" => '\u{20AC}',
        "sterling" => '\u{00A3}',
        "yen" => '\u{00A5}',
        "cent" => '\u{00A2}',
        "section" => '\u{00A7}',
        "paragraph" => '\u{00B6}',
        "nbspace" => '\u{00A0}',
        "fi" => '\u{FB01}',
        "fl" => '\u{FB02}',
        "Lslash" => '\u{0141}',
        "lslash" => '\u{0142}',
        "OE" => '\u{0152}',
        "oe" => '\u{0153}',
        "Scaron" => '\u{0160}',
        "scaron" => '\u{0161}',
        "Zcaron" => '\u{017D}',
        "zcaron" => '\u{017E}',
        "Ydieresis" => '\u{0178}',
        "Aacute" => '\u{00C1}',
        "Agrave" => '\u{00C0}',
        "Acircumflex" => '\u{00C2}',
        "Adieresis" => '\u{00C4}',
        "Aring" => '\u{00C5}',
        "Atilde" => '\u{00C3}',
        "Ccedilla" => '\u{00C7}',
        "Eacute" => '\u{00C9}',
        "Egrave" => '\u{00C8}',
        "Ecircumflex" => '\u{00CA}',
        "Edieresis" => '\u{00CB}',
        "Ntilde" => '\u{00D1}',
        "Oacute" => '\u{00D3}',
        "Odieresis" => '\u{00D6}',
        "Uacute" => '\u{00DA}',
        "Udieresis" => '\u{00DC}',
        "aacute" => '\u{00E1}',
        "agrave" => '\u{00E0}',
        "acircumflex" => '\u{00E2}',
        "adieresis" => '\u{00E4}',
        "aring" => '\u{00E5}',
        "atilde" => '\u{00E3}',
        "ccedilla" => '\u{00E7}',
        "eacute" => '\u{00E9}',
        "egrave" => '\u{00E8}',
        "ecircumflex" => '\u{00EA}',
        "edieresis" => '\u{00EB}',
        "iacute" => '\u{00ED}',
        "igrave" => '\u{00EC}',
        "icircumflex" => '\u{00EE}',
        "idieresis" => '\u{00EF}',
        "ntilde" => '\u{00F1}',
        "oacute" => '\u{00F3}',
        "ograve" => '\u{00F2}',
        "ocircumflex" => '\u{00F4}',
        "odieresis" => '\u{00F6}',
        "otilde" => '\u{00F5}',
        "uacute" => '\u{00FA}',
        "ugrave" => '\u{00F9}',
        "ucircumflex" => '\u{00FB}',
        "udieresis" => '\u{00FC}',
        "ssharp" | "germandbls" => '\u{00DF}',
        _ => return None,
    };
    Some(c)
}

/// Decode/encode table of a simple (1-byte) font.
///
/// The table is fixed at construction; re-encoding only uses codes the
/// table already maps, with the lowest code winning when several codes
/// produce the same character.
#[derive(Debug, Clone)]
pub struct SimpleEncoding {
    table: Box<[Option<char>; 256]>,
    reverse: HashMap<char, u8>,
}

impl SimpleEncoding {
    /// Build the table from a base encoding and `/Differences` overrides.
    ///
    /// Each override is a `(code, glyph_name)` pair; names that resolve to
    /// no Unicode character leave the code unmapped.
    pub fn new(base: BaseEncoding, differences: &[(u8, String)]) -> SimpleEncoding {
        let mut table = Box::new([None; 256]);
        for code in 0..=255u8 {
            table[code as usize] = base_encoding_lookup(base, code);
        }
        for (code, glyph_name) in differences {
            table[*code as usize] = glyph_name_to_unicode(glyph_name);
        }

        let mut reverse = HashMap::new();
        for code in 0..=255u8 {
            if let Some(c) = table[code as usize] {
                // Lowest code wins on ties
                reverse.entry(c).or_insert(code);
            }
        }

        SimpleEncoding { table, reverse }
    }

    /// Unicode character for a byte code, if the table maps it.
    pub fn decode_code(&self, code: u8) -> Option<char> {
        self.table[code as usize]
    }

    /// Byte code for a character, if any table entry produces it.
    pub fn encode_char(&self, ch: char) -> Option<u8> {
        self.reverse.get(&ch).copied()
    }
}
