//! Content-stream lexer.
//!
//! Low-level tokenization of content-stream bytes. Recognizes the operand
//! token types (numbers, literal and hex strings, names, array and
//! dictionary delimiters, keywords) plus operator words.
//!
//! Unlike a general PDF body lexer there are no indirect references or
//! `stream` keywords here; anything that is not an operand is an operator
//! word. Whitespace (space, \t, \r, \n, \0, \f) and comments (% to EOL)
//! are skipped before each token.

use nom::{
    IResult,
    bytes::complete::{take_till, take_while, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{opt, value},
    sequence::preceded,
};

/// Token types recognized by the content-stream lexer.
#[derive(Debug, PartialEq, Clone)]
pub enum Token<'a> {
    /// Integer number (e.g., 42, -123)
    Integer(i64),

    /// Real (floating-point) number (e.g., 3.14, -2.5, .5)
    Real(f64),

    /// Literal string bytes (content of `(Hello)`)
    /// Escape sequences are NOT decoded at lexer level
    LiteralString(&'a [u8]),

    /// Hexadecimal string bytes (content of `<48656C6C6F>`)
    /// Whitespace is preserved; decoding happens at parser level
    HexString(&'a [u8]),

    /// Name (e.g., "F1" from "/F1"), with `#XX` escapes decoded
    Name(String),

    /// Boolean true keyword
    True,

    /// Boolean false keyword
    False,

    /// Null keyword
    Null,

    /// Array start delimiter `[`
    ArrayStart,

    /// Array end delimiter `]`
    ArrayEnd,

    /// Dictionary start delimiter `<<`
    DictStart,

    /// Dictionary end delimiter `>>`
    DictEnd,

    /// Operator word (e.g., "Tj", "T*", "'", "\"", "BT")
    Operator(&'a str),
}

/// Check if a byte is PDF whitespace (PDF Ref 1.7, Table 3.1).
pub fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

/// Check if a byte is a PDF delimiter character.
pub fn is_delimiter(byte: u8) -> bool {
    matches!(byte, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

/// Parse a comment (% to end of line).
fn comment(input: &[u8]) -> IResult<&[u8], ()> {
    value((), preceded(char('%'), take_till(|c| c == b'\r' || c == b'\n')))(input)
}

/// Skip all whitespace and comments.
pub fn skip_ws(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let mut remaining = input;

    loop {
        let before = remaining;

        if let Ok((rest, ws)) = take_while::<_, _, nom::error::Error<&[u8]>>(is_whitespace)(remaining)
        {
            if !ws.is_empty() {
                remaining = rest;
                continue;
            }
        }

        if let Ok((rest, _)) = comment(remaining) {
            remaining = rest;
            continue;
        }

        if remaining == before {
            break;
        }
    }

    Ok((remaining, input))
}

/// Parse an integer or real number.
///
/// Content-stream numbers follow PDF syntax: leading +/- signs, and reals
/// may start or end with the decimal point (.5, 0., -.002).
fn parse_number(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (input, sign) = opt(one_of("+-"))(input)?;
    let (input, int_part) = opt(digit1)(input)?;
    let (input, frac_part) = opt(preceded(char('.'), opt(digit1)))(input)?;

    // At least one digit somewhere: a lone sign or decimal point is not a
    // number
    let has_frac_digits = matches!(frac_part, Some(Some(_)));
    if int_part.is_none() && !has_frac_digits {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit)));
    }

    if frac_part.is_some() {
        let mut num_str = String::new();
        if sign == Some('-') {
            num_str.push('-');
        }
        if let Some(int) = int_part {
            num_str.push_str(std::str::from_utf8(int).map_err(|_| {
                nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
            })?);
        } else {
            num_str.push('0');
        }
        num_str.push('.');
        if let Some(Some(frac)) = frac_part {
            num_str.push_str(std::str::from_utf8(frac).map_err(|_| {
                nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
            })?);
        } else {
            num_str.push('0');
        }

        let num: f64 = num_str.parse().map_err(|_| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
        })?;
        Ok((input, Token::Real(num)))
    } else {
        let int_bytes = int_part.ok_or_else(|| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
        })?;
        let int_str = std::str::from_utf8(int_bytes).map_err(|_| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
        })?;
        let mut num: i64 = int_str.parse().map_err(|_| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
        })?;
        if sign == Some('-') {
            num = -num;
        }
        Ok((input, Token::Integer(num)))
    }
}

/// Parse a literal string enclosed in parentheses.
///
/// Handles balanced nested parentheses, escape sequences, and line
/// continuation. Returns the raw bytes including escape sequences; an
/// unterminated string is a hard `Failure` so the caller reports it as a
/// malformed stream instead of trying another alternative.
fn parse_literal_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (remaining, _) = char('(')(input)?;
    let mut depth = 1;
    let mut pos = 0;

    while depth > 0 && pos < remaining.len() {
        match remaining[pos] {
            b'\\' => {
                // Skip the escaped character (or up to 3 octal digits)
                pos += 1;
                if pos < remaining.len() {
                    if remaining[pos].is_ascii_digit() {
                        pos += 1;
                        if pos < remaining.len() && remaining[pos].is_ascii_digit() {
                            pos += 1;
                        }
                        if pos < remaining.len() && remaining[pos].is_ascii_digit() {
                            pos += 1;
                        }
                    } else {
                        pos += 1;
                    }
                }
            },
            b'(' => {
                depth += 1;
                pos += 1;
            },
            b')' => {
                depth -= 1;
                pos += 1;
            },
            _ => {
                pos += 1;
            },
        }
    }

    if depth != 0 {
        // Unterminated string: fatal, not a fallback case
        return Err(nom::Err::Failure(nom::error::Error::new(input, nom::error::ErrorKind::Tag)));
    }

    let content = &remaining[..pos - 1];
    Ok((&remaining[pos..], Token::LiteralString(content)))
}

/// Parse a hexadecimal string enclosed in angle brackets.
fn parse_hex_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    // `<<` is a dictionary start, not a hex string
    if input.len() >= 2 && input[0] == b'<' && input[1] == b'<' {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)));
    }
    let (input, _) = char('<')(input)?;
    let (input, content) =
        take_while(|c: u8| c.is_ascii_hexdigit() || is_whitespace(c))(input)?;
    // A missing closer is fatal for the same reason as an unterminated literal
    match char::<_, nom::error::Error<&[u8]>>('>')(input) {
        Ok((rest, _)) => Ok((rest, Token::HexString(content))),
        Err(_) => Err(nom::Err::Failure(nom::error::Error::new(input, nom::error::ErrorKind::Char))),
    }
}

/// Decode `#XX` escape sequences in PDF names.
///
/// Name objects can contain any characters encoded as `#XX` where XX is a
/// two-digit hexadecimal code. For example, `/A#20B` becomes "A B".
/// Invalid sequences are preserved literally.
pub fn decode_name_escapes(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '#' {
            let hex1 = chars.next();
            let hex2 = chars.next();

            if let (Some(h1), Some(h2)) = (hex1, hex2) {
                let hex_str = format!("{}{}", h1, h2);
                if let Ok(byte) = u8::from_str_radix(&hex_str, 16) {
                    result.push(byte as char);
                    continue;
                }
                result.push('#');
                result.push(h1);
                result.push(h2);
            } else if let Some(h1) = hex1 {
                result.push('#');
                result.push(h1);
            } else {
                result.push('#');
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Parse a name starting with `/`.
fn parse_name(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (input, _) = char('/')(input)?;
    let (input, bytes) =
        take_while(|c: u8| !is_whitespace(c) && !is_delimiter(c))(input)?;
    let name_str = std::str::from_utf8(bytes).unwrap_or("");
    Ok((input, Token::Name(decode_name_escapes(name_str))))
}

/// Check if a byte can appear in an operator word.
///
/// Operators are regular-character words: mostly letters, plus `*` (T*, f*,
/// B*, W*), `'` and `"` (the move-and-show variants), and digits for the
/// compatibility operators (none standard, but `b0`-style words must not
/// split).
fn is_operator_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'*' | b'\'' | b'"')
}

/// Parse an operator word or keyword.
///
/// `true`, `false`, and `null` are operand keywords, not operators, and are
/// distinguished after the word is read.
fn parse_word(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (rest, word) = take_while1(is_operator_byte)(input)?;
    let word_str = std::str::from_utf8(word)
        .map_err(|_| nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char)))?;
    let tok = match word_str {
        "true" => Token::True,
        "false" => Token::False,
        "null" => Token::Null,
        _ => Token::Operator(word_str),
    };
    Ok((rest, tok))
}

/// Parse a single content-stream token.
///
/// Skips whitespace/comments, then tries each token type. Alternative order
/// matters: `<<` before `<`, names before operator words (a `/` always
/// starts a name), numbers before words (a sign or digit never starts an
/// operator).
pub fn token(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (input, _) = skip_ws(input)?;

    if input.is_empty() {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Eof)));
    }

    match input[0] {
        b'[' => Ok((&input[1..], Token::ArrayStart)),
        b']' => Ok((&input[1..], Token::ArrayEnd)),
        b'<' if input.len() >= 2 && input[1] == b'<' => Ok((&input[2..], Token::DictStart)),
        b'<' => parse_hex_string(input),
        b'>' if input.len() >= 2 && input[1] == b'>' => Ok((&input[2..], Token::DictEnd)),
        b'(' => parse_literal_string(input),
        b'/' => parse_name(input),
        b'+' | b'-' | b'.' | b'0'..=b'9' => parse_number(input),
        _ => parse_word(input),
    }
}
