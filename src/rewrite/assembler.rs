//! Text-run assembly.
//!
//! Walks the operation list tracking the current font and groups
//! consecutive show-text operations under one font into maximal runs, so a
//! search string split across several `Tj`/`TJ` operations can still be
//! found. Positioning operators adjust where text lands but not what it
//! says, so they pass through a run; any other operator ends it.
//!
//! Each decoded character carries a [`CharOrigin`] locating its source
//! bytes, which is what later allows surgical byte splicing.

use crate::content::Operation;
use crate::error::{Error, Result};
use crate::fonts::{FontArena, FontHandle};
use crate::object::Object;
use std::collections::HashMap;
use std::ops::Range;

/// Source location of one decoded character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharOrigin {
    /// Index of the operation in the parsed operation list
    pub op_index: usize,
    /// String piece within the operation: the array index for `TJ`,
    /// otherwise the operand index of the string
    pub piece: usize,
    /// Byte span within that piece's string bytes. Characters decoded
    /// from one multi-character mapping share a span.
    pub span: Range<usize>,
}

/// A maximal group of show-text operations under a single font.
#[derive(Debug, Clone)]
pub struct TextRun {
    /// Font every character of the run was decoded with
    pub font: FontHandle,
    /// Decoded text, one entry per Unicode codepoint
    pub text: Vec<char>,
    /// Parallel to `text`
    pub origins: Vec<CharOrigin>,
    /// Indices of the show-text operations composing the run, in order.
    /// Includes operations that decoded to no characters (e.g. a `TJ`
    /// array holding only spacing numbers).
    pub ops: Vec<usize>,
}

/// Operators that adjust text position or spacing without painting text.
/// They never interrupt a run.
fn is_positioning(operator: &str) -> bool {
    matches!(
        operator,
        "Td" | "TD" | "T*" | "TL" | "Tc" | "Tw" | "Tz" | "Ts" | "Tm"
    )
}

/// Group show-text operations into text runs.
///
/// `fonts` maps resource names (the `Tf` operand without the slash) to
/// handles into `arena`. The font selected by `Tf` is part of the graphics
/// state, so `q` saves it and `Q` restores it alongside the rest of the
/// state.
///
/// # Errors
///
/// - [`Error::FontNotFound`](crate::error::Error::FontNotFound) when `Tf`
///   names a font the resource map does not contain.
/// - [`Error::Font`](crate::error::Error::Font) when text is shown before
///   any font was selected.
/// - Decode errors from the font surface unchanged.
pub fn assemble_runs(
    operations: &[Operation],
    fonts: &HashMap<String, FontHandle>,
    arena: &FontArena,
) -> Result<Vec<TextRun>> {
    let mut runs: Vec<TextRun> = Vec::new();
    let mut current: Option<TextRun> = None;
    let mut current_font: Option<FontHandle> = None;
    let mut font_stack: Vec<Option<FontHandle>> = Vec::new();

    for (op_index, op) in operations.iter().enumerate() {
        if op.operator == "q" {
            font_stack.push(current_font);
            flush(&mut current, &mut runs);
            continue;
        }

        if op.operator == "Q" {
            match font_stack.pop() {
                Some(saved) => current_font = saved,
                None => log::warn!("Q without a matching q; font selection kept"),
            }
            flush(&mut current, &mut runs);
            continue;
        }

        if op.operator == "Tf" {
            let name = match op.operands.first() {
                Some(Object::Name(name)) => name,
                _ => {
                    return Err(Error::MalformedStream {
                        offset: op.raw.start,
                        reason: "Tf operand is not a name".to_string(),
                    })
                },
            };
            let handle = *fonts
                .get(name)
                .ok_or_else(|| Error::FontNotFound { name: name.clone() })?;
            current_font = Some(handle);
            flush(&mut current, &mut runs);
            continue;
        }

        if op.is_show_text() {
            let font = current_font.ok_or_else(|| {
                Error::Font(format!(
                    "show-text operator '{}' before any Tf",
                    op.operator
                ))
            })?;

            // A font change flushed the previous run already; a run only
            // continues while the font handle is unchanged.
            let run = current.get_or_insert_with(|| TextRun {
                font,
                text: Vec::new(),
                origins: Vec::new(),
                ops: Vec::new(),
            });
            run.ops.push(op_index);
            decode_into(run, op, op_index, arena)?;
            continue;
        }

        if !is_positioning(&op.operator) {
            flush(&mut current, &mut runs);
        }
    }

    flush(&mut current, &mut runs);
    log::debug!("assembled {} text runs", runs.len());
    Ok(runs)
}

fn flush(current: &mut Option<TextRun>, runs: &mut Vec<TextRun>) {
    if let Some(run) = current.take() {
        runs.push(run);
    }
}

/// Decode one show-text operation's string pieces into the run.
fn decode_into(
    run: &mut TextRun,
    op: &Operation,
    op_index: usize,
    arena: &FontArena,
) -> Result<()> {
    let font = arena.get(run.font);
    match op.operator.as_str() {
        "Tj" | "'" => {
            let bytes = string_operand(op, 0)?;
            push_decoded(run, font, bytes, op_index, 0)?;
        },
        "\"" => {
            // aw ac string "
            let bytes = string_operand(op, 2)?;
            push_decoded(run, font, bytes, op_index, 2)?;
        },
        "TJ" => {
            let array = match op.operands.first() {
                Some(Object::Array(items)) => items,
                _ => {
                    return Err(Error::MalformedStream {
                        offset: op.raw.start,
                        reason: "TJ operand is not an array".to_string(),
                    })
                },
            };
            for (piece, item) in array.iter().enumerate() {
                match item {
                    Object::String(bytes, _) => {
                        push_decoded(run, font, bytes, op_index, piece)?;
                    },
                    Object::Integer(_) | Object::Real(_) => {},
                    other => {
                        return Err(Error::MalformedStream {
                            offset: op.raw.start,
                            reason: format!(
                                "TJ array holds a {}, expected string or number",
                                other.type_name()
                            ),
                        })
                    },
                }
            }
        },
        _ => unreachable!("caller checks is_show_text"),
    }
    Ok(())
}

fn string_operand(op: &Operation, index: usize) -> Result<&[u8]> {
    match op.operands.get(index) {
        Some(Object::String(bytes, _)) => Ok(bytes),
        _ => Err(Error::MalformedStream {
            offset: op.raw.start,
            reason: format!("{} operand {} is not a string", op.operator, index),
        }),
    }
}

fn push_decoded(
    run: &mut TextRun,
    font: &crate::fonts::Font,
    bytes: &[u8],
    op_index: usize,
    piece: usize,
) -> Result<()> {
    let (text, spans) = font.decode(bytes)?;
    for (c, span) in text.chars().zip(spans) {
        run.text.push(c);
        run.origins.push(CharOrigin { op_index, piece, span });
    }
    Ok(())
}
