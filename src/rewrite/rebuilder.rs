//! Operand rebuilding for matched operations.
//!
//! Applies a run's matches back onto the operation list. Each string piece
//! that contributed characters to a match is rebuilt from byte fragments:
//! original bytes for uncovered characters (copied through their recorded
//! spans), the encoded replacement at each match start, nothing for the
//! rest of a match. Operations without a covered character keep their
//! operands untouched so the serializer can emit their source bytes
//! verbatim.
//!
//! `TJ` spacing adjustments are kept unless the decoded characters on both
//! sides of the number belong to one and the same match; those numbers
//! positioned glyphs that no longer exist, and keeping them would tear the
//! replacement apart visually.

use super::assembler::TextRun;
use super::matcher::Match;
use crate::content::Operation;
use crate::error::{Error, Result};
use crate::object::Object;
use std::collections::{HashMap, HashSet};

/// Rewrite the operations a run's matches touch, flagging them in
/// `modified`. `replacement` holds the replacement text already encoded in
/// the run's font.
pub fn apply_matches(
    operations: &mut [Operation],
    modified: &mut [bool],
    run: &TextRun,
    matches: &[Match],
    replacement: &[u8],
) -> Result<()> {
    if matches.is_empty() {
        return Ok(());
    }

    // Covering match index per codepoint
    let mut cover: Vec<Option<usize>> = vec![None; run.text.len()];
    for (m, mat) in matches.iter().enumerate() {
        for slot in &mut cover[mat.start..mat.end] {
            *slot = Some(m);
        }
    }

    let piece_bytes = rebuild_piece_bytes(operations, run, matches, &cover, replacement)?;

    let covered_ops: HashSet<usize> = run
        .origins
        .iter()
        .zip(&cover)
        .filter(|(_, c)| c.is_some())
        .map(|(origin, _)| origin.op_index)
        .collect();

    for &op_index in &run.ops {
        let op = &operations[op_index];
        let new_operands = match op.operator.as_str() {
            "Tj" | "'" | "\"" => {
                if !covered_ops.contains(&op_index) {
                    continue;
                }
                let piece = if op.operator == "\"" { 2 } else { 0 };
                rebuild_string_operands(op, op_index, piece, &piece_bytes)?
            },
            "TJ" => match rebuild_tj_operand(op, op_index, run, &cover, &piece_bytes)? {
                Some(operands) => operands,
                None => continue,
            },
            _ => continue,
        };
        let op = &mut operations[op_index];
        op.operands = new_operands;
        modified[op_index] = true;
    }

    log::debug!(
        "applied {} matches across {} operations",
        matches.len(),
        covered_ops.len()
    );
    Ok(())
}

/// New byte content per `(op_index, piece)`, for every piece that decoded
/// at least one character.
fn rebuild_piece_bytes(
    operations: &[Operation],
    run: &TextRun,
    matches: &[Match],
    cover: &[Option<usize>],
    replacement: &[u8],
) -> Result<HashMap<(usize, usize), Vec<u8>>> {
    let mut piece_bytes: HashMap<(usize, usize), Vec<u8>> = HashMap::new();

    for (j, origin) in run.origins.iter().enumerate() {
        let buf = piece_bytes.entry((origin.op_index, origin.piece)).or_default();
        match cover[j] {
            Some(m) => {
                // The whole replacement goes where the match started
                if matches[m].start == j {
                    buf.extend_from_slice(replacement);
                }
            },
            None => {
                // Characters sharing one span emit their bytes once
                if j > 0 && run.origins[j - 1] == *origin {
                    continue;
                }
                let source = piece_source(&operations[origin.op_index], origin.piece)?;
                buf.extend_from_slice(&source[origin.span.clone()]);
            },
        }
    }

    Ok(piece_bytes)
}

/// Original bytes of one string piece of an operation.
fn piece_source(op: &Operation, piece: usize) -> Result<&[u8]> {
    let operand = if op.operator == "TJ" {
        op.operands.first().and_then(|o| o.as_array()).and_then(|a| a.get(piece))
    } else {
        op.operands.get(piece)
    };
    match operand {
        Some(Object::String(bytes, _)) => Ok(bytes),
        _ => Err(Error::MalformedStream {
            offset: op.raw.start,
            reason: format!("{} lost its string operand", op.operator),
        }),
    }
}

/// New operand list for a `Tj`, `'` or `"` operation. The string keeps its
/// source spelling family (literal or hex); an emptied string stays in
/// place so the operand count is preserved.
fn rebuild_string_operands(
    op: &Operation,
    op_index: usize,
    piece: usize,
    piece_bytes: &HashMap<(usize, usize), Vec<u8>>,
) -> Result<Vec<Object>> {
    let mut operands = op.operands.clone();
    let format = match operands.get(piece) {
        Some(Object::String(_, format)) => *format,
        _ => {
            return Err(Error::MalformedStream {
                offset: op.raw.start,
                reason: format!("{} lost its string operand", op.operator),
            })
        },
    };
    let new = piece_bytes.get(&(op_index, piece)).cloned().unwrap_or_default();
    operands[piece] = Object::String(new, format);
    Ok(operands)
}

/// New operand list for a `TJ` operation, or `None` when nothing in it
/// changed. String entries are replaced by their rebuilt bytes (dropped
/// entirely when emptied); spacing numbers are dropped only when fully
/// inside one match.
fn rebuild_tj_operand(
    op: &Operation,
    op_index: usize,
    run: &TextRun,
    cover: &[Option<usize>],
    piece_bytes: &HashMap<(usize, usize), Vec<u8>>,
) -> Result<Option<Vec<Object>>> {
    let array = match op.operands.first().and_then(|o| o.as_array()) {
        Some(array) => array,
        None => {
            return Err(Error::MalformedStream {
                offset: op.raw.start,
                reason: "TJ lost its array operand".to_string(),
            })
        },
    };

    let mut new_items = Vec::with_capacity(array.len());
    let mut changed = false;

    for (entry, item) in array.iter().enumerate() {
        match item {
            Object::String(_, format) => match piece_bytes.get(&(op_index, entry)) {
                Some(new) if new.is_empty() => changed = true,
                Some(new) => {
                    changed = true;
                    new_items.push(Object::String(new.clone(), *format));
                },
                // Piece decoded no characters (an empty source string)
                None => new_items.push(item.clone()),
            },
            Object::Integer(_) | Object::Real(_) => {
                if adjustment_inside_match(run, cover, op_index, entry) {
                    changed = true;
                } else {
                    new_items.push(item.clone());
                }
            },
            other => new_items.push(other.clone()),
        }
    }

    if changed {
        Ok(Some(vec![Object::Array(new_items)]))
    } else {
        Ok(None)
    }
}

/// Whether the decoded characters on both sides of a `TJ` spacing number
/// belong to the same match. Sides are found run-wide, so a number at the
/// edge of one array can still sit inside a match that continues in the
/// next show operation.
fn adjustment_inside_match(
    run: &TextRun,
    cover: &[Option<usize>],
    op_index: usize,
    entry: usize,
) -> bool {
    // Origins are ordered by (op_index, piece), so the characters around
    // array position `entry` bracket this partition point.
    let pos = (op_index, entry);
    let split = run
        .origins
        .partition_point(|origin| (origin.op_index, origin.piece) < pos);
    if split == 0 || split == run.origins.len() {
        return false;
    }
    match (cover[split - 1], cover[split]) {
        (Some(before), Some(after)) => before == after,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{parse_operations, serialize_operations};
    use crate::fonts::{BaseEncoding, Font, FontArena, FontHandle, SimpleEncoding};
    use crate::rewrite::assembler::assemble_runs;
    use crate::rewrite::matcher::find_matches;
    use std::collections::HashMap;

    fn rewrite(stream: &[u8], search: &str, replacement: &str) -> Vec<u8> {
        let mut arena = FontArena::new();
        let handle = arena.insert(Font::simple(
            "F1",
            SimpleEncoding::new(BaseEncoding::WinAnsi, &[]),
        ));
        let mut fonts: HashMap<String, FontHandle> = HashMap::new();
        fonts.insert("F1".to_string(), handle);

        let mut ops = parse_operations(stream).unwrap();
        let mut modified = vec![false; ops.len()];
        let runs = assemble_runs(&ops, &fonts, &arena).unwrap();
        let needle: Vec<char> = search.chars().collect();
        for run in &runs {
            let matches = find_matches(&run.text, &needle, &run.origins);
            let encoded = arena.get(run.font).encode(replacement).unwrap();
            apply_matches(&mut ops, &mut modified, run, &matches, &encoded).unwrap();
        }
        serialize_operations(stream, &ops, &modified)
    }

    #[test]
    fn test_replace_within_one_string() {
        let out = rewrite(b"BT /F1 12 Tf (Inkscape 1.1.2) Tj ET", "1.1.2", "pleasure");
        assert_eq!(out, b"BT /F1 12 Tf (Inkscape pleasure) Tj ET");
    }

    #[test]
    fn test_replace_across_operations() {
        let out = rewrite(b"BT /F1 12 Tf (crea) Tj 0 -14 Td (ted) Tj ET", "created", "made");
        assert_eq!(out, b"BT /F1 12 Tf (made) Tj 0 -14 Td () Tj ET");
    }

    #[test]
    fn test_tj_adjustment_inside_match_dropped() {
        let out = rewrite(b"BT /F1 12 Tf [(crea) -30 (ted)] TJ ET", "created", "made");
        assert_eq!(out, b"BT /F1 12 Tf [(made)] TJ ET");
    }

    #[test]
    fn test_tj_adjustment_outside_match_kept() {
        let out = rewrite(b"BT /F1 12 Tf [(foo) -30 (bar)] TJ ET", "bar", "qux");
        assert_eq!(out, b"BT /F1 12 Tf [(foo) -30 (qux)] TJ ET");
    }

    #[test]
    fn test_adjustment_between_match_and_context_kept() {
        // Only "ted" is inside the match's right half; "crea" is not
        // matched at all, so the number has one uncovered side
        let out = rewrite(b"BT /F1 12 Tf [(crea) -30 (ted)] TJ ET", "ted", "ting");
        assert_eq!(out, b"BT /F1 12 Tf [(crea) -30 (ting)] TJ ET");
    }

    #[test]
    fn test_adjustment_between_two_matches_kept() {
        // Both sides are covered, but by different matches
        let out = rewrite(b"BT /F1 12 Tf [(ab) -30 (ab)] TJ ET", "ab", "x");
        assert_eq!(out, b"BT /F1 12 Tf [(x) -30 (x)] TJ ET");
    }

    #[test]
    fn test_cross_op_tj_edge_adjustment_dropped() {
        // The numeric-only TJ sits wholly between the halves of one match
        let out = rewrite(b"BT /F1 12 Tf (crea) Tj [-200] TJ (ted) Tj ET", "created", "made");
        assert_eq!(out, b"BT /F1 12 Tf (made) Tj [] TJ () Tj ET");
    }

    #[test]
    fn test_untouched_operations_byte_identical() {
        let source = b"q 0.1 w Q BT /F1 12 Tf (keep) Tj (target) Tj ET";
        let out = rewrite(source, "target", "done");
        assert_eq!(out, b"q 0.1 w Q BT /F1 12 Tf (keep) Tj (done) Tj ET");
    }

    #[test]
    fn test_hex_string_stays_hex() {
        // "Hi" in WinAnsi as a hex string
        let out = rewrite(b"BT /F1 12 Tf <4869> Tj ET", "Hi", "Yo");
        assert_eq!(out, b"BT /F1 12 Tf <596F> Tj ET");
    }

    #[test]
    fn test_quote_operator_keeps_spacing_operands() {
        let out = rewrite(b"BT /F1 12 Tf 2 1 (target here) \" ET", "target", "fixed");
        assert_eq!(out, b"BT /F1 12 Tf 2 1 (fixed here) \" ET");
    }
}
