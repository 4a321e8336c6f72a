//! Content stream serialization.
//!
//! Writes a parsed operation sequence back into content stream bytes.
//! Operations that were not modified are copied verbatim from the source
//! buffer using their recorded byte spans, including the whitespace that
//! precedes them. Only modified operations are re-serialized from their
//! operand objects, so a rewrite that touches two `Tj` strings leaves every
//! other byte of the stream untouched.

use super::parser::Operation;

/// Serialize operations back into stream bytes.
///
/// `source` is the buffer the operations were parsed from and `modified`
/// flags which operations must be re-serialized; the rest are copied from
/// `source` verbatim. The two slices are indexed in parallel with
/// `operations`.
pub fn serialize_operations(source: &[u8], operations: &[Operation], modified: &[bool]) -> Vec<u8> {
    let mut out = Vec::with_capacity(source.len());
    let mut cursor = 0;

    for (i, op) in operations.iter().enumerate() {
        if modified.get(i).copied().unwrap_or(false) {
            // Preserve inter-operation bytes (whitespace, comments), then
            // emit the rewritten operation in place of its source span.
            out.extend_from_slice(&source[cursor..op.raw.start]);
            write_operation(op, &mut out);
        } else {
            out.extend_from_slice(&source[cursor..op.raw.end]);
        }
        cursor = op.raw.end;
    }

    // Bytes after the last operation (usually a trailing newline)
    out.extend_from_slice(&source[cursor..]);
    out
}

/// Write one operation as `operand operand ... operator`.
fn write_operation(op: &Operation, out: &mut Vec<u8>) {
    for operand in &op.operands {
        operand.write_to(out);
        out.push(b' ');
    }
    out.extend_from_slice(op.operator.as_bytes());
}
