//! End-to-end rewrite pipeline tests.
//!
//! Each test drives the public API the way a document-level caller would:
//! build the page's fonts, hand over a decompressed content stream, and
//! check the rewritten bytes.

use pdf_rewrite::fonts::{BaseEncoding, Font, FontArena, FontHandle, SimpleEncoding, ToUnicodeCMap};
use pdf_rewrite::{Error, RewriteResult, rewrite_content_stream, rewrite_page};
use proptest::prelude::*;
use std::collections::HashMap;

fn winansi_page() -> (FontArena, HashMap<String, FontHandle>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut arena = FontArena::new();
    let f1 = arena.insert(Font::simple(
        "F1",
        SimpleEncoding::new(BaseEncoding::WinAnsi, &[]),
    ));
    let mut fonts = HashMap::new();
    fonts.insert("F1".to_string(), f1);
    (arena, fonts)
}

/// A composite font with 2-byte identity codes for ASCII.
fn identity_page() -> (FontArena, HashMap<String, FontHandle>) {
    let cmap = ToUnicodeCMap::parse(
        b"begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n\
          beginbfrange\n<0020> <007E> <0020>\nendbfrange",
    )
    .unwrap();
    let mut arena = FontArena::new();
    let f0 = arena.insert(Font::composite("C0", cmap));
    let mut fonts = HashMap::new();
    fonts.insert("C0".to_string(), f0);
    (arena, fonts)
}

fn rewritten(result: RewriteResult) -> Vec<u8> {
    match result {
        RewriteResult::Rewritten(bytes) => bytes,
        RewriteResult::Unchanged => panic!("expected a rewrite"),
    }
}

#[test]
fn zero_matches_leaves_stream_byte_identical() {
    let (arena, fonts) = winansi_page();
    let stream: &[u8] =
        b"q\n0.75 0 0 0.75 0 0 cm\nBT\n/F1 12 Tf\n100 700 Td\n(nothing here) Tj\nET\nQ\n";
    let result = rewrite_content_stream(stream, &fonts, &arena, "absent", "x").unwrap();
    assert_eq!(result, RewriteResult::Unchanged);
    assert_eq!(result.into_bytes(stream), stream);
}

#[test]
fn single_occurrence_in_one_string() {
    let (arena, fonts) = winansi_page();
    let stream = b"BT /F1 12 Tf (Inkscape 1.1.2 created this) Tj ET";
    let out = rewritten(
        rewrite_content_stream(stream, &fonts, &arena, "1.1.2", "pleasure").unwrap(),
    );
    assert_eq!(out, b"BT /F1 12 Tf (Inkscape pleasure created this) Tj ET");
}

#[test]
fn bytes_outside_matches_are_unchanged() {
    let (arena, fonts) = winansi_page();
    // Quirky spacing, a comment and a hex string, none of which may move
    let stream: &[u8] = b"% generator comment\nq  1 0 0 1 50 50 cm\nBT\n/F1  12 Tf\n<4869> Tj\n(replace me) Tj\nET\nQ";
    let out =
        rewritten(rewrite_content_stream(stream, &fonts, &arena, "replace me", "done").unwrap());
    assert_eq!(
        out,
        &b"% generator comment\nq  1 0 0 1 50 50 cm\nBT\n/F1  12 Tf\n<4869> Tj\n(done) Tj\nET\nQ"[..]
    );
}

#[test]
fn every_occurrence_replaced_in_one_pass() {
    let (arena, fonts) = winansi_page();
    let stream = b"BT /F1 12 Tf (texttexttext) Tj ET";
    let out = rewritten(rewrite_content_stream(stream, &fonts, &arena, "text", "fuzz").unwrap());
    assert_eq!(out, b"BT /F1 12 Tf (fuzzfuzzfuzz) Tj ET");
}

#[test]
fn occurrences_across_separate_operations() {
    let (arena, fonts) = winansi_page();
    let stream = b"BT /F1 12 Tf (text one) Tj 0 -14 Td (more text) Tj ET";
    let out = rewritten(rewrite_content_stream(stream, &fonts, &arena, "text", "fuzz").unwrap());
    assert_eq!(out, b"BT /F1 12 Tf (fuzz one) Tj 0 -14 Td (more fuzz) Tj ET");
}

#[test]
fn replacement_containing_needle_does_not_recurse() {
    let (arena, fonts) = winansi_page();
    let stream = b"BT /F1 12 Tf (some text here) Tj ET";
    let out = rewritten(rewrite_content_stream(stream, &fonts, &arena, "text", "context").unwrap());
    assert_eq!(out, b"BT /F1 12 Tf (some context here) Tj ET");
}

#[test]
fn match_spanning_two_operations_replaced_once() {
    let (arena, fonts) = winansi_page();
    let stream = b"BT /F1 12 Tf (Inkscape crea) Tj 0 -14 Td (ted this) Tj ET";
    let out = rewritten(rewrite_content_stream(stream, &fonts, &arena, "created", "made").unwrap());
    assert_eq!(out, b"BT /F1 12 Tf (Inkscape made) Tj 0 -14 Td ( this) Tj ET");
}

#[test]
fn tj_interior_adjustments_dropped_exterior_kept() {
    let (arena, fonts) = winansi_page();
    let stream = b"BT /F1 12 Tf [(Ink) -20 (scape crea) -30 (ted)] TJ ET";
    let out = rewritten(rewrite_content_stream(stream, &fonts, &arena, "created", "made").unwrap());
    assert_eq!(out, b"BT /F1 12 Tf [(Ink) -20 (scape made)] TJ ET");
}

#[test]
fn unrepresentable_character_aborts_without_output() {
    let (arena, fonts) = winansi_page();
    let stream = b"BT /F1 12 Tf (hello) Tj ET";
    let err = rewrite_content_stream(stream, &fonts, &arena, "hello", "\u{4E2D}\u{6587}")
        .unwrap_err();
    match err {
        Error::UnrepresentableCharacter { font, ch } => {
            assert_eq!(font, "F1");
            assert_eq!(ch, '\u{4E2D}');
        },
        other => panic!("expected UnrepresentableCharacter, got {:?}", other),
    }
}

#[test]
fn full_page_replacement_keeps_structure() {
    let (arena, fonts) = winansi_page();
    let stream: &[u8] = b"q\n0.1 w\nBT\n/F1 10 Tf\n36 780 Td\n(Inkscape 1.1.2 created this) Tj\nET\n0 0 100 100 re\nS\nQ\n";
    let out = rewritten(
        rewrite_content_stream(stream, &fonts, &arena, "Inkscape 1.1.2", "pleasure").unwrap(),
    );
    assert_eq!(
        out,
        &b"q\n0.1 w\nBT\n/F1 10 Tf\n36 780 Td\n(pleasure created this) Tj\nET\n0 0 100 100 re\nS\nQ\n"[..]
    );
    // Operator sequence is preserved exactly
    let ops = pdf_rewrite::parse_operations(&out).unwrap();
    let operators: Vec<&str> = ops.iter().map(|op| op.operator.as_str()).collect();
    assert_eq!(operators, ["q", "w", "BT", "Tf", "Td", "Tj", "ET", "re", "S", "Q"]);
}

#[test]
fn composite_font_hex_strings() {
    let (arena, fonts) = identity_page();
    // "Hi there" in 2-byte codes
    let stream = b"BT /C0 12 Tf <00480069002000740068006500720065> Tj ET";
    let out = rewritten(rewrite_content_stream(stream, &fonts, &arena, "there", "again").unwrap());
    assert_eq!(out, b"BT /C0 12 Tf <0048006900200061006700610069006E> Tj ET");
}

#[test]
fn composite_font_cross_operation_match() {
    let (arena, fonts) = identity_page();
    // "cre" + "ated" split across two hex strings
    let stream = b"BT /C0 12 Tf <006300720065> Tj <0061007400650064> Tj ET";
    let out = rewritten(rewrite_content_stream(stream, &fonts, &arena, "created", "made").unwrap());
    assert_eq!(out, b"BT /C0 12 Tf <006D006100640065> Tj <> Tj ET");
}

#[test]
fn escaped_parens_handled_and_reescaped() {
    let (arena, fonts) = winansi_page();
    let stream = b"BT /F1 12 Tf (say \\(hi\\) now) Tj ET";
    let out = rewritten(rewrite_content_stream(stream, &fonts, &arena, "(hi)", "(bye)").unwrap());
    assert_eq!(out, b"BT /F1 12 Tf (say \\(bye\\) now) Tj ET");
}

#[test]
fn differences_override_rewrites_through_custom_code() {
    // Code 0x01 shows 'é' via a /Differences override
    let mut arena = FontArena::new();
    let enc = SimpleEncoding::new(BaseEncoding::WinAnsi, &[(0x01, "eacute".to_string())]);
    let f1 = arena.insert(Font::simple("F1", enc));
    let mut fonts = HashMap::new();
    fonts.insert("F1".to_string(), f1);

    let stream = b"BT /F1 12 Tf (caf\x01 time) Tj ET";
    let out = rewritten(rewrite_content_stream(stream, &fonts, &arena, "café", "tea").unwrap());
    assert_eq!(out, b"BT /F1 12 Tf (tea time) Tj ET");
}

#[test]
fn font_selection_survives_graphics_state_restore() {
    // F2 remaps 'f' via /Differences; if Q failed to restore F1, the last
    // string would decode as "Xind me" and never match
    let mut arena = FontArena::new();
    let f1 = arena.insert(Font::simple(
        "F1",
        SimpleEncoding::new(BaseEncoding::WinAnsi, &[]),
    ));
    let f2 = arena.insert(Font::simple(
        "F2",
        SimpleEncoding::new(BaseEncoding::WinAnsi, &[(b'f', "X".to_string())]),
    ));
    let mut fonts = HashMap::new();
    fonts.insert("F1".to_string(), f1);
    fonts.insert("F2".to_string(), f2);

    let stream: &[u8] =
        b"BT /F1 12 Tf (find me) Tj ET q BT /F2 12 Tf (other) Tj ET Q BT (find me) Tj ET";
    let out = rewritten(rewrite_content_stream(stream, &fonts, &arena, "find", "FIND").unwrap());
    assert_eq!(
        out,
        &b"BT /F1 12 Tf (FIND me) Tj ET q BT /F2 12 Tf (other) Tj ET Q BT (FIND me) Tj ET"[..]
    );
}

#[test]
fn page_errors_carry_the_page_index() {
    let (arena, fonts) = winansi_page();
    let err = rewrite_page(7, b"BT (broken Tj", &fonts, &arena, "a", "b").unwrap_err();
    match err {
        Error::PageRewrite { page, .. } => assert_eq!(page, 7),
        other => panic!("expected PageRewrite, got {:?}", other),
    }
    // The message names the page for callers that only format the error
    let err = rewrite_page(7, b"BT (broken Tj", &fonts, &arena, "a", "b").unwrap_err();
    assert!(err.to_string().contains('7'));
}

// Random streams of text and graphics operations; a needle that cannot
// occur must leave every one of them byte-identical.
fn arb_stream() -> impl Strategy<Value = Vec<u8>> {
    let word = "[a-z ]{0,12}";
    let op = prop_oneof![
        word.prop_map(|s| format!("({}) Tj", s)),
        (word, -500i32..500, word)
            .prop_map(|(a, n, b)| format!("[({}) {} ({})] TJ", a, n, b)),
        (0i32..600, 0i32..800).prop_map(|(x, y)| format!("{} {} Td", x, y)),
        Just("q".to_string()),
        Just("Q".to_string()),
        Just("0.5 w".to_string()),
    ];
    proptest::collection::vec(op, 0..12).prop_map(|ops| {
        let mut stream = String::from("BT /F1 12 Tf\n");
        for op in ops {
            stream.push_str(&op);
            stream.push('\n');
        }
        stream.push_str("ET\n");
        stream.into_bytes()
    })
}

proptest! {
    #[test]
    fn prop_zero_match_rewrite_is_identity(stream in arb_stream()) {
        let (arena, fonts) = winansi_page();
        // Uppercase needle cannot occur in the lowercase-only text
        let result = rewrite_content_stream(&stream, &fonts, &arena, "ZQXJ", "y").unwrap();
        prop_assert_eq!(result, RewriteResult::Unchanged);
    }
}
