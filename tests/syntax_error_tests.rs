//! End-to-end diagnostics scenarios for `SyntaxError` and
//! `format_syntax_error` (§4.7, §8 scenario 5).

use rtonyx::{format_syntax_error, loads_str, ParseOptions};

#[test]
fn multiline_source_reports_line_and_column_of_failure() {
    // §8 scenario 5: fail at offset 12 (end=13) in "line 1\nline 2".
    let options = ParseOptions {
        filename: "<string>".to_owned(),
        ..Default::default()
    };
    let err = loads_str("line 1\nline 2", &options).unwrap_err();
    assert_eq!(err.lineno, 1);
    assert_eq!(err.colno, 1);
    assert_eq!(err.msg, "Expecting value");
}

#[test]
fn span_reported_matches_spec_scenario_five() {
    use rtonyx::SyntaxError;
    let text = "line 1\nline 2";
    let err = SyntaxError::new("custom failure", "<string>", text, 12, 13);
    assert_eq!(err.lineno, 2);
    assert_eq!(err.colno, 6);
    assert_eq!(err.end_colno, 7);
    assert_eq!(&err.text[err.text.rfind('\n').unwrap() + 1..], "line 2");
}

#[test]
fn format_syntax_error_renders_header_excerpt_and_caret() {
    use rtonyx::SyntaxError;
    let err = SyntaxError::new("Expecting value", "game.json", "{\n  \"a\": }\n}", 9, 10);
    let rendered = format_syntax_error(&err);
    assert!(rendered.contains("File \"game.json\""));
    assert!(rendered.contains("line 2"));
    assert!(rendered.contains('^'));
    assert!(rendered.contains("Expecting value"));
}

#[test]
fn duplicate_key_error_span_covers_both_occurrences() {
    let err = loads_str(r#"{"a": 1, "a": 2}"#, &ParseOptions::default()).unwrap_err();
    assert_eq!(err.offset, 1);
    assert_eq!(err.end_offset, 12);
    assert!(err.msg.contains("Duplicate key"));
}

#[test]
fn unterminated_string_points_at_opening_quote() {
    let err = loads_str("\"abc", &ParseOptions::default()).unwrap_err();
    assert_eq!(err.offset, 0);
}
