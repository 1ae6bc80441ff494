//! End-to-end JSON(YX) parsing scenarios (§8).

use pretty_assertions::assert_eq;
use rtonyx::value::{Decimal, Value};
use rtonyx::{loads, loads_str, Allow, ParseOptions, Permission};

fn parse(text: &str) -> Value {
    loads_str(text, &ParseOptions::default()).unwrap()
}

#[test]
fn object_round_trips_through_loads_and_dumps() {
    // §8 scenario 3.
    let value = parse(r#"{"k1": 1, "k2": [true, null]}"#);
    let dumped = rtonyx::dumps(&value, &Default::default()).unwrap();
    assert_eq!(dumped, r#"{"k1": 1, "k2": [true, null]}"#);
}

#[test]
fn every_bare_integer_literal_decodes_to_integer() {
    for literal in ["0", "-0", "42", "-42", "123456789012345678901234567890"] {
        assert!(parse(literal).is_integer(), "{literal} should be Integer");
    }
}

#[test]
fn fractional_or_exponent_literal_decodes_to_real_by_default() {
    assert!(parse("0.0").is_real());
    assert!(parse("1e3").is_real());
}

#[test]
fn big_number_without_decimal_requires_permission() {
    let err = loads_str("1e400", &ParseOptions::default()).unwrap_err();
    assert!(err.to_string().contains("Big numbers require decimal"));

    let options = ParseOptions {
        use_decimal: true,
        ..Default::default()
    };
    let value = loads_str("1e400", &options).unwrap();
    match value {
        Value::Decimal(Decimal::Finite(d)) => assert_eq!(d.to_string(), "1E+400"),
        other => panic!("expected finite Decimal, got {other:?}"),
    }
}

#[test]
fn comments_are_stripped_only_when_permitted() {
    assert!(loads_str("// hi\n{}", &ParseOptions::default()).is_err());

    let options = ParseOptions {
        allow: Allow::single(Permission::Comments),
        ..Default::default()
    };
    assert_eq!(loads_str("// hi\n{}", &options).unwrap(), Value::Object(vec![]));
    assert_eq!(loads_str("/* block */ []", &options).unwrap(), Value::Array(vec![]));
}

#[test]
fn unterminated_block_comment_points_at_opener() {
    let options = ParseOptions {
        allow: Allow::single(Permission::Comments),
        ..Default::default()
    };
    let err = loads_str("/* unterminated", &options).unwrap_err();
    assert_eq!(err.colno, 3);
}

#[test]
fn missing_commas_permission_stitches_adjacent_items() {
    let options = ParseOptions {
        allow: Allow::single(Permission::MissingCommas),
        ..Default::default()
    };
    let value = loads_str(r#"[1 2 3]"#, &options).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 3);
}

#[test]
fn surrogate_pair_decodes_to_single_supplementary_scalar() {
    let value = parse("\"\\ud83d\\ude00\"");
    assert_eq!(value.as_str().unwrap().chars().count(), 1);
}

#[test]
fn unpaired_surrogate_round_trips_under_permission() {
    let options = ParseOptions {
        allow: Allow::single(Permission::Surrogates),
        ..Default::default()
    };
    let value = loads_str("\"\\ud800\"", &options).unwrap();
    assert_eq!(value.as_code_units(), Some(&[0xD800u16][..]));

    let write_options = rtonyx::WriteOptions {
        allow: Allow::single(Permission::Surrogates),
        ..Default::default()
    };
    assert_eq!(
        rtonyx::dumps(&value, &write_options).unwrap(),
        "\"\\ud800\""
    );
}

#[test]
fn unpaired_surrogate_without_permission_collapses_to_replacement_char() {
    let value = loads_str("\"\\ud800\"", &ParseOptions::default()).unwrap();
    assert_eq!(value.as_str(), Some("\u{fffd}"));
}

#[test]
fn control_character_in_string_is_rejected() {
    let raw = format!("\"{}\"", '\u{1}');
    assert!(loads_str(&raw, &ParseOptions::default()).is_err());
}

#[test]
fn escaped_null_round_trips() {
    let value = parse("\"\\u0000\"");
    assert_eq!(value.as_str().unwrap(), "\u{0}");
    assert_eq!(
        rtonyx::dumps(&value, &Default::default()).unwrap(),
        "\"\\u0000\""
    );
}

#[test]
fn auto_decode_runs_before_parsing_bytes() {
    let utf16_le: Vec<u8> = "{\"a\": 1}".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
    let value = loads(&utf16_le, &ParseOptions::default()).unwrap();
    assert_eq!(value.get("a"), Some(&Value::Integer(1.into())));
}

#[test]
fn trailing_data_after_top_level_value_is_an_error() {
    let err = loads_str("{} {}", &ParseOptions::default()).unwrap_err();
    assert!(err.to_string().contains("line 1"));
}
