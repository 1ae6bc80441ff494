//! End-to-end JSON(YX) writer scenarios (§4.6, §8).

use num_bigint::BigInt;
use pretty_assertions::assert_eq;
use rtonyx::json::options::Indent;
use rtonyx::value::{Decimal, ObjectKey, Value};
use rtonyx::{dumps, Allow, Permission, WriteOptions};

#[test]
fn ensure_ascii_encodes_supplementary_plane_as_surrogate_pair() {
    // §8 scenario 4: dumps("\U00010348", ensure_ascii=True).
    let value = Value::String("\u{10348}".to_owned());
    let options = WriteOptions {
        ensure_ascii: true,
        ..Default::default()
    };
    let text = dumps(&value, &options).unwrap();
    assert_eq!(text, "\"\\ud800\\udf48\"");
    assert_eq!(text.chars().filter(|&c| c != '"').count(), 12);
}

#[test]
fn indented_output_uses_requested_spacing() {
    let value = Value::Object(vec![
        (ObjectKey::Plain("a".into()), Value::Integer(BigInt::from(1))),
        (ObjectKey::Plain("b".into()), Value::Array(vec![Value::Null])),
    ]);
    let options = WriteOptions {
        indent: Some(Indent::Spaces(2)),
        ..Default::default()
    };
    let text = dumps(&value, &options).unwrap();
    assert_eq!(text, "{\n  \"a\": 1,\n  \"b\": [\n    null\n  ]\n}");
}

#[test]
fn tab_indent_uses_tabs_not_spaces() {
    let value = Value::Array(vec![Value::Bool(true)]);
    let options = WriteOptions {
        indent: Some(Indent::Tab),
        ..Default::default()
    };
    assert_eq!(dumps(&value, &options).unwrap(), "[\n\ttrue\n]");
}

#[test]
fn sort_keys_orders_object_members() {
    let value = Value::Object(vec![
        (ObjectKey::Plain("z".into()), Value::Null),
        (ObjectKey::Plain("a".into()), Value::Null),
        (ObjectKey::Plain("m".into()), Value::Null),
    ]);
    let options = WriteOptions {
        sort_keys: true,
        ..Default::default()
    };
    assert_eq!(
        dumps(&value, &options).unwrap(),
        r#"{"a": null, "m": null, "z": null}"#
    );
}

#[test]
fn signaling_nan_is_always_rejected_even_with_permission() {
    let options = WriteOptions {
        allow: Allow::single(Permission::NanAndInfinity),
        ..Default::default()
    };
    let err = dumps(&Value::Decimal(Decimal::SNaN), &options).unwrap_err();
    assert!(err.to_string().contains("not serializable"));
}

#[test]
fn non_finite_without_permission_is_a_value_error() {
    let err = dumps(&Value::Real(f64::NAN), &Default::default()).unwrap_err();
    assert!(err.to_string().contains("not allowed"));
}

#[test]
fn empty_array_and_object_have_no_inner_whitespace_when_indented() {
    let options = WriteOptions {
        indent: Some(Indent::Spaces(4)),
        ..Default::default()
    };
    assert_eq!(dumps(&Value::Array(vec![]), &options).unwrap(), "[]");
    assert_eq!(dumps(&Value::Object(vec![]), &options).unwrap(), "{}");
}

#[test]
fn surrogate_string_round_trips_under_permission() {
    let value = Value::SurrogateString(vec![0xD800]);
    let err = rtonyx::dumps(&value, &Default::default()).unwrap_err();
    assert!(err.to_string().contains("not allowed"));

    let options = WriteOptions {
        allow: Allow::single(Permission::Surrogates),
        ..Default::default()
    };
    assert_eq!(rtonyx::dumps(&value, &options).unwrap(), "\"\\ud800\"");
}

#[test]
fn decimal_finite_emits_canonical_string() {
    use bigdecimal::BigDecimal;
    use std::str::FromStr;
    let value = Value::Decimal(Decimal::Finite(BigDecimal::from_str("3.140").unwrap()));
    let text = dumps(&value, &Default::default()).unwrap();
    assert!(text.starts_with("3.14"));
}
