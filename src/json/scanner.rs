//! Recursive-descent JSON(YX) tokenizer/parser (§4.4 "JSON Tokenizer /
//! Scanner").
//!
//! Grounded directly in `original_source/pyvz2/jsonc/decoder.py` and
//! `scanner.py`'s control flow: a `_scan_once` dispatch on the next
//! non-whitespace byte, `parse_object`/`parse_array` loops that special-case
//! trailing and missing commas when permitted, and a `parse_string` that
//! walks escape sequences one at a time rather than through a single
//! regex (Rust's `regex` crate is not in the teacher's dependency stack, so
//! the original's `STRINGCHUNK` pattern is reimplemented as a byte scan).

use std::collections::HashMap;
use std::rc::Rc;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use std::str::FromStr;

use crate::errors::SyntaxError;
use crate::json::options::{Permission, ParseOptions};
use crate::value::{Decimal, DuplicateKey, Object, ObjectKey, Value};

type ScanResult<T> = Result<T, SyntaxError>;

/// Parses a complete JSON(YX) document from `text`, honoring `options`'s
/// permission set. Returns the parsed [`Value`] or the first
/// [`SyntaxError`] encountered (§4.4).
pub fn parse(text: &str, options: &ParseOptions) -> ScanResult<Value> {
    let mut scanner = Scanner::new(text, options);
    scanner.skip_whitespace();
    let value = scanner.scan_value()?;
    scanner.skip_whitespace();
    if scanner.pos < scanner.bytes.len() {
        return Err(scanner.error_at("Extra data", scanner.pos, scanner.pos + 1));
    }
    Ok(value)
}

struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    options: &'a ParseOptions,
    /// Interns equal object keys within one top-level parse so repeated
    /// keys share backing storage, cleared at the end of `parse` by simply
    /// letting the scanner drop (§4.4 "Key memoization").
    key_memo: HashMap<Rc<str>, Rc<str>>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str, options: &'a ParseOptions) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            options,
            key_memo: HashMap::new(),
        }
    }

    fn error_at(&self, msg: impl Into<String>, start: usize, end: usize) -> SyntaxError {
        SyntaxError::new(msg, &self.options.filename, self.text, start, end)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\n' | b'\r') => self.pos += 1,
                Some(b'/') if self.options.allow.contains(Permission::Comments) => {
                    if !self.try_skip_comment() {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    fn try_skip_comment(&mut self) -> bool {
        match self.bytes.get(self.pos + 1) {
            Some(b'/') => {
                self.pos += 2;
                while let Some(b) = self.peek() {
                    if b == b'\n' {
                        break;
                    }
                    self.pos += 1;
                }
                true
            }
            Some(b'*') => {
                self.pos += 2;
                loop {
                    match self.peek() {
                        None => return true,
                        Some(b'*') if self.bytes.get(self.pos + 1) == Some(&b'/') => {
                            self.pos += 2;
                            break;
                        }
                        _ => self.pos += 1,
                    }
                }
                true
            }
            _ => false,
        }
    }

    fn scan_value(&mut self) -> ScanResult<Value> {
        match self.peek() {
            None => Err(self.error_at("Expecting value", self.pos, self.pos + 1)),
            Some(b'"') => self.scan_string(),
            Some(b'{') => self.scan_object(),
            Some(b'[') => self.scan_array(),
            Some(b't') if self.bytes[self.pos..].starts_with(b"true") => {
                self.pos += 4;
                Ok(Value::Bool(true))
            }
            Some(b'f') if self.bytes[self.pos..].starts_with(b"false") => {
                self.pos += 5;
                Ok(Value::Bool(false))
            }
            Some(b'n') if self.bytes[self.pos..].starts_with(b"null") => {
                self.pos += 4;
                Ok(Value::Null)
            }
            Some(b'N') if self.bytes[self.pos..].starts_with(b"NaN") => {
                self.scan_nan_or_infinity("NaN", 3, false)
            }
            Some(b'I') if self.bytes[self.pos..].starts_with(b"Infinity") => {
                self.scan_nan_or_infinity("Infinity", 8, false)
            }
            Some(b'-') if self.bytes[self.pos..].starts_with(b"-Infinity") => {
                self.scan_nan_or_infinity("-Infinity", 9, true)
            }
            Some(b'-' | b'0'..=b'9') => self.scan_number(),
            Some(_) => Err(self.error_at("Expecting value", self.pos, self.pos + 1)),
        }
    }

    fn scan_nan_or_infinity(&mut self, lit: &str, len: usize, negative: bool) -> ScanResult<Value> {
        let start = self.pos;
        if !self.options.allow.contains(Permission::NanAndInfinity) {
            return Err(self.error_at(
                format!("{lit} is not allowed"),
                start,
                start + len,
            ));
        }
        self.pos += len;
        if self.options.use_decimal {
            return Ok(Value::Decimal(if lit == "NaN" {
                Decimal::QNaN
            } else {
                Decimal::Infinity { negative }
            }));
        }
        Ok(Value::Real(if lit == "NaN" {
            f64::NAN
        } else if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        }))
    }

    /// Number grammar: `-? (0|[1-9][0-9]*) (\.[0-9]+)? ([eE][+-]?[0-9]+)?`
    /// (`original_source/pyvz2/jsonc/scanner.py`'s `NUMBER` regex).
    /// Integer literals decode as `Integer`; a fraction or exponent routes
    /// to `Decimal` when `use_decimal` is set, else `Real` (§3 invariant 4).
    fn scan_number(&mut self) -> ScanResult<Value> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        let int_start = self.pos;
        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => {
                while matches!(self.peek(), Some(b'0'..=b'9')) {
                    self.pos += 1;
                }
            }
            _ => return Err(self.error_at("Expecting value", start, start + 1)),
        }
        if self.pos == int_start {
            return Err(self.error_at("Expecting value", start, start + 1));
        }
        let mut is_fractional = false;
        if self.peek() == Some(b'.') {
            let dot = self.pos;
            self.pos += 1;
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.error_at("Expecting digit after '.'", dot + 1, dot + 2));
            }
            is_fractional = true;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let e = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.error_at("Expecting digit in exponent", e + 1, e + 2));
            }
            is_fractional = true;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        let literal = &self.text[start..self.pos];
        if !is_fractional {
            let int = BigInt::from_str(literal)
                .map_err(|_| self.error_at("Invalid integer literal", start, self.pos))?;
            return Ok(Value::Integer(int));
        }
        if self.options.use_decimal {
            let dec = BigDecimal::from_str(literal)
                .map_err(|_| self.error_at("Invalid number literal", start, self.pos))?;
            return Ok(Value::Decimal(Decimal::Finite(dec)));
        }
        let real: f64 = literal
            .parse()
            .map_err(|_| self.error_at("Invalid number literal", start, self.pos))?;
        if real.is_infinite() {
            // A finite literal too large for f64 (e.g. "1e400") needs
            // Decimal to be represented exactly (§8 "Big number").
            return Err(self.error_at("Big numbers require decimal", start, self.pos));
        }
        Ok(Value::Real(real))
    }

    /// Scans a string literal's content as UTF-16 code units rather than
    /// `char`s, since an unpaired surrogate cannot be represented as a
    /// `char` but must still be counted and (under the `surrogates`
    /// permission) preserved (§4.4).
    fn scan_string_units(&mut self) -> ScanResult<Vec<u16>> {
        let quote_start = self.pos;
        self.pos += 1; // opening quote
        let preserve = self.options.allow.contains(Permission::Surrogates);
        let mut units: Vec<u16> = Vec::new();
        loop {
            match self.peek() {
                None => {
                    return Err(self.error_at(
                        "Unterminated string starting at",
                        quote_start,
                        quote_start + 1,
                    ))
                }
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(units);
                }
                Some(b'\\') => {
                    let esc_start = self.pos;
                    self.pos += 1;
                    self.scan_escape(esc_start, &mut units, preserve)?;
                }
                Some(b) if b < 0x20 => {
                    return Err(self.error_at(
                        "Invalid control character",
                        self.pos,
                        self.pos + 1,
                    ))
                }
                Some(_) => {
                    let ch = self.text[self.pos..].chars().next().unwrap();
                    self.pos += ch.len_utf8();
                    let mut buf = [0u16; 2];
                    units.extend_from_slice(ch.encode_utf16(&mut buf));
                }
            }
        }
    }

    /// A string literal in value position: collapses to [`Value::String`]
    /// when every code unit pairs into a valid scalar, or
    /// [`Value::SurrogateString`] when an unpaired surrogate survived
    /// under the `surrogates` permission (§4.4, §4.6).
    fn scan_string(&mut self) -> ScanResult<Value> {
        let units = self.scan_string_units()?;
        Ok(match String::from_utf16(&units) {
            Ok(text) => Value::String(text),
            Err(_) => Value::SurrogateString(units),
        })
    }

    /// A string literal in key position: object keys are always plain
    /// `String`s, so an unpaired surrogate collapses to U+FFFD here
    /// regardless of the `surrogates` permission, matching how a key is
    /// memoized and compared.
    fn scan_string_key(&mut self) -> ScanResult<String> {
        let units = self.scan_string_units()?;
        Ok(String::from_utf16_lossy(&units))
    }

    fn scan_escape(&mut self, esc_start: usize, units: &mut Vec<u16>, preserve_surrogates: bool) -> ScanResult<()> {
        match self.peek() {
            Some(b'"') => {
                units.push(u16::from(b'"'));
                self.pos += 1;
            }
            Some(b'\\') => {
                units.push(u16::from(b'\\'));
                self.pos += 1;
            }
            Some(b'/') => {
                units.push(u16::from(b'/'));
                self.pos += 1;
            }
            Some(b'b') => {
                units.push(0x8);
                self.pos += 1;
            }
            Some(b'f') => {
                units.push(0xc);
                self.pos += 1;
            }
            Some(b'n') => {
                units.push(u16::from(b'\n'));
                self.pos += 1;
            }
            Some(b'r') => {
                units.push(u16::from(b'\r'));
                self.pos += 1;
            }
            Some(b't') => {
                units.push(u16::from(b'\t'));
                self.pos += 1;
            }
            Some(b'u') => {
                self.pos += 1;
                let hi = self.scan_hex4(esc_start)?;
                if (0xD800..=0xDBFF).contains(&hi) {
                    if self.bytes[self.pos..].starts_with(b"\\u") {
                        let save = self.pos;
                        self.pos += 2;
                        let lo = self.scan_hex4(esc_start)?;
                        if (0xDC00..=0xDFFF).contains(&lo) {
                            units.push(hi as u16);
                            units.push(lo as u16);
                            return Ok(());
                        }
                        self.pos = save;
                    }
                    // Unpaired high surrogate: preserved as a raw code
                    // unit when permitted (§4.4), else collapsed to
                    // U+FFFD the way this scanner always behaved before
                    // `surrogates` support existed.
                    units.push(if preserve_surrogates {
                        hi as u16
                    } else {
                        char::REPLACEMENT_CHARACTER as u16
                    });
                } else if (0xDC00..=0xDFFF).contains(&hi) {
                    units.push(if preserve_surrogates {
                        hi as u16
                    } else {
                        char::REPLACEMENT_CHARACTER as u16
                    });
                } else {
                    units.push(hi as u16);
                }
            }
            _ => {
                return Err(self.error_at(
                    "Invalid \\escape",
                    esc_start,
                    esc_start + 2,
                ))
            }
        }
        Ok(())
    }

    fn scan_hex4(&mut self, esc_start: usize) -> ScanResult<u32> {
        let start = self.pos;
        if self.pos + 4 > self.bytes.len() {
            return Err(self.error_at("Invalid \\uXXXX escape", esc_start, esc_start + 2));
        }
        let hex = &self.text[start..start + 4];
        let val = u32::from_str_radix(hex, 16)
            .map_err(|_| self.error_at("Invalid \\uXXXX escape", esc_start, esc_start + 2))?;
        self.pos += 4;
        Ok(val)
    }

    fn intern_key(&mut self, key: String) -> Rc<str> {
        if let Some(existing) = self.key_memo.get(key.as_str()) {
            return Rc::clone(existing);
        }
        let rc: Rc<str> = Rc::from(key);
        self.key_memo.insert(Rc::clone(&rc), Rc::clone(&rc));
        rc
    }

    fn scan_object(&mut self) -> ScanResult<Value> {
        self.pos += 1; // '{'
        let mut entries: Object = Vec::new();
        // First occurrence's (key-start, key-end) per key, so a rejected
        // duplicate's error span covers both repetitions (§4.4 "duplicate
        // keys are an error whose span covers all repetitions").
        let mut first_seen: HashMap<Rc<str>, usize> = HashMap::new();
        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Value::Object(entries));
        }
        loop {
            self.skip_whitespace();
            if self.peek() != Some(b'"') {
                return Err(self.error_at(
                    "Expecting property name enclosed in double quotes",
                    self.pos,
                    self.pos + 1,
                ));
            }
            let key_start = self.pos;
            let raw_key = self.scan_string_key()?;
            let key_end = self.pos;
            let key = self.intern_key(raw_key);
            let is_duplicate = entries.iter().any(|(k, _)| k.as_str() == key.as_ref());
            if is_duplicate && !self.options.allow.contains(Permission::DuplicateKeys) {
                let span_start = first_seen.get(&key).copied().unwrap_or(key_start);
                return Err(self.error_at(
                    format!("Duplicate key {:?}", key.as_ref()),
                    span_start,
                    key_end,
                ));
            }
            first_seen.entry(Rc::clone(&key)).or_insert(key_start);
            self.skip_whitespace();
            if self.peek() != Some(b':') {
                return Err(self.error_at("Expecting ':' delimiter", self.pos, self.pos + 1));
            }
            self.pos += 1;
            self.skip_whitespace();
            let value = self.scan_value()?;
            self.insert_entry(&mut entries, key.to_string(), value, is_duplicate);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    if self.peek() == Some(b'}') {
                        if !self.options.allow.contains(Permission::TrailingComma) {
                            return Err(self.error_at(
                                "Illegal trailing comma before end of object",
                                self.pos - 1,
                                self.pos,
                            ));
                        }
                        self.pos += 1;
                        return Ok(Value::Object(entries));
                    }
                    continue;
                }
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(Value::Object(entries));
                }
                Some(b'"') if self.options.allow.contains(Permission::MissingCommas) => continue,
                _ => {
                    return Err(self.error_at(
                        "Expecting ',' delimiter",
                        self.pos,
                        self.pos + 1,
                    ))
                }
            }
        }
    }

    /// Appends `key`/`value`. By the time this runs, an unpermitted
    /// duplicate has already been rejected by `scan_object`, so `duplicate`
    /// true here only ever means `duplicate_keys` is allowed — wrap the key
    /// so it retains its own identity instead of colliding with the first
    /// occurrence (§4.4 "wrapped as DuplicateKey and retained in order").
    fn insert_entry(&self, entries: &mut Object, key: String, value: Value, duplicate: bool) {
        if duplicate {
            entries.push((ObjectKey::Duplicate(DuplicateKey::new(key)), value));
        } else {
            entries.push((ObjectKey::Plain(key), value));
        }
    }

    fn scan_array(&mut self) -> ScanResult<Value> {
        self.pos += 1; // '['
        let mut items = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(Value::Array(items));
        }
        loop {
            self.skip_whitespace();
            items.push(self.scan_value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    if self.peek() == Some(b']') {
                        if !self.options.allow.contains(Permission::TrailingComma) {
                            return Err(self.error_at(
                                "Illegal trailing comma before end of array",
                                self.pos - 1,
                                self.pos,
                            ));
                        }
                        self.pos += 1;
                        return Ok(Value::Array(items));
                    }
                    continue;
                }
                Some(b']') => {
                    self.pos += 1;
                    return Ok(Value::Array(items));
                }
                Some(b'-' | b'0'..=b'9' | b'"' | b'{' | b'[' | b't' | b'f' | b'n' | b'N' | b'I')
                    if self.options.allow.contains(Permission::MissingCommas) =>
                {
                    continue
                }
                _ => {
                    return Err(self.error_at(
                        "Expecting ',' delimiter",
                        self.pos,
                        self.pos + 1,
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::options::Allow;

    fn opts(allow: crate::json::options::Allow) -> ParseOptions {
        ParseOptions {
            allow,
            ..Default::default()
        }
    }

    #[test]
    fn parses_plain_object() {
        let v = parse(r#"{"a": 1, "b": [true, false, null]}"#, &ParseOptions::default()).unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj[0].0.as_str(), "a");
    }

    #[test]
    fn rejects_trailing_comma_by_default() {
        let err = parse(r#"[1,]"#, &ParseOptions::default()).unwrap_err();
        assert!(err.msg.contains("trailing comma"));
    }

    #[test]
    fn allows_trailing_comma_when_permitted() {
        let options = opts(Allow::single(Permission::TrailingComma));
        let v = parse(r#"[1,]"#, &options).unwrap();
        assert_eq!(v.as_array().unwrap().len(), 1);
    }

    #[test]
    fn rejects_nan_by_default() {
        assert!(parse("NaN", &ParseOptions::default()).is_err());
    }

    #[test]
    fn allows_nan_when_permitted() {
        let options = opts(Allow::single(Permission::NanAndInfinity));
        let v = parse("NaN", &options).unwrap();
        match v {
            Value::Real(f) => assert!(f.is_nan()),
            _ => panic!("expected Real(NaN)"),
        }
    }

    #[test]
    fn duplicate_keys_wrapped_when_permitted() {
        let options = opts(Allow::single(Permission::DuplicateKeys));
        let v = parse(r#"{"a": 1, "a": 2}"#, &options).unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 2);
    }

    #[test]
    fn duplicate_keys_are_a_syntax_error_by_default() {
        let err = parse(r#"{"a": 1, "a": 2}"#, &ParseOptions::default()).unwrap_err();
        assert!(err.msg.contains("Duplicate key"));
        // Span covers both repetitions: from the first "a" through the
        // second's closing quote.
        assert_eq!(err.offset, 1);
        assert_eq!(err.end_offset, 12);
    }

    #[test]
    fn surrogate_pair_combines_to_supplementary_scalar() {
        let v = parse(r#""😀""#, &ParseOptions::default()).unwrap();
        assert_eq!(v.as_str().unwrap(), "\u{1f600}");
    }

    #[test]
    fn big_integer_round_trips_without_precision_loss() {
        let v = parse("123456789012345678901234567890", &ParseOptions::default()).unwrap();
        assert!(v.is_integer());
    }

    #[test]
    fn decimal_routing_when_requested() {
        let options = ParseOptions {
            use_decimal: true,
            ..Default::default()
        };
        let v = parse("1.5", &options).unwrap();
        assert!(matches!(v, Value::Decimal(Decimal::Finite(_))));
    }

    #[test]
    fn error_offset_points_at_bad_token() {
        let err = parse("{\"a\": }", &ParseOptions::default()).unwrap_err();
        assert_eq!(err.offset, 6);
    }

    #[test]
    fn unpaired_surrogate_collapses_to_replacement_char_by_default() {
        let v = parse(r#""\ud800""#, &ParseOptions::default()).unwrap();
        assert_eq!(v.as_str(), Some("\u{fffd}"));
    }

    #[test]
    fn unpaired_surrogate_preserved_as_code_unit_when_permitted() {
        let options = opts(Allow::single(Permission::Surrogates));
        let v = parse(r#""\ud800""#, &options).unwrap();
        assert_eq!(v.as_code_units(), Some(&[0xD800u16][..]));
    }

    #[test]
    fn paired_surrogates_still_combine_even_with_permission() {
        let options = opts(Allow::single(Permission::Surrogates));
        let v = parse("\"😀\"", &options).unwrap();
        assert_eq!(v.as_str(), Some("\u{1f600}"));
    }
}
