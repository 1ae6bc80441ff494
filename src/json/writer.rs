//! JSON(YX) writer (§4.6 "JSON Writer").
//!
//! Grounded in `original_source/src/jsonyx/__init__.py::Encoder`'s
//! `encode_decimal` closure (signaling-NaN always rejected, quiet-NaN
//! always rendered `NaN`, `nan_and_infinity` gating the rest) and in the
//! `indent`/`item_separator`/`key_separator` wiring that
//! `Encoder.__init__` does before constructing its writer — here expressed
//! as a `Writer` struct over `ParseOptions`'s sibling, `WriteOptions`
//! (`src/json/options.rs`), writing directly to a `String` rather than a
//! `SupportsWrite[str]` since this crate has no streaming-writer non-goal
//! to satisfy otherwise (§1 Non-goals: no streaming of partial documents).

use crate::errors::ValueError;
use crate::json::options::{Permission, WriteOptions};
use crate::value::{Decimal, Object, ObjectKey, Value};

type WriteResult<T> = Result<T, ValueError>;

/// Serialize `value` to a JSON(YX) string per `options` (§4.6, §6 `dumps`).
pub fn dumps(value: &Value, options: &WriteOptions) -> WriteResult<String> {
    let mut out = String::new();
    Writer::new(options).write_value(value, 0, &mut out)?;
    Ok(out)
}

struct Writer<'a> {
    options: &'a WriteOptions,
}

impl<'a> Writer<'a> {
    fn new(options: &'a WriteOptions) -> Self {
        Self { options }
    }

    fn write_value(&self, value: &Value, depth: usize, out: &mut String) -> WriteResult<()> {
        match value {
            Value::Null => out.push_str("null"),
            Value::Bool(true) => out.push_str("true"),
            Value::Bool(false) => out.push_str("false"),
            Value::Integer(i) => out.push_str(&i.to_string()),
            Value::Real(f) => self.write_real(*f, out)?,
            Value::Decimal(d) => self.write_decimal(d, out)?,
            Value::String(s) => self.write_string(s, out)?,
            Value::SurrogateString(units) => self.write_surrogate_string(units, out)?,
            Value::DuplicateKey(d) => self.write_string(d.as_str(), out)?,
            Value::Array(items) => self.write_array(items, depth, out)?,
            Value::Object(entries) => self.write_object(entries, depth, out)?,
        }
        Ok(())
    }

    /// Real finite values always keep a decimal point (`0.0`, never `0`)
    /// (§4.6 "Numeric emission"); non-finite values route through the
    /// same `nan_and_infinity` gate as `Decimal`.
    fn write_real(&self, f: f64, out: &mut String) -> WriteResult<()> {
        if f.is_nan() {
            return self.write_non_finite("NaN", out);
        }
        if f.is_infinite() {
            return self.write_non_finite(if f < 0.0 { "-Infinity" } else { "Infinity" }, out);
        }
        let mut s = format!("{f}");
        if !s.contains('.') && !s.contains('e') && !s.contains('E') {
            s.push_str(".0");
        }
        out.push_str(&s);
        Ok(())
    }

    fn write_non_finite(&self, literal: &str, out: &mut String) -> WriteResult<()> {
        if !self.options.allow.contains(Permission::NanAndInfinity) {
            return Err(ValueError::NotAllowed(literal.to_owned()));
        }
        out.push_str(literal);
        Ok(())
    }

    /// Decimal signaling-NaN is always rejected, even with
    /// `nan_and_infinity` (§3 invariant 2, §4.6, §9 "Decimal
    /// signaling-NaN").
    fn write_decimal(&self, d: &Decimal, out: &mut String) -> WriteResult<()> {
        match d {
            Decimal::SNaN => Err(ValueError::NotSerializable("sNaN".to_owned())),
            Decimal::QNaN => self.write_non_finite("NaN", out),
            Decimal::Infinity { negative } => {
                self.write_non_finite(if *negative { "-Infinity" } else { "Infinity" }, out)
            }
            Decimal::Finite(dec) => {
                out.push_str(&dec.to_string());
                Ok(())
            }
        }
    }

    /// Always-quoted string emission with the control/`"`/`\` escapes and
    /// `ensure_ascii` policy of §4.6.
    fn write_string(&self, s: &str, out: &mut String) -> WriteResult<()> {
        out.push('"');
        for ch in s.chars() {
            self.write_string_char(ch, out);
        }
        out.push('"');
        Ok(())
    }

    fn write_string_char(&self, ch: char, out: &mut String) {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c if self.options.ensure_ascii && (c as u32) > 0x7F => self.write_ascii_escaped(c, out),
            c => out.push(c),
        }
    }

    /// Unpaired-surrogate string emission (§4.6 "surrogates" permission,
    /// §3, §4.4): a lone surrogate has no valid UTF-8 encoding, so it is
    /// always emitted as a raw `\uXXXX` escape when permitted, and rejected
    /// outright otherwise — there is no `ensure_ascii`-off fallback for it.
    fn write_surrogate_string(&self, units: &[u16], out: &mut String) -> WriteResult<()> {
        if !self.options.allow.contains(Permission::Surrogates) {
            return Err(ValueError::NotAllowed("surrogates are not allowed".to_owned()));
        }
        out.push('"');
        for &unit in units {
            if (0xD800..=0xDFFF).contains(&unit) {
                out.push_str(&format!("\\u{unit:04x}"));
            } else {
                // A well-formed code unit that happened to sit alongside a
                // lone surrogate in the same literal; from_u32 is
                // infallible here since it is outside the surrogate range.
                self.write_string_char(char::from_u32(u32::from(unit)).unwrap(), out);
            }
        }
        out.push('"');
        Ok(())
    }

    fn write_ascii_escaped(&self, c: char, out: &mut String) {
        let cp = c as u32;
        if cp > 0xFFFF {
            let v = cp - 0x10000;
            let hi = 0xD800 + (v >> 10);
            let lo = 0xDC00 + (v & 0x3FF);
            out.push_str(&format!("\\u{hi:04x}\\u{lo:04x}"));
        } else {
            out.push_str(&format!("\\u{cp:04x}"));
        }
    }

    fn write_array(&self, items: &[Value], depth: usize, out: &mut String) -> WriteResult<()> {
        if items.is_empty() {
            out.push_str("[]");
            return Ok(());
        }
        out.push('[');
        let inner_indent = self.options.indent_at(depth + 1);
        let sep = self.options.effective_item_separator().to_owned();
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(&sep);
            }
            if let Some(ind) = &inner_indent {
                out.push_str(ind);
            }
            self.write_value(item, depth + 1, out)?;
        }
        if let Some(ind) = self.options.indent_at(depth) {
            out.push_str(&ind);
        }
        out.push(']');
        Ok(())
    }

    fn write_object(&self, entries: &Object, depth: usize, out: &mut String) -> WriteResult<()> {
        if entries.is_empty() {
            out.push_str("{}");
            return Ok(());
        }
        let mut ordered: Vec<&(ObjectKey, Value)> = entries.iter().collect();
        if self.options.sort_keys {
            ordered.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        }
        out.push('{');
        let inner_indent = self.options.indent_at(depth + 1);
        let sep = self.options.effective_item_separator().to_owned();
        for (i, (key, value)) in ordered.into_iter().enumerate() {
            if i > 0 {
                out.push_str(&sep);
            }
            if let Some(ind) = &inner_indent {
                out.push_str(ind);
            }
            self.write_string(key.as_str(), out)?;
            out.push_str(&self.options.key_separator);
            self.write_value(value, depth + 1, out)?;
        }
        if let Some(ind) = self.options.indent_at(depth) {
            out.push_str(&ind);
        }
        out.push('}');
        Ok(())
    }
}
