//! # rtonyx — RTON decoder and permissive/strict JSON (JSONYX) codec
//!
//! Two codecs for the PvZ2 modding ecosystem, sharing one value model
//! (§3, [`value::Value`]):
//!
//! - [`rton`]: decodes the proprietary binary RTON save/config container
//!   into a [`Value`]. Decode-only — this crate never writes RTON.
//! - [`json`]: a permissive JSON reader (comments, trailing/missing
//!   commas, duplicate keys, `NaN`/`Infinity`, `Decimal` numbers,
//!   surrogate passthrough) paired with a strict JSON writer.
//!
//! ```no_run
//! use rtonyx::{loads, dumps, ParseOptions};
//!
//! let value = loads(b"{\"hp\": 100}", &ParseOptions::default()).unwrap();
//! let text = dumps(&value, &Default::default()).unwrap();
//! assert_eq!(text, "{\"hp\": 100}");
//! ```

pub mod byte_source;
pub mod encoding;
pub mod error_report;
pub mod errors;
pub mod json;
pub mod rton;
pub mod value;

use std::fs;
use std::io::Write;
use std::path::Path;

pub use error_report::{excerpt, format_syntax_error, Excerpt};
pub use errors::{Error, FormatError, Result, SyntaxError, ValueError, Warning};
pub use json::options::{Allow, Indent, ParseOptions, Permission, WriteOptions};
pub use rton::RtonOptions;
pub use value::{Array, Decimal, DuplicateKey, Object, ObjectKey, Value};

// ---- JSON decode API (§6 "Decoder API") --------------------------------

/// Parse already-decoded JSON text (§6 `loads`).
///
/// Rejects a leading U+FEFF the way `Decoder.loads` does when the caller
/// hands it text rather than bytes (§4.2): callers working from raw bytes
/// should use [`loads`] instead, which detects and strips a BOM first.
pub fn loads_str(text: &str, options: &ParseOptions) -> Result<Value> {
    encoding::reject_leading_bom(text, &options.filename)?;
    json::scanner::parse(text, options).map_err(Error::Syntax)
}

/// Detect `bytes`'s encoding (§4.2), decode it to text, and parse it as
/// JSON(YX) (§6 `loads`).
pub fn loads(bytes: &[u8], options: &ParseOptions) -> Result<Value> {
    let text = encoding::auto_decode(bytes);
    json::scanner::parse(&text, options).map_err(Error::Syntax)
}

/// Read `path` and parse it as JSON(YX) (§6 `load`).
///
/// `options.filename` is overridden with `path`'s display form so
/// resulting [`SyntaxError`]s name the file that was actually read.
pub fn load(path: impl AsRef<Path>, options: &ParseOptions) -> Result<Value> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| Error::Io(e.to_string()))?;
    let mut options = options.clone();
    options.filename = path.display().to_string();
    loads(&bytes, &options)
}

/// A reusable JSON(YX) reader bound to one [`ParseOptions`] (§6
/// `Decoder(allow, decode, use_decimal).load / .loads`).
///
/// The source's `decode` parameter (a pluggable object-pairs hook) has no
/// counterpart here: this crate always decodes straight into [`Value`], so
/// there is nothing to plug in. `allow` and `use_decimal` are carried via
/// [`ParseOptions`] instead of being spelled out as separate constructor
/// arguments.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    pub options: ParseOptions,
}

impl Decoder {
    #[must_use]
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    pub fn loads(&self, bytes: &[u8]) -> Result<Value> {
        loads(bytes, &self.options)
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<Value> {
        load(path, &self.options)
    }
}

// ---- JSON encode API (§6 "Encoder API") --------------------------------

/// Serialize `value` to a JSON(YX) string (§6 `dumps`).
pub fn dumps(value: &Value, options: &WriteOptions) -> Result<String> {
    json::writer::dumps(value, options).map_err(Error::Value)
}

/// Serialize `value` to `sink` (§6 `dump`), writing in document order with
/// no buffering beyond the sink's own (§5).
pub fn dump(value: &Value, sink: &mut impl Write, options: &WriteOptions) -> Result<()> {
    let text = dumps(value, options)?;
    sink.write_all(text.as_bytes())
        .map_err(|e| Error::Io(e.to_string()))
}

/// A reusable JSON(YX) writer bound to one [`WriteOptions`] (§6
/// `Encoder(...).dump / .dumps`).
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    pub options: WriteOptions,
}

impl Encoder {
    #[must_use]
    pub fn new(options: WriteOptions) -> Self {
        Self { options }
    }

    pub fn dumps(&self, value: &Value) -> Result<String> {
        dumps(value, &self.options)
    }

    pub fn dump(&self, value: &Value, sink: &mut impl Write) -> Result<()> {
        dump(value, sink, &self.options)
    }
}

// ---- RTON decode API (§6 "RTON file format", §1 decode-only) ----------

/// Decode a complete RTON byte buffer into a [`Value`], returning any
/// non-fatal [`Warning`]s alongside it (§4.3).
pub fn loads_rton(bytes: &[u8], options: &RtonOptions) -> Result<(Value, Vec<Warning>)> {
    rton::decode(bytes, options).map_err(Error::Format)
}

/// Read `path` and decode it as RTON (§4.3, §4.1 "Byte Source").
pub fn load_rton(path: impl AsRef<Path>, options: &RtonOptions) -> Result<(Value, Vec<Warning>)> {
    let bytes = fs::read(path).map_err(|e| Error::Io(e.to_string()))?;
    loads_rton(&bytes, options)
}
