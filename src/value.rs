//! The value model shared by both codecs (§3, §4.5).
//!
//! A [`Value`] is a tagged sum of everything either decoder can produce:
//! `Null`, `Bool`, arbitrary-precision `Integer`, IEEE-754 `Real`,
//! arbitrary-precision `Decimal`, `String`, the identity-hashed
//! `DuplicateKey` wrapper, `Array` and `Object`. Objects are stored as
//! `Vec<(ObjectKey, Value)>` rather than a `HashMap` so insertion order is
//! preserved without extra bookkeeping — the same choice the teacher makes
//! for `MapValue::Map`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};

/// Ordered, duplicate-tolerant object entries (§3 invariant 1).
pub type Object = Vec<(ObjectKey, Value)>;

/// Ordered sequence of values (§3).
pub type Array = Vec<Value>;

/// An object key: either a plain string or a [`DuplicateKey`] wrapper.
///
/// Plain keys are unique under byte equality unless `duplicate_keys` is
/// permitted, in which case repeats are wrapped so the object can retain
/// every occurrence (§3 invariant 1, §4.4 "Object").
#[derive(Debug, Clone)]
pub enum ObjectKey {
    Plain(String),
    Duplicate(DuplicateKey),
}

impl ObjectKey {
    /// The key's textual form, ignoring duplicate-identity.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Plain(s) => s,
            Self::Duplicate(d) => &d.text,
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static DUPLICATE_KEY_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A `String` wrapper with identity-based equality, allowing several equal
/// keys to coexist in an ordered [`Object`] (§3, §8 "Invariants").
///
/// Two `DuplicateKey`s built from the same text are never equal to each
/// other — each carries a distinct identity stamped at construction time,
/// mirroring CPython's per-object `id()`-based hash that the original
/// `FakeDict` trick relied on (§9 "FakeDict trick").
#[derive(Debug, Clone)]
pub struct DuplicateKey {
    text: String,
    identity: u64,
}

impl DuplicateKey {
    /// Wrap `text` with a fresh identity, distinct from every other
    /// `DuplicateKey` ever constructed (including ones wrapping equal text).
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            identity: DUPLICATE_KEY_COUNTER.fetch_add(1, Ordering::Relaxed),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for DuplicateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl PartialEq for DuplicateKey {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for DuplicateKey {}

impl Hash for DuplicateKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

/// Arbitrary-precision decimal with the four states `Decimal` can hold
/// (§3): a finite value, signed infinity, quiet NaN, and signaling NaN.
///
/// `bigdecimal::BigDecimal` only models finite values, so the non-finite
/// states are tracked alongside it rather than folded into it.
#[derive(Debug, Clone)]
pub enum Decimal {
    Finite(BigDecimal),
    Infinity { negative: bool },
    QNaN,
    /// Never produced by decoding (§3 invariant 2) — only reachable via a
    /// user-constructed `Value`, and always rejected by the writer (§4.6,
    /// §9 "Decimal signaling-NaN").
    SNaN,
}

impl Decimal {
    #[must_use]
    pub fn is_finite(&self) -> bool {
        matches!(self, Self::Finite(_))
    }

    #[must_use]
    pub fn is_snan(&self) -> bool {
        matches!(self, Self::SNaN)
    }

    #[must_use]
    pub fn is_qnan(&self) -> bool {
        matches!(self, Self::QNaN)
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Finite(a), Self::Finite(b)) => a == b,
            (Self::Infinity { negative: a }, Self::Infinity { negative: b }) => a == b,
            (Self::QNaN, Self::QNaN) | (Self::SNaN, Self::SNaN) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(d) => d.fmt(f),
            Self::Infinity { negative: true } => f.write_str("-Infinity"),
            Self::Infinity { negative: false } => f.write_str("Infinity"),
            Self::QNaN | Self::SNaN => f.write_str("NaN"),
        }
    }
}

/// Any value either codec can produce or an encoder can be asked to emit
/// (§3).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    /// Arbitrary-precision signed integer (§3 invariant 3: never silently
    /// widened to `Real`, regardless of magnitude).
    Integer(BigInt),
    /// IEEE-754 double (§3 invariant 4: only literals with a fraction or
    /// exponent decode here).
    Real(f64),
    Decimal(Decimal),
    /// Unicode scalar values.
    String(String),
    /// A string containing at least one unpaired surrogate half
    /// (U+D800-DFFF) that cannot be represented as a `char`, produced only
    /// under the `surrogates` permission (§3, §4.4, §4.6). Stored as raw
    /// UTF-16 code units rather than `String` so the surrogate round-trips
    /// instead of collapsing to U+FFFD.
    SurrogateString(Vec<u16>),
    DuplicateKey(DuplicateKey),
    Array(Array),
    Object(Object),
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    #[must_use]
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Integer(_))
    }

    #[must_use]
    pub fn is_real(&self) -> bool {
        matches!(self, Self::Real(_))
    }

    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(
            self,
            Self::String(_) | Self::DuplicateKey(_) | Self::SurrogateString(_)
        )
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// The string content of a `String` or `DuplicateKey` value, or `None`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::DuplicateKey(d) => Some(d.as_str()),
            _ => None,
        }
    }

    /// The raw UTF-16 code units of a `SurrogateString`, or `None`.
    #[must_use]
    pub fn as_code_units(&self) -> Option<&[u16]> {
        match self {
            Self::SurrogateString(units) => Some(units),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Look up a key in an `Object` value by text, ignoring duplicate
    /// identity and returning the first match (insertion order).
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object()?
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
    }

    /// Whether an `Integer`'s magnitude would survive an `f64` round-trip
    /// without loss (§3 invariant 3: decoding never widens on the strength
    /// of this — it stays `Integer` either way). `None` for non-`Integer`
    /// values.
    #[must_use]
    pub fn integer_fits_f64_losslessly(&self) -> Option<bool> {
        match self {
            Self::Integer(i) => {
                let as_f64 = i.to_f64()?;
                Some(BigInt::from_f64(as_f64).as_ref() == Some(i))
            }
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(BigInt::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}
