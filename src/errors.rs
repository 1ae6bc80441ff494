//! Error and warning types (§7 Error Handling Design).
//!
//! Four families exist because the three failure domains report genuinely
//! different things: a [`SyntaxError`] points at an exact span of JSON
//! source text, a [`FormatError`] points at a byte offset in an RTON
//! stream, and a [`ValueError`] rejects a [`Value`](crate::value::Value)
//! the caller tried to encode. [`Warning`] is never returned as an `Err` —
//! it is pushed to a caller-supplied sink for conditions spec.md treats as
//! non-fatal (§4.3 "repair mode", §4.3 "0x82 printable string").

use std::fmt;

/// A JSON syntax error with enough positional detail to render the
/// three-line-plus-caret excerpt `format_syntax_error` produces (§4.7).
///
/// Mirrors the shape of `original_source/src/jsonyx/__init__.py`'s
/// `JSONSyntaxError`: a flat struct rather than an enum, since every JSON
/// parse failure is reported the same way — a message plus a span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub msg: String,
    pub filename: String,
    /// Code-point offset of the first character in the offending span
    /// (§4.4: original-string code units, matching a Python `str` index —
    /// not a byte offset).
    pub offset: usize,
    /// Code-point offset one past the last character in the offending
    /// span.
    pub end_offset: usize,
    pub lineno: usize,
    pub end_lineno: usize,
    pub colno: usize,
    pub end_colno: usize,
    /// The full source text being parsed, kept so `format_syntax_error` can
    /// re-derive the excerpt without the caller re-supplying it.
    pub text: String,
}

impl SyntaxError {
    /// `offset`/`end_offset` are taken as byte offsets into `text` (what a
    /// scanner naturally tracks while slicing UTF-8), then converted to
    /// code-point offsets for storage.
    #[must_use]
    pub fn new(
        msg: impl Into<String>,
        filename: impl Into<String>,
        text: &str,
        offset: usize,
        end_offset: usize,
    ) -> Self {
        let offset = char_offset(text, offset);
        let end_offset = char_offset(text, end_offset).max(offset);
        let (lineno, colno) = line_col(text, offset);
        let (end_lineno, end_colno) = line_col(text, end_offset);
        Self {
            msg: msg.into(),
            filename: filename.into(),
            offset,
            end_offset,
            lineno,
            end_lineno,
            colno,
            end_colno,
            text: text.to_owned(),
        }
    }
}

/// Converts a byte offset into `text` to a 0-based code-point offset,
/// matching how `original_source` indexes a Python `str` (§4.4).
fn char_offset(text: &str, byte_offset: usize) -> usize {
    let byte_offset = byte_offset.min(text.len());
    text[..byte_offset].chars().count()
}

/// 1-based (line, column) of the code point at code-point `offset` in
/// `text`; column counts code points since the last newline, not bytes.
fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let mut lineno = 1;
    let mut col = 1;
    for ch in text.chars().take(offset) {
        if ch == '\n' {
            lineno += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (lineno, col)
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, line {}, column {})",
            self.msg, self.filename, self.lineno, self.colno
        )
    }
}

impl std::error::Error for SyntaxError {}

/// RTON stream malformation (§4.3), reported at the byte offset where it
/// was detected.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("bad magic at offset {offset}: expected RTON\\x01\\x00\\x00\\x00")]
    BadMagic { offset: usize },

    #[error("unknown type tag 0x{tag:02x} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },

    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("string pool index {index} out of range (pool has {len} entries) at offset {offset}")]
    InterningIndexOutOfRange {
        index: u32,
        len: usize,
        offset: usize,
    },

    #[error("unknown RTID sub-tag 0x{sub_tag:02x} at offset {offset}")]
    UnknownRtidSubTag { sub_tag: u8, offset: usize },

    #[error("list missing required 0xFD frame byte at offset {offset}")]
    MissingListFrame { offset: usize },

    #[error("varint at offset {offset} exceeds maximum supported width")]
    VarintOverflow { offset: usize },

    #[error("invalid UTF-8 in printable string at offset {offset}")]
    InvalidUtf8 { offset: usize },
}

impl FormatError {
    /// The byte offset where the malformation was detected, for callers
    /// that want to report position without matching on the variant.
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::BadMagic { offset }
            | Self::UnknownTag { offset, .. }
            | Self::UnexpectedEof { offset }
            | Self::InterningIndexOutOfRange { offset, .. }
            | Self::UnknownRtidSubTag { offset, .. }
            | Self::MissingListFrame { offset }
            | Self::VarintOverflow { offset }
            | Self::InvalidUtf8 { offset } => *offset,
        }
    }
}

/// Raised when an encoder is asked to serialize something the target
/// format can't represent (§7).
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("{0} is not allowed by the current permission set")]
    NotAllowed(String),

    #[error("{0} is not serializable to JSON")]
    NotSerializable(String),

    #[error("keys must be strings, got {0}")]
    KeyMustBeString(String),
}

/// Non-fatal conditions pushed to a caller-supplied sink rather than
/// aborting the parse (§7, §4.3 repair mode).
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Warning {
    #[error("printable string at offset {offset} declared {expected} chars, decoded {found}")]
    CharCountMismatch {
        expected: u32,
        found: u32,
        offset: usize,
    },

    #[error("list at offset {offset} declared length {expected}, found {found} elements")]
    ListLengthMismatch {
        expected: u32,
        found: usize,
        offset: usize,
    },

    #[error("repaired truncated input at offset {offset}: treating as end of document")]
    RepairedTruncation { offset: usize },

    #[error("repaired unknown tag 0x{tag:02x} at offset {offset}: skipped remaining input")]
    RepairedUnknownTag { tag: u8, offset: usize },
}

/// The crate-level error type unifying all three fatal families.
///
/// A single `Result<T>` alias over this enum is what `Decoder`/`Encoder`
/// and the free functions in `lib.rs` return (§6).
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error("I/O error: {0}")]
    Io(String),
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Syntax(a), Self::Syntax(b)) => a == b,
            (Self::Format(a), Self::Format(b)) => a == b,
            (Self::Value(a), Self::Value(b)) => a == b,
            (Self::Io(a), Self::Io(b)) => a == b,
            _ => false,
        }
    }
}

/// The crate-wide `Result` alias (§6).
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_counts_from_one() {
        assert_eq!(line_col("abc", 0), (1, 1));
        assert_eq!(line_col("a\nbc", 2), (2, 1));
        assert_eq!(line_col("a\nbc", 3), (2, 2));
    }

    #[test]
    fn offsets_count_code_points_not_bytes() {
        // "é" is 2 bytes (0xC3 0xA9) but one code point; the byte offset
        // just past it must collapse to code-point offset 1, not 2.
        let err = SyntaxError::new("msg", "<string>", "é, b", 2, 2);
        assert_eq!(err.offset, 1);
        assert_eq!(err.colno, 2);
    }

    #[test]
    fn char_offset_counts_code_points_before_byte_offset() {
        assert_eq!(char_offset("éab", 0), 0);
        assert_eq!(char_offset("éab", 2), 1);
        assert_eq!(char_offset("éab", 3), 2);
    }

    #[test]
    fn syntax_error_display_includes_position() {
        let err = SyntaxError::new("Expecting value", "<string>", "a\nb", 2, 3);
        assert_eq!(err.lineno, 2);
        assert_eq!(err.colno, 1);
        assert!(err.to_string().contains("line 2, column 1"));
    }

    #[test]
    fn format_error_offset_accessor() {
        let err = FormatError::UnknownTag { tag: 0xAB, offset: 42 };
        assert_eq!(err.offset(), 42);
    }
}
