//! BOM/zero-pattern encoding detection and decode-to-text (§4.2 "Encoding
//! Detector").
//!
//! Grounded in `original_source/src/jsonyx/__init__.py::auto_decode`'s BOM
//! checks and zero-byte heuristic, using `encoding_rs` for the UTF-8/UTF-16
//! transcoding the way `other_examples/.../sg-core-src-encoding.rs` uses it
//! for its own BOM-driven detector; UTF-32 has no `encoding_rs` decoder, so
//! it is transcoded by hand, four bytes at a time.

use encoding_rs::{UTF_16BE, UTF_16LE};

use crate::errors::Error;

const BOM_UTF8: &[u8] = &[0xEF, 0xBB, 0xBF];
const BOM_UTF16_BE: &[u8] = &[0xFE, 0xFF];
const BOM_UTF16_LE: &[u8] = &[0xFF, 0xFE];
const BOM_UTF32_BE: &[u8] = &[0x00, 0x00, 0xFE, 0xFF];
const BOM_UTF32_LE: &[u8] = &[0xFF, 0xFE, 0x00, 0x00];

/// The encoding an input buffer was classified as (§4.2 steps 1-5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf8Sig,
    Utf16Be,
    Utf16Le,
    Utf32Be,
    Utf32Le,
}

/// Classify `b` per §4.2's BOM-then-zero-pattern procedure, without
/// decoding it.
#[must_use]
pub fn detect(b: &[u8]) -> Encoding {
    if b.starts_with(BOM_UTF32_BE) {
        return Encoding::Utf32Be;
    }
    if b.starts_with(BOM_UTF32_LE) {
        return Encoding::Utf32Le;
    }
    if b.starts_with(BOM_UTF16_BE) {
        return Encoding::Utf16Be;
    }
    if b.starts_with(BOM_UTF16_LE) {
        return Encoding::Utf16Le;
    }
    if b.starts_with(BOM_UTF8) {
        return Encoding::Utf8Sig;
    }
    if b.len() >= 4 {
        if b[0] == 0 {
            // 00 00 .. .. -> utf-32-be; 00 XX .. .. -> utf-16-be
            return if b[1] != 0 {
                Encoding::Utf16Be
            } else {
                Encoding::Utf32Be
            };
        }
        if b[1] == 0 {
            // XX 00 00 00 -> utf-32-le; XX 00 ?? ?? -> utf-16-le
            return if b[2] != 0 || b[3] != 0 {
                Encoding::Utf16Le
            } else {
                Encoding::Utf32Le
            };
        }
    } else if b.len() == 2 {
        if b[0] == 0 {
            return Encoding::Utf16Be;
        }
        if b[1] == 0 {
            return Encoding::Utf16Le;
        }
    }
    Encoding::Utf8
}

/// Detect `b`'s encoding and decode it to text (§4.2).
///
/// A lone surrogate code unit produced by malformed UTF-16/UTF-32 input
/// bytes is substituted with U+FFFD here — this is encoding-layer input
/// repair, not the `surrogates` permission (§4.4, §4.6), which governs
/// surrogates spelled out as `\uXXXX` escapes in already-decoded JSON text
/// and is implemented in `json::scanner`/`json::writer` via
/// [`crate::value::Value::SurrogateString`].
#[must_use]
pub fn auto_decode(b: &[u8]) -> String {
    match detect(b) {
        Encoding::Utf8 => String::from_utf8_lossy(b).into_owned(),
        Encoding::Utf8Sig => String::from_utf8_lossy(&b[BOM_UTF8.len()..]).into_owned(),
        Encoding::Utf16Be => {
            let (text, _, _) = UTF_16BE.decode(b);
            text.into_owned()
        }
        Encoding::Utf16Le => {
            let (text, _, _) = UTF_16LE.decode(b);
            text.into_owned()
        }
        Encoding::Utf32Be => decode_utf32(b, u32::from_be_bytes),
        Encoding::Utf32Le => decode_utf32(b, u32::from_le_bytes),
    }
}

fn decode_utf32(b: &[u8], from_bytes: fn([u8; 4]) -> u32) -> String {
    let mut out = String::with_capacity(b.len() / 4);
    for chunk in b.chunks(4) {
        if chunk.len() < 4 {
            break;
        }
        let mut buf = [0u8; 4];
        buf.copy_from_slice(chunk);
        let scalar = from_bytes(buf);
        out.push(char::from_u32(scalar).unwrap_or(char::REPLACEMENT_CHARACTER));
    }
    out
}

/// Reject a text string beginning with U+FEFF, matching
/// `Decoder.loads`'s `"Unexpected UTF-8 BOM"` check when the caller already
/// supplied decoded text rather than raw bytes (§4.2).
pub fn reject_leading_bom(text: &str, filename: &str) -> crate::errors::Result<()> {
    if text.starts_with('\u{feff}') {
        return Err(Error::Syntax(crate::errors::SyntaxError::new(
            "Unexpected UTF-8 BOM",
            filename,
            text,
            0,
            1,
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_utf8_bom() {
        let mut b = BOM_UTF8.to_vec();
        b.extend_from_slice(b"hi");
        assert_eq!(detect(&b), Encoding::Utf8Sig);
        assert_eq!(auto_decode(&b), "hi");
    }

    #[test]
    fn detects_utf16_le_without_bom() {
        // "a" in utf-16-le: 61 00, then a second char to reach len>=4.
        let b = [0x61, 0x00, 0x62, 0x00];
        assert_eq!(detect(&b), Encoding::Utf16Le);
        assert_eq!(auto_decode(&b), "ab");
    }

    #[test]
    fn detects_utf16_be_without_bom() {
        let b = [0x00, 0x61, 0x00, 0x62];
        assert_eq!(detect(&b), Encoding::Utf16Be);
        assert_eq!(auto_decode(&b), "ab");
    }

    #[test]
    fn roundtrips_through_each_declared_encoding() {
        let text = "hello \u{1f600}";
        let utf16_le: Vec<u8> = text
            .encode_utf16()
            .flat_map(|u| u.to_le_bytes())
            .collect();
        assert_eq!(auto_decode(&utf16_le), text);

        let utf16_be: Vec<u8> = text
            .encode_utf16()
            .flat_map(|u| u.to_be_bytes())
            .collect();
        assert_eq!(auto_decode(&utf16_be), text);

        let utf32_le: Vec<u8> = text
            .chars()
            .flat_map(|c| (c as u32).to_le_bytes())
            .collect();
        assert_eq!(auto_decode(&utf32_le), text);
    }

    #[test]
    fn defaults_to_utf8_for_short_ascii() {
        assert_eq!(detect(b"{}"), Encoding::Utf8);
    }

    #[test]
    fn rejects_leading_bom_in_text() {
        let err = reject_leading_bom("\u{feff}{}", "<string>");
        assert!(err.is_err());
    }
}
