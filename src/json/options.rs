//! The permission set and reader/writer configuration knobs (§4.4, §4.6,
//! §6 External Interfaces).
//!
//! The teacher enumerates fixed tokens as grouped `&'static str` constants
//! in `constants.rs`; `Allow` follows the same "named, grouped bytes" shape
//! but as a proper bitflag-like set so permissions can be combined and
//! tested with `contains`/`union` instead of string comparison.

/// One permissive-JSON extension a caller may opt into (§4.4).
///
/// Corresponds 1:1 to the `allow` strings accepted by
/// `original_source/src/jsonyx/__init__.py` (`"comments"`,
/// `"duplicate_keys"`, `"missing_commas"`, `"nan_and_infinity"`,
/// `"trailing_comma"`, plus `"surrogates"`, which governs an unpaired
/// surrogate half on both ends: `json::scanner` preserves it as a
/// [`crate::value::Value::SurrogateString`] instead of collapsing it to
/// U+FFFD, and `json::writer` emits it as a raw `\uXXXX` escape instead of
/// rejecting it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Comments,
    DuplicateKeys,
    MissingCommas,
    NanAndInfinity,
    TrailingComma,
    Surrogates,
}

/// An immutable set of [`Permission`]s, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Allow(u8);

impl Allow {
    pub const NOTHING: Allow = Allow(0);

    /// Every syntax extension spec.md names (§4.4): comments, duplicate
    /// keys, missing commas, NaN/Infinity literals, trailing commas, and
    /// tolerance for unpaired surrogates.
    pub const EVERYTHING: Allow = Allow(0b0011_1111);

    #[must_use]
    pub fn single(p: Permission) -> Self {
        Allow(1 << p as u8)
    }

    #[must_use]
    pub fn union(self, other: Allow) -> Allow {
        Allow(self.0 | other.0)
    }

    #[must_use]
    pub fn contains(self, p: Permission) -> bool {
        self.0 & (1 << p as u8) != 0
    }

    #[must_use]
    pub fn with(self, p: Permission) -> Allow {
        self.union(Allow::single(p))
    }

    #[must_use]
    pub fn without(self, p: Permission) -> Allow {
        Allow(self.0 & !(1 << p as u8))
    }
}

impl std::ops::BitOr for Allow {
    type Output = Allow;
    fn bitor(self, rhs: Allow) -> Allow {
        self.union(rhs)
    }
}

impl FromIterator<Permission> for Allow {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        iter.into_iter().fold(Allow::NOTHING, Allow::with)
    }
}

/// Nesting indentation policy (§4.6): absent means one-line output, a
/// space count indents by `n` spaces per level, and `Tab` indents by one
/// tab per level (`original_source`'s `indent="\t"` sentinel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    Spaces(usize),
    Tab,
}

impl Indent {
    /// The literal inserted once per nesting level at `depth`.
    #[must_use]
    fn unit(self) -> String {
        match self {
            Self::Spaces(n) => " ".repeat(n),
            Self::Tab => "\t".to_owned(),
        }
    }
}

/// Configuration for [`crate::json::scanner::Scanner`] (§6 `Decoder`).
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub allow: Allow,
    /// Route fractional/exponent numeric literals through
    /// `bigdecimal::BigDecimal` (§3 invariant: `Decimal` is opt-in) instead
    /// of `f64`.
    pub use_decimal: bool,
    /// Name reported in `SyntaxError::filename` (§4.7), defaults to
    /// `"<string>"` to match `original_source`'s default.
    pub filename: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            allow: Allow::NOTHING,
            use_decimal: false,
            filename: "<string>".to_owned(),
        }
    }
}

/// Configuration for [`crate::json::writer::Writer`] (§4.6, §6 `Encoder`).
#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub allow: Allow,
    /// `None` means the most compact separators (`", "`/`": "`, no
    /// newlines); `Some(indent)` indents nested containers with a newline
    /// after every item (§4.6).
    pub indent: Option<Indent>,
    pub item_separator: String,
    pub key_separator: String,
    /// Escape every non-ASCII scalar value as `\uXXXX` (§4.6).
    pub ensure_ascii: bool,
    pub sort_keys: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            allow: Allow::NOTHING,
            indent: None,
            item_separator: ", ".to_owned(),
            key_separator: ": ".to_owned(),
            ensure_ascii: true,
            sort_keys: false,
        }
    }
}

impl WriteOptions {
    /// The separators to use once `indent` forces a trailing newline
    /// instead of a space after each item (§4.6: indent mode strips the
    /// trailing space from the default `", "` item separator).
    #[must_use]
    pub fn effective_item_separator(&self) -> &str {
        if self.indent.is_some() {
            self.item_separator.trim_end()
        } else {
            &self.item_separator
        }
    }

    /// The newline-plus-indentation literal for nesting `depth`, or `None`
    /// in one-line mode.
    #[must_use]
    pub fn indent_at(&self, depth: usize) -> Option<String> {
        self.indent
            .map(|ind| "\n".to_owned() + &ind.unit().repeat(depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_combines_and_queries() {
        let allow = Allow::single(Permission::Comments).with(Permission::TrailingComma);
        assert!(allow.contains(Permission::Comments));
        assert!(allow.contains(Permission::TrailingComma));
        assert!(!allow.contains(Permission::DuplicateKeys));
    }

    #[test]
    fn allow_without_removes_permission() {
        let allow = Allow::EVERYTHING.without(Permission::Comments);
        assert!(!allow.contains(Permission::Comments));
        assert!(allow.contains(Permission::DuplicateKeys));
    }

    #[test]
    fn indent_mode_strips_trailing_space() {
        let mut opts = WriteOptions {
            indent: Some(Indent::Spaces(2)),
            ..Default::default()
        };
        assert_eq!(opts.effective_item_separator(), ",");
        opts.indent = None;
        assert_eq!(opts.effective_item_separator(), ", ");
    }

    #[test]
    fn tab_indent_unit_is_one_tab_per_level() {
        let opts = WriteOptions {
            indent: Some(Indent::Tab),
            ..Default::default()
        };
        assert_eq!(opts.indent_at(2).unwrap(), "\n\t\t");
    }
}
