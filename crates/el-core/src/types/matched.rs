//! Detected occurrences.
//!
//! A [`Match`] records exactly which bytes of the scanned content were
//! recognized, where they sit in the file, and what kind of pattern produced
//! them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of pattern that produced a [`Match`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum MatchCategory {
    /// A single emoji code point, optionally with a variation selector.
    Emoji,
    /// An emoji carrying a skin-tone modifier.
    ModifiedEmoji,
    /// Several emoji joined with U+200D ZERO WIDTH JOINER.
    ZwjSequence,
    /// A regional-indicator pair (or a lone indicator, depending on policy).
    Flag,
    /// A text emoticon such as `:)`.
    Emoticon,
    /// A user-supplied literal marker.
    Custom,
}

impl MatchCategory {
    /// Returns a short lowercase label for display and reports.
    ///
    /// # Examples
    ///
    /// ```
    /// use el_core::MatchCategory;
    ///
    /// assert_eq!(MatchCategory::ZwjSequence.label(), "zwj_sequence");
    /// ```
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Emoji => "emoji",
            Self::ModifiedEmoji => "modified_emoji",
            Self::ZwjSequence => "zwj_sequence",
            Self::Flag => "flag",
            Self::Emoticon => "emoticon",
            Self::Custom => "custom",
        }
    }

    /// Returns `true` for categories produced by the Unicode sequence matcher.
    #[inline]
    #[must_use]
    pub const fn is_unicode(self) -> bool {
        matches!(
            self,
            Self::Emoji | Self::ModifiedEmoji | Self::ZwjSequence | Self::Flag
        )
    }
}

impl fmt::Display for MatchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single detected occurrence.
///
/// # Field Conventions
///
/// - `byte_start..byte_end` is a half-open byte range into the scanned content
///   and `raw` is exactly those bytes
/// - `line` is 1-indexed
/// - `column` is 1-indexed and counts runes, not bytes
///
/// # Examples
///
/// ```
/// use el_core::{Match, MatchCategory};
///
/// let content = "Hello 😀 world";
/// let m = Match::new(content, 6, 10, MatchCategory::Emoji, 1, 7, 1);
/// assert_eq!(m.raw, "😀");
/// assert!(m.is_consistent_with(content.as_bytes()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Match {
    /// The matched text.
    pub raw: String,
    /// The kind of pattern that matched.
    pub category: MatchCategory,
    /// Offset of the first matched byte.
    pub byte_start: usize,
    /// Offset one past the last matched byte.
    pub byte_end: usize,
    /// Line of the first matched rune (1-indexed).
    pub line: u32,
    /// Column of the first matched rune (1-indexed, in runes).
    pub column: u32,
    /// Number of runes in the match.
    pub rune_length: u32,
}

impl Match {
    /// Creates a match by slicing `raw` out of `content`.
    ///
    /// `byte_start..byte_end` must lie on character boundaries of `content`.
    #[must_use]
    pub fn new(
        content: &str,
        byte_start: usize,
        byte_end: usize,
        category: MatchCategory,
        line: u32,
        column: u32,
        rune_length: u32,
    ) -> Self {
        Self {
            raw: content[byte_start..byte_end].to_owned(),
            category,
            byte_start,
            byte_end,
            line,
            column,
            rune_length,
        }
    }

    /// Length of the match in bytes.
    #[inline]
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        self.byte_end - self.byte_start
    }

    /// Returns `true` if `raw` equals the bytes it claims to cover.
    #[must_use]
    pub fn is_consistent_with(&self, content: &[u8]) -> bool {
        content.get(self.byte_start..self.byte_end) == Some(self.raw.as_bytes())
    }

    /// Returns `true` if the two matches share at least one byte.
    #[inline]
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.byte_start < other.byte_end && other.byte_start < self.byte_end
    }
}
