//! Binary/text classification.
//!
//! Content is decoded as a lossy UTF-8 rune stream. It is binary if it holds a
//! NUL byte, if too many units are malformed, or if too many runes are
//! control characters.

use std::fmt;

use bstr::ByteSlice;
use el_core::ClassifierConfig;

/// Why content was classified as binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryReason {
    /// A NUL byte is present.
    NulByte,
    /// The share of malformed UTF-8 units exceeds the tolerance.
    InvalidUtf8,
    /// The share of control characters exceeds the threshold.
    ControlCharacters,
}

impl BinaryReason {
    /// Returns a short description.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NulByte => "contains NUL byte",
            Self::InvalidUtf8 => "too much invalid UTF-8",
            Self::ControlCharacters => "too many control characters",
        }
    }
}

impl fmt::Display for BinaryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Safe to scan.
    Text,
    /// Must be skipped.
    Binary(BinaryReason),
}

impl Classification {
    /// Returns `true` for [`Classification::Text`].
    #[inline]
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Text)
    }
}

/// Classifies content as text or binary.
///
/// # Examples
///
/// ```
/// use el_core::ClassifierConfig;
/// use el_detect::{BinaryReason, Classification, TextClassifier};
///
/// let classifier = TextClassifier::new(ClassifierConfig::default());
/// assert_eq!(classifier.classify("héllo 😀".as_bytes()), Classification::Text);
/// assert_eq!(
///     classifier.classify(&[0, 0, 0, 0]),
///     Classification::Binary(BinaryReason::NulByte)
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TextClassifier {
    config: ClassifierConfig,
}

impl TextClassifier {
    /// Creates a classifier with the given thresholds.
    #[must_use]
    pub const fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// The thresholds in use.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classifies `content`. Empty content is text.
    #[must_use]
    pub fn classify(&self, content: &[u8]) -> Classification {
        if content.is_empty() {
            return Classification::Text;
        }
        if content.find_byte(0).is_some() {
            return Classification::Binary(BinaryReason::NulByte);
        }

        let mut units = 0_usize;
        let mut malformed = 0_usize;
        let mut control = 0_usize;
        for (start, end, c) in content.char_indices() {
            units += 1;
            if c == '\u{FFFD}' && &content[start..end] != "\u{FFFD}".as_bytes() {
                malformed += 1;
            } else if is_control(c) {
                control += 1;
            }
        }

        let share = |count: usize| count as f64 / units as f64;
        if share(malformed) > self.config.invalid_utf8_tolerance {
            Classification::Binary(BinaryReason::InvalidUtf8)
        } else if share(control) > self.config.control_char_threshold {
            Classification::Binary(BinaryReason::ControlCharacters)
        } else {
            Classification::Text
        }
    }
}

/// C0 controls other than tab, LF, and CR, plus DEL.
fn is_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{7F}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> TextClassifier {
        TextClassifier::default()
    }

    #[test]
    fn test_empty_is_text() {
        assert_eq!(classifier().classify(b""), Classification::Text);
    }

    #[test]
    fn test_nul_byte_is_binary() {
        assert_eq!(
            classifier().classify(b"text\0more"),
            Classification::Binary(BinaryReason::NulByte)
        );
    }

    #[test]
    fn test_whitespace_controls_are_text() {
        assert!(classifier().classify(b"a\tb\r\nc\n").is_text());
    }

    #[test]
    fn test_invalid_utf8_over_tolerance() {
        let content = b"ab\xFF\xFE\xFDcd";
        assert_eq!(
            classifier().classify(content),
            Classification::Binary(BinaryReason::InvalidUtf8)
        );
    }

    #[test]
    fn test_invalid_utf8_under_tolerance() {
        let mut content = vec![b'a'; 100];
        content[50] = 0xFF;
        assert!(classifier().classify(&content).is_text());
    }

    #[test]
    fn test_zero_tolerance_rejects_any_malformed() {
        let strict = TextClassifier::new(ClassifierConfig {
            invalid_utf8_tolerance: 0.0,
            ..ClassifierConfig::default()
        });
        let mut content = vec![b'a'; 100];
        content[50] = 0xFF;
        assert!(!strict.classify(&content).is_text());
    }

    #[test]
    fn test_control_characters_over_threshold() {
        let content = b"\x01\x02\x03abcdefg";
        assert_eq!(
            classifier().classify(content),
            Classification::Binary(BinaryReason::ControlCharacters)
        );
    }

    #[test]
    fn test_escape_sequences_under_threshold() {
        let content = b"\x1b[31mred text here, plenty of it\x1b[0m";
        assert!(classifier().classify(content).is_text());
    }

    #[test]
    fn test_multibyte_text_is_text() {
        assert!(classifier().classify("日本語 ✅ 😀 café".as_bytes()).is_text());
    }

    #[test]
    fn test_literal_replacement_character_is_not_malformed() {
        assert!(classifier().classify("\u{FFFD}\u{FFFD}".as_bytes()).is_text());
    }

    #[test]
    fn test_binary_reason_display() {
        assert_eq!(BinaryReason::NulByte.to_string(), "contains NUL byte");
    }
}
