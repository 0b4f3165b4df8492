//! Error types for the el-detect crate.
//!
//! This module provides the [`PatternError`] type for errors that can occur
//! while building a [`PatternCatalog`](crate::PatternCatalog).

use camino::Utf8PathBuf;

/// Errors that can occur while validating or compiling a pattern set.
///
/// These only arise at construction time; detection itself never fails.
///
/// # Examples
///
/// ```
/// use el_detect::PatternError;
///
/// let err = PatternError::InvertedRange {
///     category: "emoticons".to_owned(),
///     low: 0x1F64F,
///     high: 0x1F600,
/// };
/// assert!(err.to_string().contains("emoticons"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// A range has `low > high`.
    #[error("range '{category}' is inverted: U+{low:04X} > U+{high:04X}")]
    InvertedRange {
        /// Category name of the offending range.
        category: String,
        /// Lower bound as given.
        low: u32,
        /// Upper bound as given.
        high: u32,
    },

    /// A bound is not a Unicode scalar value.
    #[error("range '{category}' contains U+{value:04X}, which is not a Unicode scalar value")]
    InvalidScalar {
        /// Category name of the offending range.
        category: String,
        /// The rejected value.
        value: u32,
    },

    /// A literal pattern is empty.
    #[error("empty {kind} pattern")]
    EmptyPattern {
        /// Which pattern list contained it.
        kind: &'static str,
    },

    /// Two structural ranges (joiner, skin tone, selectors, regional
    /// indicators, tags) share code points.
    #[error("structural ranges '{first}' and '{second}' overlap")]
    StructuralOverlap {
        /// The first range.
        first: &'static str,
        /// The second range.
        second: &'static str,
    },

    /// A keycap base is not an ASCII character.
    #[error("keycap base '{base}' is not ASCII")]
    InvalidKeycapBase {
        /// The rejected character.
        base: char,
    },

    /// The literal automaton could not be built.
    #[error("failed to build literal matcher: {0}")]
    Automaton(#[from] aho_corasick::BuildError),

    /// A range table file could not be read.
    #[error("failed to read range table {path}: {source}")]
    RangesIo {
        /// The range table path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A range table file is not valid JSON.
    #[error("failed to parse range table {path}: {source}")]
    RangesParse {
        /// The range table path.
        path: Utf8PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}
