//! Bundled Unicode emoji range table.
//!
//! The table is plain data, kept apart from the matching engine so it can be
//! updated with new Unicode releases or replaced wholesale by a JSON file
//! (see [`load_ranges`]). Ranges may overlap the structural code points
//! (skin tones and regional indicators live inside the pictograph blocks);
//! the catalog classifies structural code points first. Keycap sequences
//! (`1️⃣`) start with an ASCII character, so they are recognized by the
//! catalog's keycap settings rather than through this table.

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::PatternError;

/// Unicode version the bundled table was assembled against.
pub const UNICODE_RANGES_VERSION: &str = "15.1";

/// Bundled ranges as `(low, high, category)`, inclusive on both ends.
pub const DEFAULT_RANGES: &[(u32, u32, &str)] = &[
    (0x203C, 0x203C, "general_punctuation"),
    (0x2049, 0x2049, "general_punctuation"),
    (0x2139, 0x2139, "letterlike_symbols"),
    (0x231A, 0x231B, "misc_technical"),
    (0x2328, 0x2328, "misc_technical"),
    (0x23CF, 0x23CF, "misc_technical"),
    (0x23E9, 0x23F3, "misc_technical"),
    (0x23F8, 0x23FA, "misc_technical"),
    (0x24C2, 0x24C2, "enclosed_alphanumerics"),
    (0x25AA, 0x25AB, "geometric_shapes"),
    (0x25B6, 0x25B6, "geometric_shapes"),
    (0x25C0, 0x25C0, "geometric_shapes"),
    (0x25FB, 0x25FE, "geometric_shapes"),
    (0x2600, 0x26FF, "misc_symbols"),
    (0x2700, 0x27BF, "dingbats"),
    (0x2934, 0x2935, "supplemental_arrows"),
    (0x2B05, 0x2B07, "misc_symbols_arrows"),
    (0x2B1B, 0x2B1C, "misc_symbols_arrows"),
    (0x2B50, 0x2B50, "misc_symbols_arrows"),
    (0x2B55, 0x2B55, "misc_symbols_arrows"),
    (0x3030, 0x3030, "cjk_symbols"),
    (0x303D, 0x303D, "cjk_symbols"),
    (0x3297, 0x3297, "enclosed_cjk"),
    (0x3299, 0x3299, "enclosed_cjk"),
    (0x1F000, 0x1F02F, "mahjong_tiles"),
    (0x1F0A0, 0x1F0FF, "playing_cards"),
    (0x1F100, 0x1F1FF, "enclosed_alphanumeric_supplement"),
    (0x1F200, 0x1F2FF, "enclosed_ideographic_supplement"),
    (0x1F300, 0x1F5FF, "misc_symbols_pictographs"),
    (0x1F600, 0x1F64F, "emoticons"),
    (0x1F680, 0x1F6FF, "transport_map"),
    (0x1F780, 0x1F7FF, "geometric_shapes_extended"),
    (0x1F900, 0x1F9FF, "supplemental_symbols_pictographs"),
    (0x1FA70, 0x1FAFF, "symbols_pictographs_extended_a"),
];

/// An inclusive range of Unicode scalar values with a category name.
///
/// # Examples
///
/// ```
/// use el_detect::CodePointRange;
///
/// let range = CodePointRange::new(0x1F600, 0x1F64F, "emoticons");
/// assert!(range.contains('😀'));
/// assert!(!range.contains('a'));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodePointRange {
    /// Lowest scalar value in the range.
    pub low: u32,
    /// Highest scalar value in the range.
    pub high: u32,
    /// Category name, e.g. `"emoticons"`.
    pub category: String,
}

impl CodePointRange {
    /// Creates a range without validating it.
    #[must_use]
    pub fn new(low: u32, high: u32, category: impl Into<String>) -> Self {
        Self {
            low,
            high,
            category: category.into(),
        }
    }

    /// Returns `true` if `c` falls inside the range.
    #[inline]
    #[must_use]
    pub fn contains(&self, c: char) -> bool {
        self.contains_u32(u32::from(c))
    }

    /// Returns `true` if the scalar value falls inside the range.
    #[inline]
    #[must_use]
    pub const fn contains_u32(&self, value: u32) -> bool {
        self.low <= value && value <= self.high
    }

    /// Returns `true` if the two ranges share a value.
    #[inline]
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.low <= other.high && other.low <= self.high
    }

    /// Checks ordering and that both bounds are within the Unicode code space.
    pub fn validate(&self) -> Result<(), PatternError> {
        for value in [self.low, self.high] {
            if value > u32::from(char::MAX) {
                return Err(PatternError::InvalidScalar {
                    category: self.category.clone(),
                    value,
                });
            }
        }
        if self.low > self.high {
            return Err(PatternError::InvertedRange {
                category: self.category.clone(),
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }
}

/// Returns the bundled table as owned ranges.
#[must_use]
pub fn default_ranges() -> Vec<CodePointRange> {
    DEFAULT_RANGES
        .iter()
        .map(|&(low, high, category)| CodePointRange::new(low, high, category))
        .collect()
}

/// Loads a replacement range table from a JSON array of ranges.
///
/// ```json
/// [{"low": 128512, "high": 128591, "category": "emoticons"}]
/// ```
pub fn load_ranges(path: &Utf8Path) -> Result<Vec<CodePointRange>, PatternError> {
    let text = std::fs::read_to_string(path).map_err(|source| PatternError::RangesIo {
        path: path.to_owned(),
        source,
    })?;
    let ranges: Vec<CodePointRange> =
        serde_json::from_str(&text).map_err(|source| PatternError::RangesParse {
            path: path.to_owned(),
            source,
        })?;
    for range in &ranges {
        range.validate()?;
    }
    Ok(ranges)
}
