//! Per-file detection results.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::matched::Match;
use crate::hash::FxHashSet;

/// Why a file was not run through detection.
///
/// Skips are not errors: the file was read successfully but is not a
/// candidate for emoji detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum SkipReason {
    /// The content was classified as binary.
    BinaryFile,
}

impl SkipReason {
    /// Returns the human-readable reason.
    ///
    /// # Examples
    ///
    /// ```
    /// use el_core::SkipReason;
    ///
    /// assert_eq!(SkipReason::BinaryFile.as_str(), "binary file");
    /// ```
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BinaryFile => "binary file",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of running detection over one file's content.
///
/// Construct with [`DetectionResult::from_matches`] so that ordering and
/// counts always agree with the match list.
///
/// # Examples
///
/// ```
/// use el_core::{DetectionResult, Match, MatchCategory};
///
/// let content = "😀 and 😀";
/// let result = DetectionResult::from_matches(vec![
///     Match::new(content, 9, 13, MatchCategory::Emoji, 1, 7, 1),
///     Match::new(content, 0, 4, MatchCategory::Emoji, 1, 1, 1),
/// ]);
///
/// assert_eq!(result.total_count, 2);
/// assert_eq!(result.unique_count, 1);
/// assert_eq!(result.matches[0].byte_start, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Matches ordered by `byte_start`.
    pub matches: Vec<Match>,
    /// Number of matches.
    pub total_count: usize,
    /// Number of distinct `raw` values.
    pub unique_count: usize,
    /// `false` when detection was not attempted.
    pub success: bool,
    /// Set when detection was not attempted.
    pub skipped_reason: Option<SkipReason>,
}

impl DetectionResult {
    /// Builds a successful result, sorting matches and computing counts.
    #[must_use]
    pub fn from_matches(mut matches: Vec<Match>) -> Self {
        matches.sort_by(|a, b| {
            a.byte_start
                .cmp(&b.byte_start)
                .then_with(|| a.byte_end.cmp(&b.byte_end))
        });
        let unique_count = count_unique(&matches);
        Self {
            total_count: matches.len(),
            unique_count,
            matches,
            success: true,
            skipped_reason: None,
        }
    }

    /// A successful result with no matches.
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::from_matches(Vec::new())
    }

    /// A result for content that was never run through detection.
    #[must_use]
    pub const fn skipped(reason: SkipReason) -> Self {
        Self {
            matches: Vec::new(),
            total_count: 0,
            unique_count: 0,
            success: false,
            skipped_reason: Some(reason),
        }
    }

    /// A result for a file that could not be read.
    #[must_use]
    pub const fn failed() -> Self {
        Self {
            matches: Vec::new(),
            total_count: 0,
            unique_count: 0,
            success: false,
            skipped_reason: None,
        }
    }

    /// Returns `true` if detection ran and found nothing.
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.success && self.total_count == 0
    }

    /// Returns `true` if detection was skipped.
    #[inline]
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        self.skipped_reason.is_some()
    }

    /// Returns a copy keeping only the matches accepted by `keep`.
    ///
    /// Counts are recomputed; skip state is carried over unchanged.
    #[must_use]
    pub fn retain_matches(&self, mut keep: impl FnMut(&Match) -> bool) -> Self {
        if !self.success {
            return self.clone();
        }
        let matches: Vec<Match> = self.matches.iter().filter(|m| keep(m)).cloned().collect();
        Self::from_matches(matches)
    }
}

impl Default for DetectionResult {
    fn default() -> Self {
        Self::empty()
    }
}

fn count_unique(matches: &[Match]) -> usize {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for m in matches {
        seen.insert(m.raw.as_str());
    }
    seen.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchCategory;

    fn emoji(content: &str, start: usize, end: usize) -> Match {
        Match::new(content, start, end, MatchCategory::Emoji, 1, 1, 1)
    }

    #[test]
    fn test_from_matches_sorts_and_counts() {
        let content = "✅😀✅";
        let result = DetectionResult::from_matches(vec![
            emoji(content, 7, 10),
            emoji(content, 0, 3),
            emoji(content, 3, 7),
        ]);
        let starts: Vec<usize> = result.matches.iter().map(|m| m.byte_start).collect();
        assert_eq!(starts, vec![0, 3, 7]);
        assert_eq!(result.total_count, 3);
        assert_eq!(result.unique_count, 2);
        assert!(result.success);
        assert!(result.skipped_reason.is_none());
    }

    #[test]
    fn test_empty_is_clean() {
        let result = DetectionResult::empty();
        assert!(result.is_clean());
        assert!(!result.is_skipped());
    }

    #[test]
    fn test_skipped_binary() {
        let result = DetectionResult::skipped(SkipReason::BinaryFile);
        assert!(!result.success);
        assert!(!result.is_clean());
        assert_eq!(result.skipped_reason, Some(SkipReason::BinaryFile));
        insta::assert_snapshot!(SkipReason::BinaryFile.to_string(), @"binary file");
    }

    #[test]
    fn test_retain_matches_recomputes_counts() {
        let content = "✅😀";
        let result =
            DetectionResult::from_matches(vec![emoji(content, 0, 3), emoji(content, 3, 7)]);
        let filtered = result.retain_matches(|m| m.raw != "✅");
        assert_eq!(filtered.total_count, 1);
        assert_eq!(filtered.unique_count, 1);
        assert_eq!(filtered.matches[0].raw, "😀");
    }

    #[test]
    fn test_retain_matches_keeps_skip_state() {
        let result = DetectionResult::skipped(SkipReason::BinaryFile);
        let filtered = result.retain_matches(|_| false);
        assert_eq!(filtered, result);
    }
}
