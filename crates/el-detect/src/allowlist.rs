//! Allowlist of emoji permitted to remain in content.
//!
//! Keys are normalized by stripping variation selectors, so `❤` and `❤️`
//! are the same entry. Skin tone modifiers are significant.

use std::borrow::Cow;

use el_core::{DetectionResult, FxHashSet, fx_hash_set_with_capacity};

fn is_variation_selector(c: char) -> bool {
    ('\u{FE00}'..='\u{FE0F}').contains(&c)
}

/// A read-only set of normalized patterns.
///
/// # Examples
///
/// ```
/// use el_detect::Allowlist;
///
/// let allowlist = Allowlist::new(["✅", "❤️"]);
/// assert!(allowlist.contains("✅"));
/// assert!(allowlist.contains("❤"));
/// assert!(!allowlist.contains("😀"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allowlist {
    keys: FxHashSet<String>,
}

impl Allowlist {
    /// Builds an allowlist. Entries that are empty after trimming are ignored.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns.into_iter();
        let mut keys = fx_hash_set_with_capacity(patterns.size_hint().0);
        for pattern in patterns {
            let trimmed = pattern.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }
            let key = Self::normalize(trimmed);
            if !key.is_empty() {
                keys.insert(key.into_owned());
            }
        }
        Self { keys }
    }

    /// Strips variation selectors. Borrows when there is nothing to strip.
    ///
    /// ```
    /// use el_detect::Allowlist;
    ///
    /// assert_eq!(Allowlist::normalize("\u{2764}\u{FE0F}"), "\u{2764}");
    /// assert_eq!(Allowlist::normalize("👍🏽"), "👍🏽");
    /// ```
    #[must_use]
    pub fn normalize(raw: &str) -> Cow<'_, str> {
        if raw.chars().any(is_variation_selector) {
            Cow::Owned(raw.chars().filter(|&c| !is_variation_selector(c)).collect())
        } else {
            Cow::Borrowed(raw)
        }
    }

    /// Returns `true` if the normalized form of `raw` is allowed.
    #[must_use]
    pub fn contains(&self, raw: &str) -> bool {
        self.keys.contains(&*Self::normalize(raw))
    }

    /// Returns a result with allowed matches removed and counts recomputed.
    ///
    /// `None` returns the result unchanged.
    #[must_use]
    pub fn apply(result: &DetectionResult, allowlist: Option<&Self>) -> DetectionResult {
        match allowlist {
            Some(allowlist) if !allowlist.is_empty() => {
                result.retain_matches(|m| !allowlist.contains(&m.raw))
            }
            _ => result.clone(),
        }
    }

    /// Unions several allowlists.
    pub fn merge<'a, I>(lists: I) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let mut keys = FxHashSet::default();
        for list in lists {
            keys.extend(list.keys.iter().cloned());
        }
        Self { keys }
    }

    /// Number of distinct keys.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if nothing is allowed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterates the normalized keys in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use el_core::{Match, MatchCategory};
    use proptest::prelude::*;

    use super::*;

    fn result_of(content: &str, spans: &[(usize, usize)]) -> DetectionResult {
        DetectionResult::from_matches(
            spans
                .iter()
                .map(|&(s, e)| Match::new(content, s, e, MatchCategory::Emoji, 1, 1, 1))
                .collect(),
        )
    }

    #[test]
    fn test_scenario_allowlist_filters() {
        let content = "✅😀";
        let result = result_of(content, &[(0, 3), (3, 7)]);
        let allowlist = Allowlist::new(["✅"]);

        let filtered = Allowlist::apply(&result, Some(&allowlist));
        assert_eq!(filtered.total_count, 1);
        assert_eq!(filtered.unique_count, 1);
        assert_eq!(filtered.matches[0].raw, "😀");
    }

    #[test]
    fn test_apply_none_is_identity() {
        let content = "😀😀";
        let result = result_of(content, &[(0, 4), (4, 8)]);
        assert_eq!(Allowlist::apply(&result, None), result);
    }

    #[test]
    fn test_apply_keeps_skip_state() {
        let skipped = DetectionResult::skipped(el_core::SkipReason::BinaryFile);
        let allowlist = Allowlist::new(["✅"]);
        assert_eq!(Allowlist::apply(&skipped, Some(&allowlist)), skipped);
    }

    #[test]
    fn test_variation_selector_insensitive() {
        let allowlist = Allowlist::new(["\u{2764}"]);
        assert!(allowlist.contains("\u{2764}\u{FE0F}"));
    }

    #[test]
    fn test_skin_tone_is_significant() {
        let allowlist = Allowlist::new(["👍"]);
        assert!(allowlist.contains("👍"));
        assert!(!allowlist.contains("👍🏽"));
    }

    #[test]
    fn test_blank_entries_ignored() {
        let allowlist = Allowlist::new(["", "  ", " ✅ ", "\u{FE0F}"]);
        assert_eq!(allowlist.len(), 1);
        assert!(allowlist.contains("✅"));
    }

    #[test]
    fn test_normalize_borrows_when_clean() {
        assert!(matches!(Allowlist::normalize("😀"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_merge_unions() {
        let a = Allowlist::new(["✅"]);
        let b = Allowlist::new(["❤️", "✅"]);
        let merged = Allowlist::merge([&a, &b]);
        assert_eq!(merged.len(), 2);
        assert!(merged.contains("❤"));
        let mut keys: Vec<&str> = merged.iter().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["✅", "❤"]);
    }

    #[test]
    fn test_allowlist_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Allowlist>();
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(raw in "\\PC{0,16}") {
            let once = Allowlist::normalize(&raw).into_owned();
            prop_assert_eq!(&*Allowlist::normalize(&once), once.as_str());
        }

        #[test]
        fn prop_merge_is_monotonic(
            a in proptest::collection::vec("\\PC{1,4}", 0..8),
            b in proptest::collection::vec("\\PC{1,4}", 0..8),
            probe in "\\PC{1,4}",
        ) {
            let left = Allowlist::new(&a);
            let right = Allowlist::new(&b);
            let merged = Allowlist::merge([&left, &right]);
            if left.contains(&probe) || right.contains(&probe) {
                prop_assert!(merged.contains(&probe));
            }
            prop_assert!(merged.len() >= left.len().max(right.len()));
        }
    }
}
