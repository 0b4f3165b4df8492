//! Emoji detection over raw file content.
//!
//! [`Detector::detect`] makes one pass over the decoded runes, feeding the
//! [`SequenceMachine`], then searches the bytes between Unicode matches for
//! literal emoticon and custom patterns. Malformed UTF-8 is skipped, never
//! reported as an error.

use std::sync::Arc;

use bstr::ByteSlice;
use el_core::{DetectionResult, Match, MatchCategory, ProcessingConfig};

use crate::catalog::{PatternCatalog, RuneClass};
use crate::sequence::{Emission, Rune, SequenceMachine};

/// The replacement character as encoded in UTF-8.
const REPLACEMENT_BYTES: &[u8] = "\u{FFFD}".as_bytes();

/// Which matcher families run.
///
/// # Examples
///
/// ```
/// use el_core::ProcessingConfig;
/// use el_detect::DetectOptions;
///
/// let options = DetectOptions::from(&ProcessingConfig::default());
/// assert!(options.unicode);
/// assert!(!options.emoticons);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DetectOptions {
    /// Unicode emoji sequences.
    pub unicode: bool,
    /// Text emoticons.
    pub emoticons: bool,
    /// Custom literals.
    pub custom: bool,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self::from(&ProcessingConfig::default())
    }
}

impl From<&ProcessingConfig> for DetectOptions {
    fn from(config: &ProcessingConfig) -> Self {
        Self {
            unicode: config.enable_unicode,
            emoticons: config.enable_emoticons,
            custom: config.enable_custom,
        }
    }
}

impl DetectOptions {
    /// Every family enabled.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            unicode: true,
            emoticons: true,
            custom: true,
        }
    }
}

/// Finds emoji, emoticons, and custom markers in content.
///
/// Cheap to clone; the catalog is shared.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use el_detect::{DetectOptions, Detector, PatternCatalog};
///
/// let catalog = Arc::new(PatternCatalog::with_defaults()?);
/// let detector = Detector::new(catalog, DetectOptions::default());
///
/// let result = detector.detect("Hello 😀 world".as_bytes());
/// assert_eq!(result.total_count, 1);
/// let m = &result.matches[0];
/// assert_eq!((m.byte_start, m.byte_end, m.line, m.column), (6, 10, 1, 7));
/// # Ok::<(), el_detect::PatternError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Detector {
    catalog: Arc<PatternCatalog>,
    options: DetectOptions,
}

impl Detector {
    /// Creates a detector over a shared catalog.
    #[must_use]
    pub const fn new(catalog: Arc<PatternCatalog>, options: DetectOptions) -> Self {
        Self { catalog, options }
    }

    /// The catalog in use.
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    /// The enabled matcher families.
    #[inline]
    #[must_use]
    pub const fn options(&self) -> DetectOptions {
        self.options
    }

    /// Detects every match in `content`.
    ///
    /// The result is sorted by `byte_start`, matches never overlap, and the
    /// same input always produces the same output.
    #[must_use]
    pub fn detect(&self, content: &[u8]) -> DetectionResult {
        let mut matches = if self.options.unicode {
            self.detect_sequences(content)
        } else {
            Vec::new()
        };

        if let Some(matcher) = self
            .catalog
            .literal_matcher(self.options.emoticons, self.options.custom)
        {
            let mut literals = Vec::new();
            for (gap_start, gap_end) in gaps(&matches, content.len()) {
                let gap = &content[gap_start..gap_end];
                for (start, end, category) in matcher.find_iter(gap) {
                    let (start, end) = (gap_start + start, gap_start + end);
                    if category == MatchCategory::Emoticon && !on_word_boundary(content, start, end)
                    {
                        continue;
                    }
                    literals.push((start, end, category));
                }
            }
            if !literals.is_empty() {
                matches.extend(locate_literals(content, &literals));
            }
        }

        DetectionResult::from_matches(matches)
    }

    /// Returns `true` if `text` contains anything this detector reports.
    #[must_use]
    pub fn is_detectable(&self, text: &str) -> bool {
        self.detect(text.as_bytes()).total_count > 0
    }

    fn detect_sequences(&self, content: &[u8]) -> Vec<Match> {
        let mut machine = SequenceMachine::new(self.catalog.lone_regional_indicator());
        let mut matches = Vec::new();
        let mut cursor = Cursor::default();

        for (start, end, c) in content.char_indices() {
            let class = if is_malformed(content, start, end, c) {
                RuneClass::Other
            } else {
                self.catalog.classify(c)
            };
            let rune = Rune {
                class,
                start,
                end,
                line: cursor.line,
                column: cursor.column,
            };
            if let Some(emission) = machine.feed(rune) {
                matches.push(to_match(content, emission));
            }
            cursor.step(content, start, end, c);
        }
        if let Some(emission) = machine.finish() {
            matches.push(to_match(content, emission));
        }
        matches
    }
}

/// Running line/column position.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    offset: usize,
    line: u32,
    column: u32,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Cursor {
    fn step(&mut self, content: &[u8], start: usize, end: usize, c: char) {
        self.offset = end;
        if c == '\n' && !is_malformed(content, start, end, c) {
            self.line = self.line.saturating_add(1);
            self.column = 1;
        } else {
            self.column = self.column.saturating_add(1);
        }
    }

    /// Moves forward to `target`, which must be a rune boundary at or after
    /// the current offset.
    fn advance_to(&mut self, content: &[u8], target: usize) {
        let from = self.offset;
        for (start, end, c) in content[from..target].char_indices() {
            self.step(content, from + start, from + end, c);
        }
        self.offset = target;
    }
}

/// `bstr` yields U+FFFD for each malformed unit; a literal U+FFFD is text.
fn is_malformed(content: &[u8], start: usize, end: usize, c: char) -> bool {
    c == '\u{FFFD}' && &content[start..end] != REPLACEMENT_BYTES
}

/// Byte ranges of `content` not covered by `matches` (which are sorted and
/// disjoint).
fn gaps(matches: &[Match], len: usize) -> Vec<(usize, usize)> {
    let mut gaps = Vec::with_capacity(matches.len() + 1);
    let mut start = 0;
    for m in matches {
        if m.byte_start > start {
            gaps.push((start, m.byte_start));
        }
        start = m.byte_end;
    }
    if start < len {
        gaps.push((start, len));
    }
    gaps
}

/// An emoticon must not be glued to a word or to a preceding colon.
fn on_word_boundary(content: &[u8], start: usize, end: usize) -> bool {
    let before_ok = start == 0 || {
        let b = content[start - 1];
        !b.is_ascii_alphanumeric() && b != b':'
    };
    let after_ok = content
        .get(end)
        .is_none_or(|b| !b.is_ascii_alphanumeric());
    before_ok && after_ok
}

/// Resolves line/column for literal matches sorted by start.
fn locate_literals(content: &[u8], literals: &[(usize, usize, MatchCategory)]) -> Vec<Match> {
    let mut cursor = Cursor::default();
    literals
        .iter()
        .map(|&(start, end, category)| {
            cursor.advance_to(content, start);
            let runes = content[start..end].chars().count() as u32;
            build_match(content, start, end, category, cursor.line, cursor.column, runes)
        })
        .collect()
}

fn to_match(content: &[u8], emission: Emission) -> Match {
    let span = emission.span;
    build_match(
        content,
        span.start,
        span.end,
        emission.category,
        span.line,
        span.column,
        span.runes,
    )
}

fn build_match(
    content: &[u8],
    start: usize,
    end: usize,
    category: MatchCategory,
    line: u32,
    column: u32,
    rune_length: u32,
) -> Match {
    Match {
        // Spans only ever cover well-formed runes, so this is an exact copy.
        raw: content[start..end].to_str_lossy().into_owned(),
        category,
        byte_start: start,
        byte_end: end,
        line,
        column,
        rune_length,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::catalog::PatternSet;

    fn detector() -> Detector {
        Detector::new(
            Arc::new(PatternCatalog::with_defaults().unwrap()),
            DetectOptions::default(),
        )
    }

    fn detector_with(set: PatternSet, options: DetectOptions) -> Detector {
        Detector::new(Arc::new(PatternCatalog::new(set).unwrap()), options)
    }

    fn raws(result: &DetectionResult) -> Vec<&str> {
        result.matches.iter().map(|m| m.raw.as_str()).collect()
    }

    #[test]
    fn test_scenario_single_emoji() {
        let result = detector().detect("Hello 😀 world".as_bytes());
        assert_eq!(result.total_count, 1);
        let m = &result.matches[0];
        assert_eq!(m.raw, "😀");
        assert_eq!((m.byte_start, m.byte_end), (6, 10));
        assert_eq!((m.line, m.column), (1, 7));
        assert_eq!(m.category, MatchCategory::Emoji);
    }

    #[test]
    fn test_scenario_flag() {
        let result = detector().detect("🇺🇸 USA".as_bytes());
        assert_eq!(result.total_count, 1);
        assert_eq!(result.matches[0].raw, "🇺🇸");
        assert_eq!(result.matches[0].category, MatchCategory::Flag);
        assert_eq!(result.matches[0].rune_length, 2);
    }

    #[test]
    fn test_plain_text_has_no_matches() {
        let result = detector().detect(b"fn main() { println!(\"hi\"); }\n");
        assert!(result.is_clean());
    }

    #[test]
    fn test_empty_content() {
        let result = detector().detect(b"");
        assert!(result.success);
        assert_eq!(result.total_count, 0);
    }

    #[test]
    fn test_zwj_family_is_one_match() {
        let family = "👨\u{200D}👩\u{200D}👧";
        let result = detector().detect(format!("a {family} b").as_bytes());
        assert_eq!(raws(&result), vec![family]);
        assert_eq!(result.matches[0].category, MatchCategory::ZwjSequence);
        assert_eq!(result.matches[0].rune_length, 5);
    }

    #[test]
    fn test_skin_tone_modifier() {
        let result = detector().detect("👍🏽!".as_bytes());
        assert_eq!(raws(&result), vec!["👍🏽"]);
        assert_eq!(result.matches[0].category, MatchCategory::ModifiedEmoji);
    }

    #[test]
    fn test_variation_selector_is_included() {
        let result = detector().detect("I \u{2764}\u{FE0F} Rust".as_bytes());
        assert_eq!(raws(&result), vec!["\u{2764}\u{FE0F}"]);
    }

    #[test]
    fn test_subdivision_flag_with_tags() {
        let england = "\u{1F3F4}\u{E0067}\u{E0062}\u{E0065}\u{E006E}\u{E0067}\u{E007F}";
        let result = detector().detect(england.as_bytes());
        assert_eq!(raws(&result), vec![england]);
        assert_eq!(result.matches[0].category, MatchCategory::Flag);
    }

    #[test]
    fn test_trailing_zwj_not_included() {
        let result = detector().detect("😀\u{200D}x".as_bytes());
        assert_eq!(raws(&result), vec!["😀"]);
        assert_eq!(result.matches[0].byte_end, 4);
    }

    #[test]
    fn test_keycap_sequences() {
        let content = "Step 1\u{FE0F}\u{20E3} then #\u{20E3}, not 12 or #tag";
        let result = detector().detect(content.as_bytes());
        assert_eq!(raws(&result), vec!["1\u{FE0F}\u{20E3}", "#\u{20E3}"]);
        assert!(result.matches.iter().all(|m| m.category == MatchCategory::Emoji));
        assert_eq!((result.matches[0].column, result.matches[0].rune_length), (6, 3));
    }

    #[test]
    fn test_adjacent_emoji_are_separate() {
        let result = detector().detect("🚀🚀".as_bytes());
        assert_eq!(result.total_count, 2);
        assert_eq!(result.unique_count, 1);
    }

    #[test]
    fn test_lone_regional_indicator_policy() {
        let content = "\u{1F1FA} alone".as_bytes();
        assert_eq!(detector().detect(content).total_count, 1);

        let strict = detector_with(
            PatternSet::default().with_lone_regional_indicator(false),
            DetectOptions::default(),
        );
        assert_eq!(strict.detect(content).total_count, 0);
    }

    #[test]
    fn test_line_and_column_tracking() {
        let result = detector().detect("first\nab 🎉\n\n  ✅".as_bytes());
        let positions: Vec<_> = result.matches.iter().map(|m| (m.line, m.column)).collect();
        assert_eq!(positions, vec![(2, 4), (4, 3)]);
    }

    #[test]
    fn test_column_counts_runes_not_bytes() {
        let result = detector().detect("日本語😀".as_bytes());
        assert_eq!(result.matches[0].column, 4);
        assert_eq!(result.matches[0].byte_start, 9);
    }

    #[test]
    fn test_malformed_bytes_are_skipped() {
        let mut content = b"ab\xFF\xFEc ".to_vec();
        content.extend_from_slice("😀".as_bytes());
        let result = detector().detect(&content);
        assert_eq!(result.total_count, 1);
        let m = &result.matches[0];
        assert_eq!(m.byte_start, 6);
        // a, b, two malformed units, c, space
        assert_eq!(m.column, 7);
        assert!(m.is_consistent_with(&content));
    }

    #[test]
    fn test_literal_replacement_character_is_text() {
        let result = detector().detect("\u{FFFD}😀".as_bytes());
        assert_eq!(result.matches[0].column, 2);
    }

    #[test]
    fn test_malformed_byte_breaks_sequence() {
        let mut content = "😀".as_bytes().to_vec();
        content.push(0xFF);
        content.extend_from_slice("😀".as_bytes());
        let result = detector().detect(&content);
        assert_eq!(result.total_count, 2);
    }

    #[test]
    fn test_emoticons_disabled_by_default() {
        assert!(detector().detect(b"nice :)").is_clean());
    }

    #[test]
    fn test_emoticons_when_enabled() {
        let detector = detector_with(PatternSet::default(), DetectOptions::all());
        let result = detector.detect(b"nice :) and :-( <3");
        assert_eq!(raws(&result), vec![":)", ":-(", "<3"]);
        assert!(
            result
                .matches
                .iter()
                .all(|m| m.category == MatchCategory::Emoticon)
        );
        assert_eq!(result.matches[1].column, 13);
    }

    #[test]
    fn test_emoticon_word_boundaries() {
        let detector = detector_with(PatternSet::default(), DetectOptions::all());
        assert!(detector.detect(b"use std::Default;").is_clean());
        assert!(detector.detect(b"let x = 0xD;").is_clean());
        assert!(detector.detect(b"C:Program").is_clean());
        assert_eq!(detector.detect(b"(:D)").total_count, 1);
    }

    #[test]
    fn test_custom_patterns_match_anywhere() {
        let set = PatternSet::default().with_custom_patterns(["[check]"]);
        let detector = detector_with(set, DetectOptions::default());
        let result = detector.detect(b"done[check]ok");
        assert_eq!(raws(&result), vec!["[check]"]);
        assert_eq!(result.matches[0].category, MatchCategory::Custom);
    }

    #[test]
    fn test_literals_do_not_overlap_unicode_matches() {
        let set = PatternSet::default().with_custom_patterns(["😀"]);
        let detector = detector_with(set, DetectOptions::all());
        let result = detector.detect("x😀y".as_bytes());
        assert_eq!(result.total_count, 1);
        assert_eq!(result.matches[0].category, MatchCategory::Emoji);
    }

    #[test]
    fn test_unicode_disabled_leaves_literals() {
        let set = PatternSet::default().with_custom_patterns(["😀"]);
        let options = DetectOptions {
            unicode: false,
            emoticons: false,
            custom: true,
        };
        let result = detector_with(set, options).detect("😀 🚀".as_bytes());
        assert_eq!(raws(&result), vec!["😀"]);
        assert_eq!(result.matches[0].category, MatchCategory::Custom);
    }

    #[test]
    fn test_emoticon_between_emoji_is_not_formed() {
        let detector = detector_with(PatternSet::default(), DetectOptions::all());
        let result = detector.detect(":😀)".as_bytes());
        assert_eq!(raws(&result), vec!["😀"]);
    }

    #[test]
    fn test_is_detectable() {
        let detector = detector();
        assert!(detector.is_detectable("✅"));
        assert!(!detector.is_detectable("[removed]"));
        assert!(!detector.is_detectable(""));
    }

    proptest! {
        #[test]
        fn prop_detect_is_deterministic(content in proptest::collection::vec(any::<u8>(), 0..256)) {
            let detector = detector_with(PatternSet::default(), DetectOptions::all());
            prop_assert_eq!(detector.detect(&content), detector.detect(&content));
        }

        #[test]
        fn prop_matches_are_sorted_consistent_and_disjoint(content in "\\PC{0,64}") {
            let detector = detector_with(PatternSet::default(), DetectOptions::all());
            let result = detector.detect(content.as_bytes());
            for m in &result.matches {
                prop_assert!(m.is_consistent_with(content.as_bytes()));
            }
            for pair in result.matches.windows(2) {
                prop_assert!(pair[0].byte_end <= pair[1].byte_start);
            }
        }

        #[test]
        fn prop_ascii_letters_never_match(content in "[a-zA-Z0-9 \\n]{0,128}") {
            prop_assert!(detector().detect(content.as_bytes()).is_clean());
        }
    }
}
