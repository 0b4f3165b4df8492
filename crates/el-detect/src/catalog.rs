//! Pattern catalog: code point classification and literal matchers.
//!
//! A [`PatternSet`] is the serializable description of what counts as a
//! match. A [`PatternCatalog`] is the validated, compiled form that the
//! detector queries. Catalogs are built once per run and shared through an
//! `Arc`; nothing in them changes after construction.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use el_core::{MatchCategory, PatternConfig};
use serde::{Deserialize, Serialize};

use crate::error::PatternError;
use crate::ranges::{self, CodePointRange};

/// Zero-width joiner.
pub const ZWJ: u32 = 0x200D;

/// Combining enclosing keycap.
pub const KEYCAP: u32 = 0x20E3;

/// Characters a keycap sequence (`1️⃣`, `#️⃣`) may start with.
pub const DEFAULT_KEYCAP_BASES: &str = "0123456789#*";

/// Text emoticons recognized by default.
pub const DEFAULT_EMOTICONS: &[&str] = &[
    ":)", ":-)", ":(", ":-(", ":D", ":-D", ";)", ";-)", ":P", ":-P", ":p", ":-p", ":O", ":-O",
    ":o", ":'(", "<3", "</3",
];

/// How a single code point participates in an emoji sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuneClass {
    /// Starts or continues a sequence as a glyph.
    Base,
    /// Fitzpatrick modifier (U+1F3FB..U+1F3FF).
    SkinTone,
    /// Presentation selector (U+FE00..U+FE0F).
    VariationSelector,
    /// Zero-width joiner.
    Zwj,
    /// Regional indicator letter used in flag pairs.
    RegionalIndicator,
    /// Tag character used in subdivision flags.
    Tag,
    /// ASCII character that a keycap mark may complete.
    KeycapBase,
    /// Combining enclosing keycap.
    Keycap,
    /// Anything else, including malformed input.
    Other,
}

/// Serializable description of the patterns to detect.
///
/// # Examples
///
/// ```
/// use el_detect::PatternSet;
///
/// let set = PatternSet::default();
/// assert_eq!(set.zwj, 0x200D);
/// assert!(set.lone_regional_indicator);
/// assert!(set.custom_patterns.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternSet {
    /// Ranges whose code points are emoji glyphs.
    pub unicode_ranges: Vec<CodePointRange>,
    /// The joiner code point.
    pub zwj: u32,
    /// Skin tone modifiers.
    pub skin_tone_range: CodePointRange,
    /// Variation selectors.
    pub variation_selector_range: CodePointRange,
    /// Regional indicator letters.
    pub regional_indicator_range: CodePointRange,
    /// Tag characters.
    pub tag_range: CodePointRange,
    /// The enclosing keycap code point.
    pub keycap: u32,
    /// ASCII characters that start a keycap sequence. They are only reported
    /// when followed by the keycap mark.
    pub keycap_bases: String,
    /// Emoticon literals, matched on word boundaries.
    pub emoticon_patterns: Vec<String>,
    /// Custom literals, matched anywhere.
    pub custom_patterns: Vec<String>,
    /// Report an unpaired regional indicator as a flag.
    pub lone_regional_indicator: bool,
}

impl Default for PatternSet {
    fn default() -> Self {
        Self {
            unicode_ranges: ranges::default_ranges(),
            zwj: ZWJ,
            skin_tone_range: CodePointRange::new(0x1F3FB, 0x1F3FF, "skin_tone"),
            variation_selector_range: CodePointRange::new(0xFE00, 0xFE0F, "variation_selector"),
            regional_indicator_range: CodePointRange::new(0x1F1E6, 0x1F1FF, "regional_indicator"),
            tag_range: CodePointRange::new(0xE0020, 0xE007F, "tag"),
            keycap: KEYCAP,
            keycap_bases: DEFAULT_KEYCAP_BASES.to_owned(),
            emoticon_patterns: DEFAULT_EMOTICONS.iter().map(|&p| p.to_owned()).collect(),
            custom_patterns: Vec::new(),
            lone_regional_indicator: true,
        }
    }
}

impl PatternSet {
    /// Builds a set from user configuration on top of the defaults.
    ///
    /// Loads the replacement range table when `ranges_file` is set.
    pub fn from_config(config: &PatternConfig) -> Result<Self, PatternError> {
        let mut set = Self::default();
        if let Some(path) = &config.ranges_file {
            set.unicode_ranges = ranges::load_ranges(path)?;
        }
        if let Some(emoticons) = &config.emoticons {
            set.emoticon_patterns.clone_from(emoticons);
        }
        set.custom_patterns.clone_from(&config.custom);
        set.lone_regional_indicator = config.lone_regional_indicator;
        Ok(set)
    }

    /// Parses a set from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Replaces the custom literals.
    #[must_use]
    pub fn with_custom_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.custom_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the lone regional indicator policy.
    #[must_use]
    pub fn with_lone_regional_indicator(mut self, enabled: bool) -> Self {
        self.lone_regional_indicator = enabled;
        self
    }

    fn structural(&self) -> [(&'static str, &CodePointRange); 4] {
        [
            ("skin_tone", &self.skin_tone_range),
            ("variation_selector", &self.variation_selector_range),
            ("regional_indicator", &self.regional_indicator_range),
            ("tag", &self.tag_range),
        ]
    }

    /// Checks ranges, structural disjointness, keycap settings and literal
    /// patterns.
    pub fn validate(&self) -> Result<(), PatternError> {
        for range in &self.unicode_ranges {
            range.validate()?;
        }
        let structural = self.structural();
        for (_, range) in &structural {
            range.validate()?;
        }
        if self.keycap == self.zwj {
            return Err(PatternError::StructuralOverlap {
                first: "zwj",
                second: "keycap",
            });
        }
        for (i, &(first, a)) in structural.iter().enumerate() {
            for (name, value) in [("zwj", self.zwj), ("keycap", self.keycap)] {
                if a.contains_u32(value) {
                    return Err(PatternError::StructuralOverlap {
                        first: name,
                        second: first,
                    });
                }
            }
            for &(second, b) in &structural[i + 1..] {
                if a.overlaps(b) {
                    return Err(PatternError::StructuralOverlap { first, second });
                }
            }
        }
        if let Some(base) = self.keycap_bases.chars().find(|c| !c.is_ascii()) {
            return Err(PatternError::InvalidKeycapBase { base });
        }
        if self.emoticon_patterns.iter().any(String::is_empty) {
            return Err(PatternError::EmptyPattern { kind: "emoticon" });
        }
        if self.custom_patterns.iter().any(String::is_empty) {
            return Err(PatternError::EmptyPattern { kind: "custom" });
        }
        Ok(())
    }
}

/// A compiled set of literal patterns.
#[derive(Debug)]
pub struct LiteralMatcher {
    automaton: AhoCorasick,
    categories: Vec<MatchCategory>,
}

impl LiteralMatcher {
    fn build(patterns: &[(&str, MatchCategory)]) -> Result<Option<Self>, PatternError> {
        if patterns.is_empty() {
            return Ok(None);
        }
        let automaton = AhoCorasickBuilder::new()
            .match_kind(MatchKind::LeftmostLongest)
            .build(patterns.iter().map(|&(p, _)| p))?;
        let categories = patterns.iter().map(|&(_, category)| category).collect();
        Ok(Some(Self {
            automaton,
            categories,
        }))
    }

    /// Iterates leftmost-longest, non-overlapping matches in `haystack` as
    /// `(start, end, category)`.
    pub fn find_iter<'a>(
        &'a self,
        haystack: &'a [u8],
    ) -> impl Iterator<Item = (usize, usize, MatchCategory)> + 'a {
        self.automaton.find_iter(haystack).map(|m| {
            (
                m.start(),
                m.end(),
                self.categories[m.pattern().as_usize()],
            )
        })
    }
}

/// Validated, compiled patterns shared by every detector in a run.
///
/// # Examples
///
/// ```
/// use el_detect::{PatternCatalog, RuneClass};
///
/// let catalog = PatternCatalog::with_defaults()?;
/// assert_eq!(catalog.classify('😀'), RuneClass::Base);
/// assert_eq!(catalog.classify('\u{200D}'), RuneClass::Zwj);
/// assert_eq!(catalog.classify('a'), RuneClass::Other);
/// # Ok::<(), el_detect::PatternError>(())
/// ```
#[derive(Debug)]
pub struct PatternCatalog {
    set: PatternSet,
    /// Merged, sorted, non-adjacent `(low, high)` base ranges.
    base: Vec<(u32, u32)>,
    emoticons: Option<LiteralMatcher>,
    custom: Option<LiteralMatcher>,
    combined: Option<LiteralMatcher>,
}

impl PatternCatalog {
    /// Validates `set` and compiles its literal matchers.
    pub fn new(set: PatternSet) -> Result<Self, PatternError> {
        set.validate()?;

        let emoticon_patterns: Vec<(&str, MatchCategory)> = set
            .emoticon_patterns
            .iter()
            .map(|p| (p.as_str(), MatchCategory::Emoticon))
            .collect();
        let custom_patterns: Vec<(&str, MatchCategory)> = set
            .custom_patterns
            .iter()
            .map(|p| (p.as_str(), MatchCategory::Custom))
            .collect();
        let combined_patterns: Vec<(&str, MatchCategory)> = custom_patterns
            .iter()
            .chain(&emoticon_patterns)
            .copied()
            .collect();

        let emoticons = LiteralMatcher::build(&emoticon_patterns)?;
        let custom = LiteralMatcher::build(&custom_patterns)?;
        let combined = LiteralMatcher::build(&combined_patterns)?;
        let base = merge_ranges(&set.unicode_ranges);

        Ok(Self {
            set,
            base,
            emoticons,
            custom,
            combined,
        })
    }

    /// Builds the catalog for [`PatternSet::default`].
    pub fn with_defaults() -> Result<Self, PatternError> {
        Self::new(PatternSet::default())
    }

    /// The set this catalog was compiled from.
    #[inline]
    #[must_use]
    pub const fn set(&self) -> &PatternSet {
        &self.set
    }

    /// Whether an unpaired regional indicator is reported.
    #[inline]
    #[must_use]
    pub const fn lone_regional_indicator(&self) -> bool {
        self.set.lone_regional_indicator
    }

    /// Classifies a code point. Structural classes take priority over base
    /// ranges.
    #[must_use]
    pub fn classify(&self, c: char) -> RuneClass {
        let value = u32::from(c);
        if value == self.set.zwj {
            RuneClass::Zwj
        } else if self.set.skin_tone_range.contains_u32(value) {
            RuneClass::SkinTone
        } else if self.set.variation_selector_range.contains_u32(value) {
            RuneClass::VariationSelector
        } else if self.set.regional_indicator_range.contains_u32(value) {
            RuneClass::RegionalIndicator
        } else if self.set.tag_range.contains_u32(value) {
            RuneClass::Tag
        } else if value == self.set.keycap {
            RuneClass::Keycap
        } else if c.is_ascii() && self.set.keycap_bases.contains(c) {
            RuneClass::KeycapBase
        } else if self.is_base(value) {
            RuneClass::Base
        } else {
            RuneClass::Other
        }
    }

    /// Returns `true` if the scalar value is in one of the base ranges.
    #[must_use]
    pub fn is_base(&self, value: u32) -> bool {
        let idx = self.base.partition_point(|&(low, _)| low <= value);
        idx > 0 && self.base[idx - 1].1 >= value
    }

    /// Returns the matcher for the enabled literal families, if any.
    #[must_use]
    pub fn literal_matcher(&self, emoticons: bool, custom: bool) -> Option<&LiteralMatcher> {
        match (emoticons, custom) {
            (true, true) => self.combined.as_ref(),
            (true, false) => self.emoticons.as_ref(),
            (false, true) => self.custom.as_ref(),
            (false, false) => None,
        }
    }
}

fn merge_ranges(ranges: &[CodePointRange]) -> Vec<(u32, u32)> {
    let mut bounds: Vec<(u32, u32)> = ranges.iter().map(|r| (r.low, r.high)).collect();
    bounds.sort_unstable();

    let mut merged: Vec<(u32, u32)> = Vec::with_capacity(bounds.len());
    for (low, high) in bounds {
        match merged.last_mut() {
            Some(last) if low <= last.1.saturating_add(1) => last.1 = last.1.max(high),
            _ => merged.push((low, high)),
        }
    }
    merged
}
