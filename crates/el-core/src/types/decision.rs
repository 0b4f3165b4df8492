//! Justified include/exclude decisions for file paths.
//!
//! The filter engine never answers with a bare boolean: every decision says
//! which precedence stage settled it, why, and which rule (if any) fired.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The precedence stage that produced a decision, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterStage {
    /// Exclude patterns given on the command line.
    CliExclude,
    /// Include patterns given on the command line.
    CliInclude,
    /// Profile exclude patterns, ignored files, and ignored directories.
    ProfileExclude,
    /// Profile include patterns.
    ProfileInclude,
}

/// Why a path was included or excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterReason {
    /// Matched a command-line exclude pattern.
    CliExcludeMatched,
    /// Matched a command-line include pattern.
    CliIncludeMatched,
    /// Command-line includes exist and none matched.
    CliIncludeUnmatched,
    /// Matched a profile exclude pattern.
    ExcludePatternMatched,
    /// Matched the profile's ignored-file list.
    IgnoredFile,
    /// A directory component matched the profile's ignored-directory list.
    IgnoredDirectory,
    /// Matched a profile include pattern.
    IncludePatternMatched,
    /// Profile includes exist and none matched.
    IncludePatternUnmatched,
    /// No include list is configured, so the path is allowed.
    DefaultAllow,
}

impl FilterReason {
    /// Returns a short human-readable description.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::CliExcludeMatched => "matched command-line exclude",
            Self::CliIncludeMatched => "matched command-line include",
            Self::CliIncludeUnmatched => "no command-line include matched",
            Self::ExcludePatternMatched => "matched exclude pattern",
            Self::IgnoredFile => "file is ignored",
            Self::IgnoredDirectory => "directory is ignored",
            Self::IncludePatternMatched => "matched include pattern",
            Self::IncludePatternUnmatched => "no include pattern matched",
            Self::DefaultAllow => "included by default",
        }
    }
}

/// The result of evaluating one path against the filter rules.
///
/// # Examples
///
/// ```
/// use el_core::{FilterDecision, FilterReason, FilterStage};
///
/// let decision = FilterDecision::exclude(
///     FilterStage::ProfileExclude,
///     FilterReason::IgnoredDirectory,
///     Some("node_modules"),
/// );
/// assert!(!decision.include);
/// assert_eq!(decision.rule.as_deref(), Some("node_modules"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterDecision {
    /// Whether the path should be processed.
    pub include: bool,
    /// Why the decision was made.
    pub reason: FilterReason,
    /// The pattern or name that fired, if any.
    pub rule: Option<String>,
    /// The stage that settled the decision.
    pub stage: FilterStage,
}

impl FilterDecision {
    /// Creates an including decision.
    #[must_use]
    pub fn include(stage: FilterStage, reason: FilterReason, rule: Option<&str>) -> Self {
        Self {
            include: true,
            reason,
            rule: rule.map(ToOwned::to_owned),
            stage,
        }
    }

    /// Creates an excluding decision.
    #[must_use]
    pub fn exclude(stage: FilterStage, reason: FilterReason, rule: Option<&str>) -> Self {
        Self {
            include: false,
            reason,
            rule: rule.map(ToOwned::to_owned),
            stage,
        }
    }
}

impl fmt::Display for FilterDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.include { "include" } else { "exclude" };
        write!(f, "{verdict}: {}", self.reason.describe())?;
        if let Some(rule) = &self.rule {
            write!(f, " ({rule})")?;
        }
        Ok(())
    }
}
