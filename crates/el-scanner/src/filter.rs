//! File inclusion rules.
//!
//! This module provides the [`FileFilter`] predicate trait and the
//! [`FileFilterEngine`], which evaluates command-line and profile rules in a
//! fixed precedence order and explains every decision.
//!
//! # Precedence
//!
//! | Stage | Rule | Effect |
//! |-------|------|--------|
//! | 1 | command-line exclude | any match excludes, nothing overrides it |
//! | 2 | command-line include | a match includes immediately; no match excludes |
//! | 3 | profile exclude, ignored files, ignored directories | any match excludes |
//! | 4 | profile include | must match one if any are configured |
//!
//! Globs use shell semantics (`*` stops at `/`, `**` crosses it) and are
//! tried against both the full path and the file name.
//!
//! # Examples
//!
//! ```
//! use camino::Utf8Path;
//! use el_core::{FilterConfig, FilterReason};
//! use el_scanner::{FileFilter, FileFilterEngine};
//!
//! let config = FilterConfig {
//!     cli_exclude: vec!["*.min.js".to_owned()],
//!     ..FilterConfig::default()
//! };
//! let engine = FileFilterEngine::new(&config)?;
//!
//! let decision = engine.should_include(Utf8Path::new("web/app.min.js"));
//! assert!(!decision.include);
//! assert_eq!(decision.reason, FilterReason::CliExcludeMatched);
//!
//! assert!(engine.should_process(Utf8Path::new("src/lib.rs")));
//! assert!(!engine.should_process(Utf8Path::new("node_modules/pkg/index.js")));
//! # Ok::<(), el_scanner::ScanError>(())
//! ```

use camino::{Utf8Component, Utf8Path};
use el_core::{FilterConfig, FilterDecision, FilterReason, FilterStage};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use smallvec::SmallVec;

use crate::error::ScanError;

/// A predicate deciding whether a file should be processed.
///
/// # Examples
///
/// ```
/// use el_scanner::FileFilter;
/// use camino::Utf8Path;
///
/// struct NoLockfiles;
///
/// impl FileFilter for NoLockfiles {
///     fn should_process(&self, path: &Utf8Path) -> bool {
///         path.extension() != Some("lock")
///     }
/// }
///
/// assert!(!NoLockfiles.should_process(Utf8Path::new("Cargo.lock")));
/// ```
pub trait FileFilter: Send + Sync {
    /// Returns `true` if the file at `path` should be processed.
    fn should_process(&self, path: &Utf8Path) -> bool;
}

/// A filter that accepts all files.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllFilter;

impl FileFilter for AcceptAllFilter {
    #[inline]
    fn should_process(&self, _path: &Utf8Path) -> bool {
        true
    }
}

impl<F: FileFilter + ?Sized> FileFilter for Box<F> {
    #[inline]
    fn should_process(&self, path: &Utf8Path) -> bool {
        (**self).should_process(path)
    }
}

impl<F: FileFilter + ?Sized> FileFilter for std::sync::Arc<F> {
    #[inline]
    fn should_process(&self, path: &Utf8Path) -> bool {
        (**self).should_process(path)
    }
}

/// A compiled list of globs that remembers the source patterns.
#[derive(Debug, Clone)]
struct RuleSet {
    set: GlobSet,
    patterns: SmallVec<[String; 4]>,
}

impl RuleSet {
    fn new(patterns: &[String], option: &str) -> Result<Self, ScanError> {
        let mut builder = GlobSetBuilder::new();
        let mut kept = SmallVec::new();
        for pattern in patterns {
            let pattern = pattern.trim();
            if pattern.is_empty() {
                continue;
            }
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| ScanError::config(format!("invalid {option} glob '{pattern}': {e}")))?;
            builder.add(glob);
            kept.push(pattern.to_owned());
        }
        let set = builder
            .build()
            .map_err(|e| ScanError::config(format!("invalid {option} globs: {e}")))?;
        Ok(Self {
            set,
            patterns: kept,
        })
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns the first configured pattern matching the full path or the
    /// file name.
    fn first_match(&self, path: &Utf8Path) -> Option<&str> {
        if self.is_empty() {
            return None;
        }
        let mut hits = self.set.matches(path.as_std_path());
        if let Some(name) = path.file_name() {
            hits.extend(self.set.matches(name));
        }
        hits.into_iter()
            .min()
            .map(|index| self.patterns[index].as_str())
    }
}

/// An ignored-directory entry.
///
/// A trailing `/` in the configured pattern asks for an exact component
/// match; otherwise any component starting with the name matches.
#[derive(Debug, Clone)]
struct DirRule {
    pattern: String,
    name_len: usize,
    exact: bool,
}

impl DirRule {
    fn new(pattern: &str) -> Option<Self> {
        let pattern = pattern.trim();
        let name = pattern.trim_end_matches('/');
        if name.is_empty() {
            return None;
        }
        Some(Self {
            pattern: pattern.to_owned(),
            name_len: name.len(),
            exact: name.len() != pattern.len(),
        })
    }

    fn matches(&self, component: &str) -> bool {
        let name = &self.pattern[..self.name_len];
        if self.exact {
            component == name
        } else {
            component.starts_with(name)
        }
    }
}

/// Evaluates include/exclude rules for discovered paths.
///
/// Paths are matched as given; the walker passes them relative to the
/// discovery root so that globs such as `src/**/*.rs` behave as expected.
#[derive(Debug, Clone)]
pub struct FileFilterEngine {
    cli_exclude: RuleSet,
    cli_include: RuleSet,
    exclude: RuleSet,
    ignore_files: RuleSet,
    ignore_dirs: SmallVec<[DirRule; 8]>,
    include: RuleSet,
}

impl FileFilterEngine {
    /// Compiles the rules in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Config`] if any glob is invalid.
    pub fn new(config: &FilterConfig) -> Result<Self, ScanError> {
        Ok(Self {
            cli_exclude: RuleSet::new(&config.cli_exclude, "command-line exclude")?,
            cli_include: RuleSet::new(&config.cli_include, "command-line include")?,
            exclude: RuleSet::new(&config.exclude, "exclude")?,
            ignore_files: RuleSet::new(&config.ignore_files, "ignored file")?,
            ignore_dirs: config
                .ignore_dirs
                .iter()
                .filter_map(|d| DirRule::new(d))
                .collect(),
            include: RuleSet::new(&config.include, "include")?,
        })
    }

    /// Decides whether `path` is processed and why.
    #[must_use]
    pub fn should_include(&self, path: &Utf8Path) -> FilterDecision {
        if let Some(rule) = self.cli_exclude.first_match(path) {
            return FilterDecision::exclude(
                FilterStage::CliExclude,
                FilterReason::CliExcludeMatched,
                Some(rule),
            );
        }

        if !self.cli_include.is_empty() {
            return match self.cli_include.first_match(path) {
                Some(rule) => FilterDecision::include(
                    FilterStage::CliInclude,
                    FilterReason::CliIncludeMatched,
                    Some(rule),
                ),
                None => FilterDecision::exclude(
                    FilterStage::CliInclude,
                    FilterReason::CliIncludeUnmatched,
                    None,
                ),
            };
        }

        if let Some(rule) = self.exclude.first_match(path) {
            return FilterDecision::exclude(
                FilterStage::ProfileExclude,
                FilterReason::ExcludePatternMatched,
                Some(rule),
            );
        }
        if let Some(rule) = self.ignore_files.first_match(path) {
            return FilterDecision::exclude(
                FilterStage::ProfileExclude,
                FilterReason::IgnoredFile,
                Some(rule),
            );
        }
        if let Some(rule) = path.parent().and_then(|dir| self.ignored_directory(dir)) {
            return FilterDecision::exclude(
                FilterStage::ProfileExclude,
                FilterReason::IgnoredDirectory,
                Some(rule),
            );
        }

        if self.include.is_empty() {
            return FilterDecision::include(
                FilterStage::ProfileInclude,
                FilterReason::DefaultAllow,
                None,
            );
        }
        match self.include.first_match(path) {
            Some(rule) => FilterDecision::include(
                FilterStage::ProfileInclude,
                FilterReason::IncludePatternMatched,
                Some(rule),
            ),
            None => FilterDecision::exclude(
                FilterStage::ProfileInclude,
                FilterReason::IncludePatternUnmatched,
                None,
            ),
        }
    }

    /// Returns the ignored-directory entry matching any component of `dir`.
    ///
    /// A component matches when it equals the entry or starts with it. An
    /// entry written with a trailing `/` only matches the exact name.
    #[must_use]
    pub fn ignored_directory(&self, dir: &Utf8Path) -> Option<&str> {
        dir.components()
            .filter_map(|component| match component {
                Utf8Component::Normal(name) => Some(name),
                _ => None,
            })
            .find_map(|name| {
                self.ignore_dirs
                    .iter()
                    .find(|rule| rule.matches(name))
                    .map(|rule| rule.pattern.as_str())
            })
    }

    /// Returns `true` if the walker may skip descending into `dir`.
    ///
    /// Command-line includes override profile ignores, so nothing is pruned
    /// while any are configured.
    #[must_use]
    pub fn prunes_directory(&self, dir: &Utf8Path) -> bool {
        self.cli_include.is_empty() && self.ignored_directory(dir).is_some()
    }
}

impl FileFilter for FileFilterEngine {
    #[inline]
    fn should_process(&self, path: &Utf8Path) -> bool {
        self.should_include(path).include
    }
}
