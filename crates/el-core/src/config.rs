//! Configuration structures for emoji-lint.
//!
//! - [`ProcessingConfig`] - Which matchers run and how files are read
//! - [`ClassifierConfig`] - Binary/text classification thresholds
//! - [`ModifyConfig`] - How the cleaner rewrites files
//! - [`FilterConfig`] - Command-line and profile include/exclude rules
//! - [`PatternConfig`] - Emoticon/custom literals and matcher policy
//! - [`Config`] - Root configuration combining all settings
//!
//! All configuration types implement [`Default`] and deserialize with
//! `#[serde(default)]`, so a partial JSON file only overrides what it names.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default upper bound on the size of a scanned file (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default read buffer size (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Settings consumed by the processor for every file.
///
/// # Examples
///
/// ```
/// use el_core::ProcessingConfig;
///
/// let config = ProcessingConfig::default();
/// assert!(config.enable_unicode);
/// assert!(!config.enable_emoticons);
/// assert_eq!(config.max_file_size, 10 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Run the Unicode sequence matcher.
    pub enable_unicode: bool,

    /// Run the text emoticon matcher.
    pub enable_emoticons: bool,

    /// Run the custom literal matcher.
    pub enable_custom: bool,

    /// Files larger than this many bytes are skipped with an error.
    /// `0` disables the limit.
    pub max_file_size: u64,

    /// Capacity of the read buffer in bytes.
    pub buffer_size: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            enable_unicode: true,
            enable_emoticons: false,
            enable_custom: true,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl ProcessingConfig {
    /// Returns the size limit, or `None` when unlimited.
    #[inline]
    #[must_use]
    pub const fn size_limit(&self) -> Option<u64> {
        if self.max_file_size == 0 {
            None
        } else {
            Some(self.max_file_size)
        }
    }

    /// Checks option values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError::invalid("buffer_size", "must be positive"));
        }
        Ok(())
    }
}

/// Thresholds for telling binary content from text.
///
/// Both values are fractions of the decoded units in the content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Largest tolerated share of malformed UTF-8 sequences.
    pub invalid_utf8_tolerance: f64,

    /// Largest tolerated share of control characters other than tab, LF, and CR.
    pub control_char_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            invalid_utf8_tolerance: 0.05,
            control_char_threshold: 0.10,
        }
    }
}

impl ClassifierConfig {
    /// Checks that both thresholds are fractions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("invalid_utf8_tolerance", self.invalid_utf8_tolerance),
            ("control_char_threshold", self.control_char_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(name, "must be between 0.0 and 1.0"));
            }
        }
        Ok(())
    }
}

/// Settings for rewriting files.
///
/// # Examples
///
/// ```
/// use el_core::ModifyConfig;
///
/// let config = ModifyConfig::default().with_dry_run(true);
/// assert!(config.replacement.is_empty());
/// assert!(config.create_backup);
/// assert!(config.dry_run);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifyConfig {
    /// Text written in place of every removed match.
    pub replacement: String,

    /// Copy the original to `<name>.backup.<timestamp>` before rewriting.
    pub create_backup: bool,

    /// Leave allowlisted matches in place.
    pub respect_allowlist: bool,

    /// Carry the original mode bits over to the rewritten file.
    pub preserve_permissions: bool,

    /// Compute results without touching the filesystem.
    pub dry_run: bool,
}

impl Default for ModifyConfig {
    fn default() -> Self {
        Self {
            replacement: String::new(),
            create_backup: true,
            respect_allowlist: true,
            preserve_permissions: true,
            dry_run: false,
        }
    }
}

impl ModifyConfig {
    /// Sets the replacement text.
    #[must_use]
    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = replacement.into();
        self
    }

    /// Enables or disables backups.
    #[must_use]
    pub fn with_backup(mut self, create_backup: bool) -> Self {
        self.create_backup = create_backup;
        self
    }

    /// Enables or disables dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Enables or disables allowlist filtering.
    #[must_use]
    pub fn with_respect_allowlist(mut self, respect: bool) -> Self {
        self.respect_allowlist = respect;
        self
    }

    /// Enables or disables carrying the original mode bits over.
    #[must_use]
    pub fn with_preserve_permissions(mut self, preserve: bool) -> Self {
        self.preserve_permissions = preserve;
        self
    }
}

/// Include/exclude rules applied during discovery.
///
/// The `cli_*` lists come from the command line and take precedence over the
/// profile lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Command-line include globs.
    pub cli_include: Vec<String>,

    /// Command-line exclude globs.
    pub cli_exclude: Vec<String>,

    /// Profile include globs. Empty means every file is allowed.
    pub include: Vec<String>,

    /// Profile exclude globs.
    pub exclude: Vec<String>,

    /// File names or globs that are never processed.
    pub ignore_files: Vec<String>,

    /// Directory names; any path component equal to or starting with one is
    /// skipped. A trailing `/` (`.git/`) restricts an entry to the exact name.
    pub ignore_dirs: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            cli_include: Vec::new(),
            cli_exclude: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
            // Backups written by the modifier.
            ignore_files: vec!["*.backup.*".to_owned()],
            ignore_dirs: vec![
                ".git/".to_owned(),
                "node_modules".to_owned(),
                "target".to_owned(),
                "__pycache__".to_owned(),
            ],
        }
    }
}

/// Literal patterns and matcher policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Emoticon literals. `None` keeps the built-in list.
    pub emoticons: Option<Vec<String>>,

    /// Custom literal markers.
    pub custom: Vec<String>,

    /// Report a regional indicator without a partner as a flag match.
    pub lone_regional_indicator: bool,

    /// JSON file replacing the bundled Unicode range table.
    pub ranges_file: Option<Utf8PathBuf>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            emoticons: None,
            custom: Vec::new(),
            lone_regional_indicator: true,
            ranges_file: None,
        }
    }
}

/// Root configuration for emoji-lint.
///
/// # Examples
///
/// ```
/// use el_core::Config;
///
/// let config: Config = serde_json::from_str(r#"{"allowlist": ["✅"]}"#).unwrap();
/// assert_eq!(config.allowlist, vec!["✅"]);
/// assert!(config.processing.enable_unicode);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-file processing settings.
    pub processing: ProcessingConfig,

    /// Binary/text thresholds.
    pub classifier: ClassifierConfig,

    /// Rewrite settings.
    pub modify: ModifyConfig,

    /// Discovery filter rules.
    pub filter: FilterConfig,

    /// Literal patterns and matcher policy.
    pub patterns: PatternConfig,

    /// Patterns permitted to remain in content.
    pub allowlist: Vec<String>,

    /// Worker threads. `None` or `Some(0)` sizes to available parallelism.
    pub workers: Option<usize>,
}

impl Config {
    /// Loads a configuration from a JSON file and validates it.
    pub fn from_json_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.processing.validate()?;
        self.classifier.validate()?;
        let empty_emoticon = self
            .patterns
            .emoticons
            .as_ref()
            .is_some_and(|emoticons| emoticons.iter().any(String::is_empty));
        if empty_emoticon {
            return Err(ConfigError::invalid(
                "patterns.emoticons",
                "empty patterns are not allowed",
            ));
        }
        if self.patterns.custom.iter().any(String::is_empty) {
            return Err(ConfigError::invalid(
                "patterns.custom",
                "empty patterns are not allowed",
            ));
        }
        Ok(())
    }
}
