//! Error types for the el-scanner crate.
//!
//! This module provides the [`ScanError`] type for errors that can occur
//! during discovery, scanning, and rewriting.

use camino::Utf8PathBuf;
use el_detect::PatternError;

/// Errors that can occur during scanning and cleaning.
///
/// # Error Recovery Strategy
///
/// - **Per-file errors** ([`Access`](ScanError::Access),
///   [`Oversized`](ScanError::Oversized), [`Backup`](ScanError::Backup),
///   [`Write`](ScanError::Write), [`Permissions`](ScanError::Permissions),
///   [`NotProcessed`](ScanError::NotProcessed)): recorded in that file's
///   result; the batch continues
/// - **Construction and discovery errors** ([`Walk`](ScanError::Walk),
///   [`NonUtf8Path`](ScanError::NonUtf8Path), [`Config`](ScanError::Config),
///   [`Pattern`](ScanError::Pattern)): fatal, returned before any file is
///   touched
///
/// Binary files are not errors; they are reported through
/// [`SkipReason::BinaryFile`](el_core::SkipReason::BinaryFile).
///
/// # Examples
///
/// ```
/// use el_scanner::ScanError;
///
/// let err = ScanError::oversized("big.log", 20, 10);
/// assert!(err.is_recoverable());
/// assert_eq!(err.path().map(|p| p.as_str()), Some("big.log"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The file could not be found, opened, or read.
    #[error("failed to read file {path}: {source}")]
    Access {
        /// The file that could not be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is larger than the configured limit.
    #[error("file {path} is {size} bytes, over the {limit} byte limit")]
    Oversized {
        /// The oversized file.
        path: Utf8PathBuf,
        /// Observed size in bytes.
        size: u64,
        /// Configured limit in bytes.
        limit: u64,
    },

    /// The backup copy could not be written; the original is unmodified.
    #[error("failed to create backup for {path}: {source}")]
    Backup {
        /// The file being backed up.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The temp file could not be created, written, synced, or renamed; the
    /// original is untouched.
    #[error("failed to write file {path}: {source}")]
    Write {
        /// The file being rewritten.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The original mode bits could not be carried over; the original is
    /// untouched.
    #[error("failed to preserve permissions for {path}: {source}")]
    Permissions {
        /// The file being rewritten.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The batch was cancelled before this file was dispatched.
    #[error("not processed (cancelled): {path}")]
    NotProcessed {
        /// The skipped file.
        path: Utf8PathBuf,
    },

    /// Failed to walk a directory.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The pattern catalog could not be built.
    #[error("invalid patterns: {0}")]
    Pattern(#[from] PatternError),
}

impl ScanError {
    /// Creates a new [`ScanError::Access`] error.
    #[inline]
    pub fn access(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Access {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::Oversized`] error.
    #[inline]
    pub fn oversized(path: impl Into<Utf8PathBuf>, size: u64, limit: u64) -> Self {
        Self::Oversized {
            path: path.into(),
            size,
            limit,
        }
    }

    /// Creates a new [`ScanError::Backup`] error.
    #[inline]
    pub fn backup(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Backup {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::Write`] error.
    #[inline]
    pub fn write(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::Permissions`] error.
    #[inline]
    pub fn permissions(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Permissions {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::NotProcessed`] error.
    #[inline]
    pub fn not_processed(path: impl Into<Utf8PathBuf>) -> Self {
        Self::NotProcessed { path: path.into() }
    }

    /// Creates a new [`ScanError::Config`] error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns `true` if this error concerns a single file and the batch can
    /// continue.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Access { .. }
                | Self::Oversized { .. }
                | Self::Backup { .. }
                | Self::Write { .. }
                | Self::Permissions { .. }
                | Self::NotProcessed { .. }
        )
    }

    /// Returns `true` if this error is fatal (scanning should stop).
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Returns `true` for [`ScanError::NotProcessed`].
    #[inline]
    #[must_use]
    pub const fn is_not_processed(&self) -> bool {
        matches!(self, Self::NotProcessed { .. })
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Access { path, .. }
            | Self::Oversized { path, .. }
            | Self::Backup { path, .. }
            | Self::Write { path, .. }
            | Self::Permissions { path, .. }
            | Self::NotProcessed { path } => Some(path),
            Self::Walk(_) | Self::NonUtf8Path(_) | Self::Config(_) | Self::Pattern(_) => None,
        }
    }
}

impl From<el_core::ConfigError> for ScanError {
    fn from(err: el_core::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn test_scan_error_access() {
        let err = ScanError::access(
            "src/main.rs",
            io::Error::new(io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.is_recoverable());
        assert!(!err.is_fatal());
        assert_eq!(err.path().map(|p| p.as_str()), Some("src/main.rs"));
        assert!(err.to_string().contains("src/main.rs"));
    }

    #[test]
    fn test_scan_error_oversized_display() {
        let err = ScanError::oversized("dump.sql", 2048, 1024);
        assert_eq!(
            err.to_string(),
            "file dump.sql is 2048 bytes, over the 1024 byte limit"
        );
    }

    #[test]
    fn test_scan_error_write_family_is_recoverable() {
        let denied = || io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        for err in [
            ScanError::backup("a.txt", denied()),
            ScanError::write("a.txt", denied()),
            ScanError::permissions("a.txt", denied()),
        ] {
            assert!(err.is_recoverable());
            assert_eq!(err.path().map(|p| p.as_str()), Some("a.txt"));
        }
    }

    #[test]
    fn test_scan_error_not_processed() {
        let err = ScanError::not_processed("late.md");
        assert!(err.is_not_processed());
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "not processed (cancelled): late.md");
    }

    #[test]
    fn test_scan_error_config() {
        let err = ScanError::config("invalid glob '[': unclosed character class");
        assert!(err.is_fatal());
        assert!(err.path().is_none());
        assert!(err.to_string().starts_with("invalid configuration:"));
    }

    #[test]
    fn test_scan_error_non_utf8() {
        let err = ScanError::NonUtf8Path(std::path::PathBuf::from("test"));
        assert!(err.is_fatal());
        assert!(err.path().is_none());
    }

    #[test]
    fn test_scan_error_from_pattern_error() {
        let err: ScanError = PatternError::EmptyPattern { kind: "custom" }.into();
        assert!(matches!(err, ScanError::Pattern(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_scan_error_from_config_error() {
        let err: ScanError = el_core::ConfigError::invalid("buffer_size", "must be positive").into();
        assert!(err.to_string().contains("buffer_size"));
    }
}
