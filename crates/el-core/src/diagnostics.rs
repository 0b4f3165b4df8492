//! Injected diagnostics sink.
//!
//! Library code never touches global logging state directly. Components take
//! an `Arc<dyn Diagnostics>` at construction and report through it; the CLI
//! hands them a [`TracingDiagnostics`], tests hand them a
//! [`MemoryDiagnostics`] and inspect what was recorded.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;

/// Severity of a diagnostic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Fine-grained detail, such as individual filter decisions.
    Debug,
    /// Progress and summary information.
    Info,
    /// Recoverable problems.
    Warn,
    /// Per-file failures.
    Error,
}

impl Level {
    /// Returns the lowercase level name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A captured diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Severity.
    pub level: Level,
    /// Message text.
    pub message: String,
    /// File the message concerns, if any.
    pub path: Option<Utf8PathBuf>,
}

/// Destination for diagnostics emitted by the engine.
///
/// Only [`log`](Diagnostics::log) is required; the level helpers forward to it.
///
/// # Examples
///
/// ```
/// use el_core::{Diagnostics, Level, MemoryDiagnostics};
///
/// let sink = MemoryDiagnostics::new();
/// sink.warn("file too large", None);
/// assert_eq!(sink.records()[0].level, Level::Warn);
/// ```
pub trait Diagnostics: Send + Sync {
    /// Records a message at the given level.
    fn log(&self, level: Level, message: &str, path: Option<&Utf8Path>);

    /// Records a debug message.
    fn debug(&self, message: &str, path: Option<&Utf8Path>) {
        self.log(Level::Debug, message, path);
    }

    /// Records an informational message.
    fn info(&self, message: &str, path: Option<&Utf8Path>) {
        self.log(Level::Info, message, path);
    }

    /// Records a warning.
    fn warn(&self, message: &str, path: Option<&Utf8Path>) {
        self.log(Level::Warn, message, path);
    }

    /// Records an error.
    fn error(&self, message: &str, path: Option<&Utf8Path>) {
        self.log(Level::Error, message, path);
    }
}

/// Forwards every record to the `tracing` macros.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn log(&self, level: Level, message: &str, path: Option<&Utf8Path>) {
        match (level, path) {
            (Level::Debug, Some(path)) => tracing::debug!(path = %path, "{message}"),
            (Level::Debug, None) => tracing::debug!("{message}"),
            (Level::Info, Some(path)) => tracing::info!(path = %path, "{message}"),
            (Level::Info, None) => tracing::info!("{message}"),
            (Level::Warn, Some(path)) => tracing::warn!(path = %path, "{message}"),
            (Level::Warn, None) => tracing::warn!("{message}"),
            (Level::Error, Some(path)) => tracing::error!(path = %path, "{message}"),
            (Level::Error, None) => tracing::error!("{message}"),
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    #[inline]
    fn log(&self, _level: Level, _message: &str, _path: Option<&Utf8Path>) {}
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    records: Mutex<Vec<Record>>,
}

impl MemoryDiagnostics {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    /// Returns the records at `level`.
    #[must_use]
    pub fn at_level(&self, level: Level) -> Vec<Record> {
        self.records
            .lock()
            .iter()
            .filter(|record| record.level == level)
            .cloned()
            .collect()
    }

    /// Returns true if any message contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|record| record.message.contains(needle))
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn log(&self, level: Level, message: &str, path: Option<&Utf8Path>) {
        self.records.lock().push(Record {
            level,
            message: message.to_owned(),
            path: path.map(Utf8Path::to_path_buf),
        });
    }
}
