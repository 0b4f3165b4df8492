//! File discovery, batch scanning, and safe rewriting for emoji-lint.
//!
//! This crate turns the detection engine in `el-detect` into a batch tool:
//! it expands input paths into a filtered file list, scans files on a worker
//! pool, and rewrites them atomically with optional backups.
//!
//! # Overview
//!
//! The main entry point is [`EmojiScanner`], which combines:
//!
//! - [`FileFilterEngine`]: Four-stage include/exclude precedence
//! - [`FileWalker`]: Directory traversal respecting `.gitignore`
//! - [`FileInspector`]: Size-limited read, text classification, detection
//! - [`Processor`]: Read-only batch scanning on a rayon pool
//! - [`Modifier`]: Backup-aware atomic rewriting on the same pool
//! - [`ProcessStats`]: Atomic statistics for progress tracking
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8PathBuf;
//! use el_core::Config;
//! use el_scanner::EmojiScanner;
//! use tokio_util::sync::CancellationToken;
//!
//! let scanner = EmojiScanner::new(Config::default())?;
//! let report = scanner.scan(&[Utf8PathBuf::from("./docs")], &CancellationToken::new())?;
//!
//! for result in report.results.iter().filter(|r| r.has_matches()) {
//!     println!("{}: {} matches", result.path, result.detection.total_count);
//! }
//! # Ok::<(), el_scanner::ScanError>(())
//! ```
//!
//! # Streaming API
//!
//! ```ignore
//! use el_scanner::{EmojiScanner, ProcessUpdate};
//! use tokio::sync::mpsc;
//!
//! let (tx, mut rx) = mpsc::channel(256);
//! let scanner = Arc::new(EmojiScanner::new(config)?);
//!
//! let worker = Arc::clone(&scanner);
//! tokio::task::spawn_blocking(move || worker.scan_streaming(&inputs, tx, &cancel));
//!
//! while let Some(update) = rx.recv().await {
//!     match update {
//!         ProcessUpdate::PathsQueued(count) => println!("Scanning {count} files"),
//!         ProcessUpdate::FileProcessed(result) => println!("{}", result.path),
//!         ProcessUpdate::Complete(stats) => println!("{} matches", stats.matches),
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! EmojiScanner (main entry point)
//!     │
//!     ├── FileWalker (collect paths)
//!     │       │
//!     │       ├── WalkBuilder (ignore crate)
//!     │       └── FileFilterEngine (globset)
//!     │
//!     ├── Processor ─┐
//!     │              ├── worker pool (rayon + CancellationToken)
//!     ├── Modifier ──┘
//!     │       │
//!     │       └── FileInspector (read → classify → detect)
//!     │               │
//!     │               ├── TextClassifier (el-detect)
//!     │               └── Detector + Allowlist (el-detect)
//!     │
//!     └── ProcessStats (atomic counters)
//! ```
//!
//! # Guarantees
//!
//! - **One result per input**: every discovered path yields exactly one
//!   result, including paths skipped by cancellation
//! - **Scan/clean agreement**: both go through the same [`FileInspector`]
//! - **No partial writes**: a rewrite either replaces the file completely or
//!   leaves it untouched

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
mod filter;
mod inspect;
mod modifier;
mod pool;
mod processor;
mod stats;
mod walker;

pub use error::ScanError;
pub use filter::{AcceptAllFilter, FileFilter, FileFilterEngine};
pub use inspect::{FileInspector, Inspection};
pub use modifier::{MAX_PASSES, ModifyResult, Modifier};
pub use processor::{ProcessOutcome, ProcessResult, ProcessUpdate, Processor};
pub use stats::{ProcessStats, StatsSnapshot};
pub use walker::FileWalker;

use std::fmt;
use std::sync::Arc;

use camino::Utf8PathBuf;
use el_core::{Config, Diagnostics, TracingDiagnostics};
use el_detect::{Allowlist, DetectOptions, Detector, PatternCatalog, PatternSet, TextClassifier};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Results of a read-only batch.
#[derive(Debug)]
pub struct ScanReport {
    /// One result per discovered file, in discovery order.
    pub results: Vec<ProcessResult>,
    /// Batch counters.
    pub stats: StatsSnapshot,
}

impl ScanReport {
    /// Returns `true` if any file has non-allowed matches.
    #[inline]
    #[must_use]
    pub const fn has_findings(&self) -> bool {
        self.stats.has_findings()
    }
}

/// Results of a rewriting batch.
#[derive(Debug)]
pub struct CleanReport {
    /// One result per discovered file, in discovery order.
    pub results: Vec<ModifyResult>,
    /// Batch counters.
    pub stats: StatsSnapshot,
}

/// Scans and cleans files according to one [`Config`].
///
/// The pattern catalog, allowlist, and filter engine are built once at
/// construction and shared read-only by every worker.
pub struct EmojiScanner {
    config: Config,
    engine: Arc<FileFilterEngine>,
    inspector: Arc<FileInspector>,
    allowlist: Option<Arc<Allowlist>>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl fmt::Debug for EmojiScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmojiScanner")
            .field("config", &self.config)
            .field("engine", &self.engine)
            .field("inspector", &self.inspector)
            .field("allowlist", &self.allowlist)
            .finish_non_exhaustive()
    }
}

impl EmojiScanner {
    /// Creates a scanner that reports through `tracing`.
    ///
    /// # Errors
    ///
    /// See [`with_diagnostics`](Self::with_diagnostics).
    pub fn new(config: Config) -> Result<Self, ScanError> {
        Self::with_diagnostics(config, Arc::new(TracingDiagnostics))
    }

    /// Creates a scanner that reports through `diagnostics`.
    ///
    /// # Errors
    ///
    /// - [`ScanError::Config`] if the configuration is invalid, a glob does
    ///   not compile, or the replacement text is itself detectable
    /// - [`ScanError::Pattern`] if the pattern catalog cannot be built
    pub fn with_diagnostics(
        config: Config,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<Self, ScanError> {
        config.validate()?;

        let catalog = Arc::new(PatternCatalog::new(PatternSet::from_config(
            &config.patterns,
        )?)?);
        let detector = Detector::new(catalog, DetectOptions::from(&config.processing));
        let inspector = Arc::new(FileInspector::new(
            detector,
            TextClassifier::new(config.classifier),
            &config.processing,
        ));

        let allowlist = Allowlist::new(&config.allowlist);
        let allowlist = (!allowlist.is_empty()).then(|| Arc::new(allowlist));
        let engine = Arc::new(FileFilterEngine::new(&config.filter)?);

        let scanner = Self {
            config,
            engine,
            inspector,
            allowlist,
            diagnostics,
        };
        // Surface a bad replacement before any file is touched.
        scanner.modifier()?;
        Ok(scanner)
    }

    /// The configuration in use.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The shared filter engine.
    #[inline]
    #[must_use]
    pub fn filter_engine(&self) -> &FileFilterEngine {
        &self.engine
    }

    /// The shared inspector.
    #[inline]
    #[must_use]
    pub fn inspector(&self) -> &FileInspector {
        &self.inspector
    }

    /// The configured worker count (`0` means one per core).
    #[inline]
    #[must_use]
    pub fn workers(&self) -> usize {
        self.config.workers.unwrap_or(0)
    }

    /// Expands `inputs` into the filtered file list.
    pub fn discover(&self, inputs: &[Utf8PathBuf]) -> Result<Vec<Utf8PathBuf>, ScanError> {
        FileWalker::new(Arc::clone(&self.engine), Arc::clone(&self.diagnostics))
            .collect_paths(inputs)
    }

    /// Creates a processor sharing this scanner's catalog and allowlist.
    #[must_use]
    pub fn processor(&self) -> Processor {
        Processor::new(
            Arc::clone(&self.inspector),
            self.allowlist.as_ref().map(Arc::clone),
            Arc::clone(&self.diagnostics),
        )
    }

    /// Creates a modifier sharing this scanner's catalog and allowlist.
    pub fn modifier(&self) -> Result<Modifier, ScanError> {
        Modifier::new(
            Arc::clone(&self.inspector),
            self.allowlist.as_ref().map(Arc::clone),
            self.config.modify.clone(),
            Arc::clone(&self.diagnostics),
        )
    }

    /// Discovers and scans files without modifying them.
    ///
    /// # Errors
    ///
    /// Only discovery errors are returned; per-file failures are in the
    /// report.
    pub fn scan(
        &self,
        inputs: &[Utf8PathBuf],
        cancel: &CancellationToken,
    ) -> Result<ScanReport, ScanError> {
        let paths = self.discover(inputs)?;
        let processor = self.processor();
        let results = processor.process_files_concurrently(&paths, self.workers(), cancel);
        Ok(ScanReport {
            results,
            stats: processor.stats(),
        })
    }

    /// Discovers and cleans files.
    ///
    /// # Errors
    ///
    /// Only discovery and construction errors are returned; per-file
    /// failures are in the report.
    pub fn clean(
        &self,
        inputs: &[Utf8PathBuf],
        cancel: &CancellationToken,
    ) -> Result<CleanReport, ScanError> {
        let paths = self.discover(inputs)?;
        let modifier = self.modifier()?;
        let results = modifier.modify_files_concurrently(&paths, self.workers(), cancel);
        Ok(CleanReport {
            results,
            stats: modifier.stats(),
        })
    }

    /// Discovers files and scans them, streaming updates over `tx`.
    ///
    /// Must be called off the async runtime. See
    /// [`Processor::process_streaming`] for the update order.
    #[allow(clippy::needless_pass_by_value)] // Sender is moved into the processor
    pub fn scan_streaming(
        &self,
        inputs: &[Utf8PathBuf],
        tx: mpsc::Sender<ProcessUpdate>,
        cancel: &CancellationToken,
    ) -> Result<(), ScanError> {
        let paths = self.discover(inputs)?;
        self.processor()
            .process_streaming(&paths, self.workers(), tx, cancel);
        Ok(())
    }
}
