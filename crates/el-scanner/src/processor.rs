//! Read-only batch processing.
//!
//! [`Processor`] runs every file through the shared [`FileInspector`], applies
//! the allowlist, and wraps the outcome in a [`ProcessResult`]. One file's
//! failure never aborts the batch.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use el_core::{DetectionResult, Diagnostics, SkipReason};
use el_detect::Allowlist;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::ScanError;
use crate::inspect::{FileInspector, Inspection};
use crate::pool;
use crate::stats::{ProcessStats, StatsSnapshot};

/// How a single file fared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessOutcome {
    /// The file was read and detection ran.
    Completed,
    /// The file was read but not a detection candidate (binary).
    Skipped,
    /// The file could not be processed.
    Failed,
    /// The batch was cancelled before the file was dispatched.
    NotProcessed,
}

impl ProcessOutcome {
    /// Returns the lowercase name used in reports.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
            Self::NotProcessed => "not_processed",
        }
    }

    /// Classifies a per-file error and skip state.
    pub(crate) const fn from_parts(error: Option<&ScanError>, skipped: bool) -> Self {
        match error {
            Some(ScanError::NotProcessed { .. }) => Self::NotProcessed,
            Some(_) => Self::Failed,
            None if skipped => Self::Skipped,
            None => Self::Completed,
        }
    }
}

impl fmt::Display for ProcessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of processing one file.
///
/// `detection` is already filtered through the allowlist. When `error` is set,
/// `detection` is empty with `success == false`.
#[derive(Debug)]
pub struct ProcessResult {
    /// The file as it was handed to the processor.
    pub path: Utf8PathBuf,
    /// Non-allowed matches.
    pub detection: DetectionResult,
    /// The per-file error, if any.
    pub error: Option<ScanError>,
    /// Wall time spent on this file.
    pub duration: Duration,
}

impl ProcessResult {
    fn failed(path: &Utf8Path, error: ScanError, duration: Duration) -> Self {
        Self {
            path: path.to_owned(),
            detection: DetectionResult::failed(),
            error: Some(error),
            duration,
        }
    }

    /// Returns how this file fared.
    #[inline]
    #[must_use]
    pub const fn outcome(&self) -> ProcessOutcome {
        ProcessOutcome::from_parts(self.error.as_ref(), self.detection.is_skipped())
    }

    /// Returns `true` if detection ran and found non-allowed matches.
    #[inline]
    #[must_use]
    pub fn has_matches(&self) -> bool {
        self.detection.success && self.detection.total_count > 0
    }
}

/// Update sent during a streaming batch.
///
/// `FileProcessed` is boxed to keep the enum small on the channel.
#[derive(Debug)]
pub enum ProcessUpdate {
    /// Number of files about to be processed (sent once, first).
    PathsQueued(usize),
    /// One file finished (sent once per file, in completion order).
    FileProcessed(Box<ProcessResult>),
    /// The batch is done (sent once, last).
    Complete(StatsSnapshot),
}

/// Scans files without modifying them.
pub struct Processor {
    inspector: Arc<FileInspector>,
    allowlist: Option<Arc<Allowlist>>,
    diagnostics: Arc<dyn Diagnostics>,
    stats: ProcessStats,
}

impl fmt::Debug for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Processor")
            .field("inspector", &self.inspector)
            .field("allowlist", &self.allowlist)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Processor {
    /// Creates a processor. An empty allowlist behaves like `None`.
    #[must_use]
    pub fn new(
        inspector: Arc<FileInspector>,
        allowlist: Option<Arc<Allowlist>>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            inspector,
            allowlist,
            diagnostics,
            stats: ProcessStats::new(),
        }
    }

    /// Counters for the most recent batch.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Processes a single file.
    ///
    /// Oversized and unreadable files yield a result carrying the error;
    /// binary files yield a skipped result.
    pub fn process_file(&self, path: &Utf8Path) -> ProcessResult {
        let started = Instant::now();

        let result = match self.inspector.inspect(path) {
            Ok(Inspection::Binary(reason)) => {
                self.diagnostics
                    .debug(&format!("skipping binary file ({reason})"), Some(path));
                ProcessResult {
                    path: path.to_owned(),
                    detection: DetectionResult::skipped(SkipReason::BinaryFile),
                    error: None,
                    duration: started.elapsed(),
                }
            }
            Ok(Inspection::Text { detection, .. }) => {
                let detection = Allowlist::apply(&detection, self.allowlist.as_deref());
                if detection.total_count > 0 {
                    self.diagnostics.debug(
                        &format!("found {} matches", detection.total_count),
                        Some(path),
                    );
                }
                ProcessResult {
                    path: path.to_owned(),
                    detection,
                    error: None,
                    duration: started.elapsed(),
                }
            }
            Err(e) => {
                self.diagnostics.warn(&e.to_string(), Some(path));
                ProcessResult::failed(path, e, started.elapsed())
            }
        };

        self.record(&result);
        result
    }

    /// Processes files one after another.
    ///
    /// Equivalent to [`process_files_concurrently`](Self::process_files_concurrently)
    /// with a single worker and a token that is never cancelled.
    pub fn process_files(&self, paths: &[Utf8PathBuf]) -> Vec<ProcessResult> {
        self.process_files_concurrently(paths, 1, &CancellationToken::new())
    }

    /// Processes files on a fixed-size worker pool.
    ///
    /// `workers == 0` uses one worker per core; `1` runs sequentially.
    /// Returns exactly one result per path. Paths not yet dispatched when
    /// `cancel` fires are reported as [`ProcessOutcome::NotProcessed`].
    /// Statistics are reset at the start of each batch.
    pub fn process_files_concurrently(
        &self,
        paths: &[Utf8PathBuf],
        workers: usize,
        cancel: &CancellationToken,
    ) -> Vec<ProcessResult> {
        self.stats.reset();

        let results = pool::run(
            paths,
            workers,
            cancel,
            self.diagnostics.as_ref(),
            |path| self.process_file(path),
            |path| self.not_processed(path),
        );

        self.log_summary();
        results
    }

    /// Processes files on the worker pool, sending each result over `tx`.
    ///
    /// Updates arrive in this order:
    /// 1. [`ProcessUpdate::PathsQueued`] once
    /// 2. [`ProcessUpdate::FileProcessed`] once per path
    /// 3. [`ProcessUpdate::Complete`] once
    ///
    /// Must be called off the async runtime (for example from
    /// `spawn_blocking`). If the receiver is dropped, remaining files are not
    /// processed and the method returns early.
    #[allow(clippy::needless_pass_by_value)] // Sender is shared by the pool threads
    pub fn process_streaming(
        &self,
        paths: &[Utf8PathBuf],
        workers: usize,
        tx: mpsc::Sender<ProcessUpdate>,
        cancel: &CancellationToken,
    ) {
        self.stats.reset();

        if tx.blocking_send(ProcessUpdate::PathsQueued(paths.len())).is_err() {
            return;
        }

        let send = |result: ProcessResult| {
            // Ignored if the receiver has gone away.
            let _ = tx.blocking_send(ProcessUpdate::FileProcessed(Box::new(result)));
        };

        pool::run(
            paths,
            workers,
            cancel,
            self.diagnostics.as_ref(),
            |path| {
                if !tx.is_closed() {
                    send(self.process_file(path));
                }
            },
            |path| {
                if !tx.is_closed() {
                    send(self.not_processed(path));
                }
            },
        );

        self.log_summary();
        let _ = tx.blocking_send(ProcessUpdate::Complete(self.stats.snapshot()));
    }

    fn not_processed(&self, path: &Utf8Path) -> ProcessResult {
        let result = ProcessResult::failed(path, ScanError::not_processed(path), Duration::ZERO);
        self.record(&result);
        result
    }

    fn record(&self, result: &ProcessResult) {
        self.stats.increment_total();
        match result.outcome() {
            ProcessOutcome::Completed if result.detection.total_count == 0 => {
                self.stats.increment_clean();
            }
            ProcessOutcome::Completed => {
                self.stats.increment_with_matches();
                self.stats.add_matches(result.detection.total_count);
            }
            ProcessOutcome::Skipped => self.stats.increment_skipped(),
            ProcessOutcome::Failed => self.stats.increment_errors(),
            ProcessOutcome::NotProcessed => self.stats.increment_not_processed(),
        }
    }

    fn log_summary(&self) {
        let stats = self.stats.snapshot();
        self.diagnostics.info(
            &format!(
                "processed {} files: {} matches in {} files, {} skipped, {} errors, {} not processed",
                stats.total,
                stats.matches,
                stats.with_matches,
                stats.skipped,
                stats.errors,
                stats.not_processed
            ),
            None,
        );
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use el_core::{ClassifierConfig, MemoryDiagnostics, NullDiagnostics, ProcessingConfig};
    use el_detect::{DetectOptions, Detector, PatternCatalog, TextClassifier};
    use tempfile::TempDir;

    use super::*;

    fn inspector(config: &ProcessingConfig) -> Arc<FileInspector> {
        let catalog = Arc::new(PatternCatalog::with_defaults().unwrap());
        Arc::new(FileInspector::new(
            Detector::new(catalog, DetectOptions::from(config)),
            TextClassifier::new(ClassifierConfig::default()),
            config,
        ))
    }

    fn processor(allow: &[&str]) -> Processor {
        let allowlist = Allowlist::new(allow.iter().copied());
        Processor::new(
            inspector(&ProcessingConfig::default()),
            (!allowlist.is_empty()).then(|| Arc::new(allowlist)),
            Arc::new(NullDiagnostics),
        )
    }

    fn write(dir: &TempDir, name: &str, content: &[u8]) -> Utf8PathBuf {
        let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_process_file_with_match() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.txt", "Hello 😀 world".as_bytes());

        let result = processor(&[]).process_file(&path);

        assert_eq!(result.outcome(), ProcessOutcome::Completed);
        assert!(result.has_matches());
        let m = &result.detection.matches[0];
        assert_eq!((m.raw.as_str(), m.byte_start, m.byte_end), ("😀", 6, 10));
        assert_eq!((m.line, m.column), (1, 7));
    }

    #[test]
    fn test_process_file_binary() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "blob.bin", &[0, 0, 0, 0]);

        let result = processor(&[]).process_file(&path);

        assert_eq!(result.outcome(), ProcessOutcome::Skipped);
        assert!(!result.detection.success);
        assert_eq!(
            result.detection.skipped_reason.map(|r| r.to_string()),
            Some("binary file".to_owned())
        );
    }

    #[test]
    fn test_process_file_applies_allowlist() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.txt", "done ✅ and 😀".as_bytes());

        let result = processor(&["✅"]).process_file(&path);

        assert_eq!(result.detection.total_count, 1);
        assert_eq!(result.detection.matches[0].raw, "😀");
    }

    #[test]
    fn test_process_file_oversized() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "big.txt", &[b'a'; 128]);
        let config = ProcessingConfig {
            max_file_size: 64,
            ..ProcessingConfig::default()
        };
        let processor = Processor::new(inspector(&config), None, Arc::new(NullDiagnostics));

        let result = processor.process_file(&path);

        assert_eq!(result.outcome(), ProcessOutcome::Failed);
        assert!(matches!(result.error, Some(ScanError::Oversized { .. })));
        assert!(!result.detection.success);
        assert!(result.detection.skipped_reason.is_none());
    }

    #[test]
    fn test_partial_failures() {
        let dir = TempDir::new().unwrap();
        let mut paths: Vec<_> = (0..6)
            .map(|i| write(&dir, &format!("f{i}.txt"), "ok 😀".as_bytes()))
            .collect();
        paths.push(dir_path(&dir).join("missing-1.txt"));
        paths.push(dir_path(&dir).join("missing-2.txt"));

        let processor = processor(&[]);
        let results = processor.process_files_concurrently(&paths, 4, &CancellationToken::new());

        assert_eq!(results.len(), 8);
        let failed = results
            .iter()
            .filter(|r| r.outcome() == ProcessOutcome::Failed)
            .count();
        assert_eq!(failed, 2);
        let stats = processor.stats();
        assert_eq!(stats.total, 8);
        assert_eq!(stats.errors, 2);
        assert_eq!(stats.with_matches, 6);
        assert_eq!(stats.matches, 6);
    }

    #[test]
    fn test_pre_cancelled_batch() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<_> = (0..4)
            .map(|i| write(&dir, &format!("f{i}.txt"), b"plain"))
            .collect();
        let token = CancellationToken::new();
        token.cancel();

        let processor = processor(&[]);
        let results = processor.process_files_concurrently(&paths, 2, &token);

        assert_eq!(results.len(), 4);
        assert!(
            results
                .iter()
                .all(|r| r.outcome() == ProcessOutcome::NotProcessed)
        );
        assert_eq!(processor.stats().not_processed, 4);
    }

    #[test]
    fn test_process_streaming() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<_> = (0..5)
            .map(|i| write(&dir, &format!("f{i}.txt"), "x 😀".as_bytes()))
            .collect();
        let processor = processor(&[]);
        let (tx, mut rx) = mpsc::channel(2);

        let updates = std::thread::scope(|scope| {
            scope.spawn(|| {
                processor.process_streaming(&paths, 2, tx, &CancellationToken::new());
            });
            let mut updates = Vec::new();
            while let Some(update) = rx.blocking_recv() {
                updates.push(update);
            }
            updates
        });

        assert!(matches!(updates.first(), Some(ProcessUpdate::PathsQueued(5))));
        let processed = updates
            .iter()
            .filter(|u| matches!(u, ProcessUpdate::FileProcessed(_)))
            .count();
        assert_eq!(processed, 5);
        match updates.last() {
            Some(ProcessUpdate::Complete(stats)) => assert_eq!(stats.matches, 5),
            other => panic!("unexpected final update: {other:?}"),
        }
    }

    #[test]
    fn test_failures_reach_diagnostics() {
        let diagnostics = Arc::new(MemoryDiagnostics::new());
        let processor = Processor::new(
            inspector(&ProcessingConfig::default()),
            None,
            Arc::clone(&diagnostics) as Arc<dyn Diagnostics>,
        );

        processor.process_files(&[Utf8PathBuf::from("/nonexistent/emoji-lint.txt")]);

        assert!(diagnostics.contains("failed to read file"));
        assert!(diagnostics.contains("processed 1 files"));
    }

    fn dir_path(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }
}
