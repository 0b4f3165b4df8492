//! Batch statistics with atomic counters.
//!
//! This module provides [`ProcessStats`] for tracking batch progress and
//! [`StatsSnapshot`] for point-in-time views.
//!
//! # Thread Safety
//!
//! All counters use [`AtomicU64`] with [`Relaxed`](std::sync::atomic::Ordering::Relaxed)
//! ordering. The counters are informational and workers never read them, so
//! no ordering between them is required.
//!
//! # Examples
//!
//! ```
//! use el_scanner::ProcessStats;
//!
//! let stats = ProcessStats::new();
//! stats.increment_total();
//! stats.add_matches(3);
//!
//! let snapshot = stats.snapshot();
//! assert_eq!(snapshot.total, 1);
//! assert_eq!(snapshot.matches, 3);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Atomic counters for a scan or clean batch.
#[derive(Debug, Default)]
pub struct ProcessStats {
    /// Files handed to the batch.
    total: AtomicU64,
    /// Files read and found clean after allowlist filtering.
    clean: AtomicU64,
    /// Files with at least one non-allowed match.
    with_matches: AtomicU64,
    /// Non-allowed matches across all files.
    matches: AtomicU64,
    /// Files skipped as binary.
    skipped: AtomicU64,
    /// Files that failed with a per-file error.
    errors: AtomicU64,
    /// Files never dispatched because the batch was cancelled.
    not_processed: AtomicU64,
    /// Files rewritten (or that would be, in a dry run).
    modified: AtomicU64,
}

impl ProcessStats {
    /// Creates a new [`ProcessStats`] with all counters at zero.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the total files counter.
    #[inline]
    pub fn increment_total(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the clean files counter.
    #[inline]
    pub fn increment_clean(&self) {
        self.clean.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the files-with-matches counter.
    #[inline]
    pub fn increment_with_matches(&self) {
        self.with_matches.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds `count` to the match counter.
    #[inline]
    pub fn add_matches(&self, count: usize) {
        self.matches.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Increments the skipped files counter.
    #[inline]
    pub fn increment_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the error counter.
    #[inline]
    pub fn increment_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the not-processed counter.
    #[inline]
    pub fn increment_not_processed(&self) {
        self.not_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the modified files counter.
    #[inline]
    pub fn increment_modified(&self) {
        self.modified.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot of all counters.
    ///
    /// Each counter is loaded independently, so a snapshot taken while
    /// workers are running may be slightly inconsistent.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            clean: self.clean.load(Ordering::Relaxed),
            with_matches: self.with_matches.load(Ordering::Relaxed),
            matches: self.matches.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            not_processed: self.not_processed.load(Ordering::Relaxed),
            modified: self.modified.load(Ordering::Relaxed),
        }
    }

    /// Resets all counters to zero.
    pub fn reset(&self) {
        self.total.store(0, Ordering::Relaxed);
        self.clean.store(0, Ordering::Relaxed);
        self.with_matches.store(0, Ordering::Relaxed);
        self.matches.store(0, Ordering::Relaxed);
        self.skipped.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        self.not_processed.store(0, Ordering::Relaxed);
        self.modified.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time snapshot of batch statistics.
///
/// # Examples
///
/// ```
/// use el_scanner::StatsSnapshot;
///
/// let snap = StatsSnapshot {
///     total: 10,
///     clean: 6,
///     with_matches: 2,
///     matches: 5,
///     errors: 2,
///     ..Default::default()
/// };
///
/// assert!(snap.has_findings());
/// assert!((snap.success_rate() - 80.0).abs() < 0.1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Files handed to the batch.
    pub total: u64,
    /// Files found clean.
    pub clean: u64,
    /// Files with at least one non-allowed match.
    pub with_matches: u64,
    /// Non-allowed matches across all files.
    pub matches: u64,
    /// Files skipped as binary.
    pub skipped: u64,
    /// Files that failed.
    pub errors: u64,
    /// Files never dispatched because the batch was cancelled.
    pub not_processed: u64,
    /// Files rewritten.
    pub modified: u64,
}

impl StatsSnapshot {
    /// Returns the share of dispatched files that did not fail, as a
    /// percentage.
    ///
    /// Returns 100.0 if nothing was dispatched.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        let dispatched = self.total.saturating_sub(self.not_processed);
        if dispatched == 0 {
            return 100.0;
        }

        (dispatched.saturating_sub(self.errors) as f64 / dispatched as f64) * 100.0
    }

    /// Returns `true` if any non-allowed match was found.
    #[inline]
    #[must_use]
    pub const fn has_findings(&self) -> bool {
        self.matches > 0
    }

    /// Returns `true` if any file failed or was not processed.
    #[inline]
    #[must_use]
    pub const fn is_incomplete(&self) -> bool {
        self.errors > 0 || self.not_processed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_stats_new() {
        let snap = ProcessStats::new().snapshot();
        assert_eq!(snap, StatsSnapshot::default());
    }

    #[test]
    fn test_process_stats_increment() {
        let stats = ProcessStats::new();

        stats.increment_total();
        stats.increment_total();
        stats.increment_total();
        stats.increment_clean();
        stats.increment_with_matches();
        stats.add_matches(4);
        stats.increment_skipped();
        stats.increment_errors();
        stats.increment_not_processed();
        stats.increment_modified();

        let snap = stats.snapshot();
        assert_eq!(snap.total, 3);
        assert_eq!(snap.clean, 1);
        assert_eq!(snap.with_matches, 1);
        assert_eq!(snap.matches, 4);
        assert_eq!(snap.skipped, 1);
        assert_eq!(snap.errors, 1);
        assert_eq!(snap.not_processed, 1);
        assert_eq!(snap.modified, 1);
    }

    #[test]
    fn test_process_stats_reset() {
        let stats = ProcessStats::new();
        stats.increment_total();
        stats.add_matches(2);

        stats.reset();

        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_stats_snapshot_success_rate() {
        let snap = StatsSnapshot::default();
        assert!((snap.success_rate() - 100.0).abs() < f64::EPSILON);

        let snap = StatsSnapshot {
            total: 100,
            errors: 5,
            ..Default::default()
        };
        assert!((snap.success_rate() - 95.0).abs() < f64::EPSILON);

        // Undispatched files don't count against the rate.
        let snap = StatsSnapshot {
            total: 10,
            not_processed: 10,
            ..Default::default()
        };
        assert!((snap.success_rate() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_snapshot_flags() {
        let snap = StatsSnapshot {
            total: 2,
            matches: 1,
            not_processed: 1,
            ..Default::default()
        };
        assert!(snap.has_findings());
        assert!(snap.is_incomplete());
        assert!(!StatsSnapshot::default().is_incomplete());
    }

    #[test]
    fn test_stats_snapshot_serialization() {
        let snap = StatsSnapshot {
            total: 3,
            clean: 2,
            with_matches: 1,
            matches: 1,
            ..Default::default()
        };
        insta::assert_json_snapshot!(snap, @r#"
        {
          "total": 3,
          "clean": 2,
          "with_matches": 1,
          "matches": 1,
          "skipped": 0,
          "errors": 0,
          "not_processed": 0,
          "modified": 0
        }
        "#);
    }
}
