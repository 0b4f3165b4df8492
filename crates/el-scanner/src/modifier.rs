//! Backup-aware atomic rewriting.
//!
//! [`Modifier`] runs the same read, classify, detect and allowlist sequence
//! as the [`Processor`](crate::Processor), then removes (or replaces) every
//! remaining match and writes the result back atomically:
//!
//! 1. Optional backup `<name>.backup.<YYYYMMDDHHMMSS>` from the bytes that
//!    were read, synced before anything else happens
//! 2. New content written to a temp file in the same directory and synced
//! 3. Original mode bits applied to the temp file (optional)
//! 4. Temp file renamed over the original, parent directory synced
//!
//! Any failure before step 4 leaves the original untouched. Symlinks are
//! resolved so the link target is rewritten and the link itself survives;
//! the backup is still named after, and placed next to, the path given.

use std::fmt;
use std::fs::{self, File, OpenOptions, Permissions};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;
use el_core::{DetectionResult, Diagnostics, Match, ModifyConfig, SkipReason};
use el_detect::Allowlist;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

use crate::error::ScanError;
use crate::inspect::{FileInspector, Inspection};
use crate::pool;
use crate::processor::ProcessOutcome;
use crate::stats::{ProcessStats, StatsSnapshot};

/// Upper bound on rewrite passes per file.
///
/// Removing a match can join its neighbours into a new one (`:😀)` becomes
/// `:)`), so the rewrite repeats until nothing non-allowed is left.
pub const MAX_PASSES: usize = 8;

/// Upper bound on `-N` suffixes tried when a backup name is taken.
const MAX_BACKUP_ATTEMPTS: usize = 1000;

/// The result of modifying one file.
#[derive(Debug)]
pub struct ModifyResult {
    /// The file as it was handed to the modifier.
    pub path: Utf8PathBuf,
    /// Whether the file was rewritten (in a dry run: would have been).
    pub modified: bool,
    /// Matches removed across all passes.
    pub emojis_removed: usize,
    /// Where the original content was saved, if a backup was made.
    ///
    /// Always `<path>.backup.<stamp>` next to `path`, even when `path` is a
    /// symlink and the link target was rewritten.
    pub backup_path: Option<Utf8PathBuf>,
    /// Set when the file was not a rewrite candidate.
    pub skipped_reason: Option<SkipReason>,
    /// The per-file error, if any.
    pub error: Option<ScanError>,
    /// Wall time spent on this file.
    pub duration: Duration,
}

impl ModifyResult {
    fn new(path: &Utf8Path) -> Self {
        Self {
            path: path.to_owned(),
            modified: false,
            emojis_removed: 0,
            backup_path: None,
            skipped_reason: None,
            error: None,
            duration: Duration::ZERO,
        }
    }

    /// Returns how this file fared.
    #[inline]
    #[must_use]
    pub const fn outcome(&self) -> ProcessOutcome {
        ProcessOutcome::from_parts(self.error.as_ref(), self.skipped_reason.is_some())
    }
}

/// Removes non-allowed matches from files.
pub struct Modifier {
    inspector: Arc<FileInspector>,
    allowlist: Option<Arc<Allowlist>>,
    config: ModifyConfig,
    diagnostics: Arc<dyn Diagnostics>,
    stats: ProcessStats,
}

impl fmt::Debug for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modifier")
            .field("inspector", &self.inspector)
            .field("allowlist", &self.allowlist)
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Modifier {
    /// Creates a modifier.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Config`] if the replacement text would itself be
    /// detected, since the rewrite could then never converge.
    pub fn new(
        inspector: Arc<FileInspector>,
        allowlist: Option<Arc<Allowlist>>,
        config: ModifyConfig,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<Self, ScanError> {
        if !config.replacement.is_empty() && inspector.detector().is_detectable(&config.replacement)
        {
            return Err(ScanError::config(format!(
                "replacement {:?} contains detectable content",
                config.replacement
            )));
        }

        Ok(Self {
            inspector,
            allowlist,
            config,
            diagnostics,
            stats: ProcessStats::new(),
        })
    }

    /// The modification settings.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ModifyConfig {
        &self.config
    }

    /// Counters for the most recent batch.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Modifies a single file.
    pub fn modify_file(&self, path: &Utf8Path) -> ModifyResult {
        let started = Instant::now();
        let mut result = ModifyResult::new(path);

        if let Err(e) = self.modify_inner(path, &mut result) {
            self.diagnostics.warn(&e.to_string(), Some(path));
            result.modified = false;
            result.error = Some(e);
        }

        result.duration = started.elapsed();
        self.record(&result);
        result
    }

    /// Modifies files one after another.
    pub fn modify_files(&self, paths: &[Utf8PathBuf]) -> Vec<ModifyResult> {
        self.modify_files_concurrently(paths, 1, &CancellationToken::new())
    }

    /// Modifies files on a fixed-size worker pool.
    ///
    /// Cancellation semantics match
    /// [`Processor::process_files_concurrently`](crate::Processor::process_files_concurrently):
    /// a write already under way completes, undispatched paths are reported
    /// as [`ProcessOutcome::NotProcessed`] and never touched.
    pub fn modify_files_concurrently(
        &self,
        paths: &[Utf8PathBuf],
        workers: usize,
        cancel: &CancellationToken,
    ) -> Vec<ModifyResult> {
        self.stats.reset();

        let results = pool::run(
            paths,
            workers,
            cancel,
            self.diagnostics.as_ref(),
            |path| self.modify_file(path),
            |path| {
                let mut result = ModifyResult::new(path);
                result.error = Some(ScanError::not_processed(path));
                self.record(&result);
                result
            },
        );

        let stats = self.stats.snapshot();
        let verb = if self.config.dry_run {
            "would modify"
        } else {
            "modified"
        };
        self.diagnostics.info(
            &format!(
                "{verb} {} of {} files, {} matches removed, {} errors, {} not processed",
                stats.modified, stats.total, stats.matches, stats.errors, stats.not_processed
            ),
            None,
        );
        results
    }

    fn modify_inner(&self, path: &Utf8Path, result: &mut ModifyResult) -> Result<(), ScanError> {
        let target = resolve_target(path)?;

        let (content, detection) = match self.inspector.inspect(&target)? {
            Inspection::Binary(reason) => {
                self.diagnostics
                    .debug(&format!("skipping binary file ({reason})"), Some(path));
                result.skipped_reason = Some(SkipReason::BinaryFile);
                return Ok(());
            }
            Inspection::Text { content, detection } => (content, detection),
        };

        let Some((rewritten, removed)) = self.strip(&content, &detection) else {
            return Ok(());
        };
        result.emojis_removed = removed;

        if self.config.dry_run {
            self.diagnostics
                .info(&format!("would remove {removed} matches"), Some(path));
            result.modified = true;
            return Ok(());
        }

        let permissions = if self.config.preserve_permissions {
            let metadata = fs::metadata(&target).map_err(|e| ScanError::permissions(path, e))?;
            Some(metadata.permissions())
        } else {
            None
        };

        if self.config.create_backup {
            let stamp = Local::now().format("%Y%m%d%H%M%S").to_string();
            let backup = create_backup(path, &content, &stamp)?;
            self.diagnostics
                .debug(&format!("backup written to {backup}"), Some(path));
            result.backup_path = Some(backup);
        }

        write_atomic(&target, &rewritten, permissions)?;
        result.modified = true;
        self.diagnostics
            .info(&format!("removed {removed} matches"), Some(path));
        Ok(())
    }

    /// Returns the rewritten content and the number of matches removed, or
    /// `None` if nothing needs removing.
    fn strip(&self, content: &[u8], detection: &DetectionResult) -> Option<(Vec<u8>, usize)> {
        let replacement = self.config.replacement.as_bytes();

        let targets = self.targets(detection);
        if targets.is_empty() {
            return None;
        }
        let mut removed = targets.len();
        let mut current = splice(content, &targets, replacement);

        for _ in 1..MAX_PASSES {
            let targets = self.targets(&self.inspector.detector().detect(&current));
            if targets.is_empty() {
                break;
            }
            removed += targets.len();
            current = splice(&current, &targets, replacement);
        }

        Some((current, removed))
    }

    fn targets(&self, detection: &DetectionResult) -> Vec<Match> {
        if self.config.respect_allowlist {
            Allowlist::apply(detection, self.allowlist.as_deref()).matches
        } else {
            detection.matches.clone()
        }
    }

    fn record(&self, result: &ModifyResult) {
        self.stats.increment_total();
        match result.outcome() {
            ProcessOutcome::Completed if result.emojis_removed == 0 => {
                self.stats.increment_clean();
            }
            ProcessOutcome::Completed => {
                self.stats.increment_with_matches();
                self.stats.add_matches(result.emojis_removed);
                if result.modified {
                    self.stats.increment_modified();
                }
            }
            ProcessOutcome::Skipped => self.stats.increment_skipped(),
            ProcessOutcome::Failed => self.stats.increment_errors(),
            ProcessOutcome::NotProcessed => self.stats.increment_not_processed(),
        }
    }
}

/// Follows a symlink to the file it points at.
fn resolve_target(path: &Utf8Path) -> Result<Utf8PathBuf, ScanError> {
    let metadata = path
        .symlink_metadata()
        .map_err(|e| ScanError::access(path, e))?;
    if metadata.file_type().is_symlink() {
        path.canonicalize_utf8()
            .map_err(|e| ScanError::access(path, e))
    } else {
        Ok(path.to_owned())
    }
}

/// Replaces each match span with `replacement`, copying everything else.
///
/// `matches` must be sorted by `byte_start` and must not overlap.
fn splice(content: &[u8], matches: &[Match], replacement: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len());
    let mut last = 0;
    for m in matches {
        out.extend_from_slice(&content[last..m.byte_start]);
        out.extend_from_slice(replacement);
        last = m.byte_end;
    }
    out.extend_from_slice(&content[last..]);
    out
}

/// Writes `content` to a fresh `<name>.backup.<stamp>` next to `path`.
///
/// An existing backup is never overwritten; a `-N` suffix is appended until a
/// free name is found.
fn create_backup(path: &Utf8Path, content: &[u8], stamp: &str) -> Result<Utf8PathBuf, ScanError> {
    let name = path.file_name().unwrap_or("file");
    let base = path.with_file_name(format!("{name}.backup.{stamp}"));

    for attempt in 0..MAX_BACKUP_ATTEMPTS {
        let candidate = if attempt == 0 {
            base.clone()
        } else {
            Utf8PathBuf::from(format!("{base}-{attempt}"))
        };

        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut file) => {
                if let Err(e) = file.write_all(content).and_then(|()| file.sync_all()) {
                    let _ = fs::remove_file(&candidate);
                    return Err(ScanError::backup(path, e));
                }
                return Ok(candidate);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(ScanError::backup(path, e)),
        }
    }

    Err(ScanError::backup(
        path,
        io::Error::new(io::ErrorKind::AlreadyExists, "no free backup name"),
    ))
}

/// Replaces `target` with `content` via a synced temp file and a rename.
fn write_atomic(
    target: &Utf8Path,
    content: &[u8],
    permissions: Option<Permissions>,
) -> Result<(), ScanError> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };

    // Dropping the temp file on any early return removes it.
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| ScanError::write(target, e))?;
    temp.write_all(content)
        .map_err(|e| ScanError::write(target, e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| ScanError::write(target, e))?;

    if let Some(permissions) = permissions {
        temp.as_file()
            .set_permissions(permissions)
            .map_err(|e| ScanError::permissions(target, e))?;
    }

    temp.persist(target)
        .map_err(|e| ScanError::write(target, e.error))?;
    sync_dir(dir);
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Utf8Path) {
    if let Ok(handle) = File::open(dir) {
        let _ = handle.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Utf8Path) {}

#[cfg(test)]
mod tests {
    use el_core::{ClassifierConfig, NullDiagnostics, ProcessingConfig};
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

    fn modifier(config: ModifyConfig, allow: &[&str]) -> Modifier {
        let allowlist = Allowlist::new(allow.iter().copied());
        Modifier::new(
            inspector(&ProcessingConfig::default()),
            (!allowlist.is_empty()).then(|| Arc::new(allowlist)),
            config,
            Arc::new(NullDiagnostics),
        )
        .unwrap()
    }

    fn write(dir: &TempDir, name: &str, content: &[u8]) -> Utf8PathBuf {
        let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn entries(dir: &TempDir) -> usize {
        fs::read_dir(dir.path()).unwrap().count()
    }

    #[test]
    fn test_modify_with_backup() {
        let dir = TempDir::new().unwrap();
        let original = "Hello 😀 world".as_bytes();
        let path = write(&dir, "file.txt", original);

        let result = modifier(ModifyConfig::default(), &[]).modify_file(&path);

        assert!(result.error.is_none());
        assert!(result.modified);
        assert_eq!(result.emojis_removed, 1);
        assert_eq!(fs::read(&path).unwrap(), b"Hello  world");

        let backup = result.backup_path.unwrap();
        assert!(backup.file_name().unwrap().starts_with("file.txt.backup."));
        let stamp = backup.file_name().unwrap().trim_start_matches("file.txt.backup.");
        assert_eq!(stamp.len(), 14);
        assert!(stamp.bytes().all(|b| b.is_ascii_digit()));
        assert_eq!(fs::read(&backup).unwrap(), original);
    }

    #[test]
    fn test_modify_binary_is_untouched() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "blob.bin", &[0, 0, 0, 0]);

        let result = modifier(ModifyConfig::default(), &[]).modify_file(&path);

        assert_eq!(result.outcome(), ProcessOutcome::Skipped);
        assert!(!result.modified);
        assert!(result.backup_path.is_none());
        assert_eq!(fs::read(&path).unwrap(), [0, 0, 0, 0]);
        assert_eq!(entries(&dir), 1);
    }

    #[test]
    fn test_modify_clean_file_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "clean.txt", b"nothing to see\r\n");

        let result = modifier(ModifyConfig::default(), &[]).modify_file(&path);

        assert!(!result.modified);
        assert_eq!(result.emojis_removed, 0);
        assert_eq!(fs::read(&path).unwrap(), b"nothing to see\r\n");
        assert_eq!(entries(&dir), 1);
    }

    #[test]
    fn test_modify_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.md", "# Title 🎉\n\n👍🏽 ok 👨‍👩‍👧\n".as_bytes());
        let modifier = modifier(ModifyConfig::default().with_backup(false), &[]);

        let first = modifier.modify_file(&path);
        let after_first = fs::read(&path).unwrap();
        let second = modifier.modify_file(&path);

        assert!(first.modified);
        assert_eq!(first.emojis_removed, 3);
        assert!(!second.modified);
        assert_eq!(second.emojis_removed, 0);
        assert_eq!(fs::read(&path).unwrap(), after_first);
        assert_eq!(after_first, b"# Title \n\n ok \n");
    }

    #[test]
    fn test_modify_respects_allowlist() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.txt", "✅ done 😀".as_bytes());

        let result = modifier(ModifyConfig::default().with_backup(false), &["✅"]).modify_file(&path);

        assert_eq!(result.emojis_removed, 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "✅ done ");
    }

    #[test]
    fn test_modify_ignoring_allowlist() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.txt", "✅ done 😀".as_bytes());
        let config = ModifyConfig::default()
            .with_backup(false)
            .with_respect_allowlist(false);

        let result = modifier(config, &["✅"]).modify_file(&path);

        assert_eq!(result.emojis_removed, 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), " done ");
    }

    #[test]
    fn test_modify_with_replacement() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.txt", "go 🚀 now".as_bytes());
        let config = ModifyConfig::default()
            .with_backup(false)
            .with_replacement("[emoji]");

        modifier(config, &[]).modify_file(&path);

        assert_eq!(fs::read_to_string(&path).unwrap(), "go [emoji] now");
    }

    #[test]
    fn test_detectable_replacement_rejected() {
        let err = Modifier::new(
            inspector(&ProcessingConfig::default()),
            None,
            ModifyConfig::default().with_replacement("⭐"),
            Arc::new(NullDiagnostics),
        )
        .unwrap_err();

        assert!(matches!(err, ScanError::Config(_)));
    }

    #[test]
    fn test_removal_exposing_emoticon_runs_again() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.txt", "so :😀) yes".as_bytes());
        let config = ProcessingConfig {
            enable_emoticons: true,
            ..ProcessingConfig::default()
        };
        let modifier = Modifier::new(
            inspector(&config),
            None,
            ModifyConfig::default().with_backup(false),
            Arc::new(NullDiagnostics),
        )
        .unwrap();

        let result = modifier.modify_file(&path);

        assert_eq!(result.emojis_removed, 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "so  yes");
        assert!(!modifier.modify_file(&path).modified);
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let original = "a 😀 b 🎉".as_bytes();
        let path = write(&dir, "a.txt", original);

        let result = modifier(ModifyConfig::default().with_dry_run(true), &[]).modify_file(&path);

        assert!(result.modified);
        assert_eq!(result.emojis_removed, 2);
        assert!(result.backup_path.is_none());
        assert_eq!(fs::read(&path).unwrap(), original);
        assert_eq!(entries(&dir), 1);
    }

    #[test]
    fn test_pre_cancelled_never_writes() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<_> = (0..3)
            .map(|i| write(&dir, &format!("f{i}.txt"), "x 😀".as_bytes()))
            .collect();
        let token = CancellationToken::new();
        token.cancel();

        let modifier = modifier(ModifyConfig::default(), &[]);
        let results = modifier.modify_files_concurrently(&paths, 2, &token);

        assert!(
            results
                .iter()
                .all(|r| r.outcome() == ProcessOutcome::NotProcessed && !r.modified)
        );
        assert_eq!(entries(&dir), 3);
        for path in &paths {
            assert_eq!(fs::read(path).unwrap(), "x 😀".as_bytes());
        }
        assert_eq!(modifier.stats().not_processed, 3);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let result = modifier(ModifyConfig::default(), &[])
            .modify_file(Utf8Path::new("/nonexistent/emoji-lint.txt"));

        assert_eq!(result.outcome(), ProcessOutcome::Failed);
        assert!(matches!(result.error, Some(ScanError::Access { .. })));
    }

    #[test]
    fn test_backup_name_collision() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "notes.txt", b"v1");

        let first = create_backup(&path, b"v1", "20240101120000").unwrap();
        let second = create_backup(&path, b"v2", "20240101120000").unwrap();

        assert_eq!(first.file_name(), Some("notes.txt.backup.20240101120000"));
        assert_eq!(second.file_name(), Some("notes.txt.backup.20240101120000-1"));
        assert_eq!(fs::read(&first).unwrap(), b"v1");
        assert_eq!(fs::read(&second).unwrap(), b"v2");
    }

    #[test]
    fn test_splice() {
        let content = "a😀b🎉c";
        let matches = vec![
            Match::new(content, 1, 5, el_core::MatchCategory::Emoji, 1, 2, 1),
            Match::new(content, 6, 10, el_core::MatchCategory::Emoji, 1, 4, 1),
        ];
        assert_eq!(splice(content.as_bytes(), &matches, b"_"), b"a_b_c");
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = write(&dir, "script.sh", "echo 😀\n".as_bytes());
        fs::set_permissions(&path, Permissions::from_mode(0o751)).unwrap();

        let result = modifier(ModifyConfig::default().with_backup(false), &[]).modify_file(&path);

        assert!(result.modified);
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o751);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_target_rewritten() {
        let dir = TempDir::new().unwrap();
        let real = write(&dir, "real.txt", "hi 😀".as_bytes());
        let link = Utf8PathBuf::from_path_buf(dir.path().join("link.txt")).unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let result = modifier(ModifyConfig::default().with_backup(false), &[]).modify_file(&link);

        assert!(result.modified);
        assert_eq!(fs::read_to_string(&real).unwrap(), "hi ");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_backup_named_after_link() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("store")).unwrap();
        let real = write(&dir, "store/real.txt", "hi 😀".as_bytes());
        let link = Utf8PathBuf::from_path_buf(dir.path().join("link.txt")).unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let result = modifier(ModifyConfig::default(), &[]).modify_file(&link);

        let backup = result.backup_path.unwrap();
        assert_eq!(backup.parent(), link.parent());
        assert!(backup.file_name().unwrap().starts_with("link.txt.backup."));
        assert_eq!(fs::read_to_string(&backup).unwrap(), "hi 😀");
        assert_eq!(fs::read_to_string(&real).unwrap(), "hi ");
    }

    #[cfg(unix)]
    #[test]
    fn test_backup_failure_aborts_modification() {
        let dir = TempDir::new().unwrap();
        // Fits the file system's name limit, but the backup suffix does not.
        let name = format!("{}.txt", "n".repeat(240));
        let original = "Hello 😀 world".as_bytes();
        let path = write(&dir, &name, original);

        let result = modifier(ModifyConfig::default(), &[]).modify_file(&path);

        assert!(matches!(result.error, Some(ScanError::Backup { .. })));
        assert_eq!(result.outcome(), ProcessOutcome::Failed);
        assert!(!result.modified);
        assert!(result.backup_path.is_none());
        assert_eq!(fs::read(&path).unwrap(), original);
        assert_eq!(entries(&dir), 1);
    }

    #[test]
    fn test_backup_gives_up_when_every_name_is_taken() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "busy.txt", b"v1");
        let base = format!("{path}.backup.20240101120000");
        fs::write(&base, b"").unwrap();
        for n in 1..MAX_BACKUP_ATTEMPTS {
            fs::write(format!("{base}-{n}"), b"").unwrap();
        }

        let err = create_backup(&path, b"v1", "20240101120000").unwrap_err();

        assert!(matches!(err, ScanError::Backup { .. }));
        assert_eq!(entries(&dir), 1 + MAX_BACKUP_ATTEMPTS);
        assert_eq!(fs::read(&base).unwrap(), b"");
    }

    #[test]
    fn test_write_failure_leaves_target_untouched() {
        let dir = TempDir::new().unwrap();
        let target = Utf8PathBuf::from_path_buf(dir.path().join("occupied")).unwrap();
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep.txt"), b"keep").unwrap();

        let err = write_atomic(&target, b"new", None).unwrap_err();

        assert!(matches!(err, ScanError::Write { .. }));
        assert_eq!(fs::read(target.join("keep.txt")).unwrap(), b"keep");
        // The temp file is removed with the failed rename.
        assert_eq!(entries(&dir), 1);
    }
}
