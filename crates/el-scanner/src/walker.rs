//! File discovery.
//!
//! This module provides [`FileWalker`], which expands input paths into the
//! ordered list of files to process. Directories are walked with the `ignore`
//! crate (respecting `.gitignore`), and every candidate is run through the
//! [`FileFilterEngine`].
//!
//! # Design
//!
//! Discovery is eager: the complete list is collected before any worker
//! starts, so every input path gets exactly one result even when the batch
//! is cancelled.
//!
//! Rules see a path relative to where it was found. Walked files are
//! relative to the directory being walked. An explicit file is relative to
//! the base directory (the working directory by default) when it lies
//! inside it, so `scan src/lib.rs` and `scan .` agree. Otherwise it is
//! judged by its file name alone, as if its own directory had been walked.

use std::fmt;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use el_core::{Diagnostics, fx_hash_set};
use ignore::WalkBuilder;

use crate::error::ScanError;
use crate::filter::FileFilterEngine;

/// Expands files and directories into a filtered, de-duplicated file list.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use camino::Utf8PathBuf;
/// use el_core::{FilterConfig, NullDiagnostics};
/// use el_scanner::{FileFilterEngine, FileWalker};
///
/// let engine = Arc::new(FileFilterEngine::new(&FilterConfig::default())?);
/// let walker = FileWalker::new(engine, Arc::new(NullDiagnostics));
/// let paths = walker.collect_paths(&[Utf8PathBuf::from("./src")])?;
/// println!("Found {} files", paths.len());
/// # Ok::<(), el_scanner::ScanError>(())
/// ```
pub struct FileWalker {
    engine: Arc<FileFilterEngine>,
    diagnostics: Arc<dyn Diagnostics>,
    base_dir: Option<Utf8PathBuf>,
    follow_links: bool,
    standard_filters: bool,
}

impl fmt::Debug for FileWalker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileWalker")
            .field("engine", &self.engine)
            .field("base_dir", &self.base_dir)
            .field("follow_links", &self.follow_links)
            .field("standard_filters", &self.standard_filters)
            .finish_non_exhaustive()
    }
}

impl FileWalker {
    /// Creates a walker applying `engine` to every candidate.
    #[must_use]
    pub fn new(engine: Arc<FileFilterEngine>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            engine,
            diagnostics,
            base_dir: current_dir(),
            follow_links: false,
            standard_filters: true,
        }
    }

    /// Sets the directory explicit file inputs are filtered relative to.
    ///
    /// Defaults to the working directory.
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl AsRef<Utf8Path>) -> Self {
        let dir = dir.as_ref();
        self.base_dir = Some(dir.canonicalize_utf8().unwrap_or_else(|_| dir.to_owned()));
        self
    }

    /// Configures whether to follow symbolic links while walking.
    ///
    /// By default, symbolic links are not followed.
    #[must_use]
    pub const fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Configures whether `.gitignore`, `.ignore`, and hidden-file rules
    /// apply. Enabled by default.
    #[must_use]
    pub const fn with_standard_filters(mut self, enabled: bool) -> Self {
        self.standard_filters = enabled;
        self
    }

    /// Collects the files to process from `inputs`.
    ///
    /// Explicit files are filtered relative to the base directory (or by
    /// name when outside it); directories are walked and their entries are
    /// filtered relative to the directory. Output preserves input order,
    /// with directory contents sorted by name, and never repeats a path.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Config`] if an input does not exist,
    /// [`ScanError::Walk`] if a root directory cannot be read, and
    /// [`ScanError::NonUtf8Path`] if a discovered path is not UTF-8.
    pub fn collect_paths(&self, inputs: &[Utf8PathBuf]) -> Result<Vec<Utf8PathBuf>, ScanError> {
        let mut paths = Vec::new();
        let mut seen = fx_hash_set();

        for input in inputs {
            if input.is_dir() {
                for path in self.walk_dir(input)? {
                    if seen.insert(path.clone()) {
                        paths.push(path);
                    }
                }
            } else if input.exists() {
                let relative = self.explicit_relative(input);
                if self.admit(input, &relative) && seen.insert(input.clone()) {
                    paths.push(input.clone());
                }
            } else {
                return Err(ScanError::config(format!("path does not exist: {input}")));
            }
        }

        self.diagnostics
            .info(&format!("discovered {} files", paths.len()), None);
        Ok(paths)
    }

    fn walk_dir(&self, root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, ScanError> {
        let mut paths = Vec::new();

        for result in self.build_walker(root) {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) if err.depth().is_some_and(|depth| depth > 0) => {
                    self.diagnostics
                        .warn(&format!("skipping unreadable entry: {err}"), Some(root));
                    continue;
                }
                Err(err) => return Err(ScanError::Walk(err)),
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let utf8_path =
                Utf8Path::from_path(path).ok_or_else(|| ScanError::NonUtf8Path(path.to_owned()))?;
            let relative = utf8_path.strip_prefix(root).unwrap_or(utf8_path);

            if self.admit(utf8_path, relative) {
                paths.push(utf8_path.to_owned());
            }
        }

        Ok(paths)
    }

    /// The path an explicit file input is filtered on.
    fn explicit_relative(&self, input: &Utf8Path) -> Utf8PathBuf {
        let Some(name) = input.file_name() else {
            return input.to_owned();
        };
        let parent = match input.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        // Only the directory is resolved so a symlinked file keeps its name.
        if let (Some(base), Ok(dir)) = (&self.base_dir, parent.canonicalize_utf8()) {
            if let Ok(relative) = dir.strip_prefix(base) {
                return relative.join(name);
            }
        }
        Utf8PathBuf::from(name)
    }

    /// Runs the engine on `relative` and logs the decision against `path`.
    fn admit(&self, path: &Utf8Path, relative: &Utf8Path) -> bool {
        let decision = self.engine.should_include(relative);
        if !decision.include {
            self.diagnostics.debug(&decision.to_string(), Some(path));
        }
        decision.include
    }

    fn build_walker(&self, root: &Utf8Path) -> ignore::Walk {
        let engine = Arc::clone(&self.engine);
        let prune_root = root.to_owned();

        WalkBuilder::new(root)
            .standard_filters(self.standard_filters)
            .follow_links(self.follow_links)
            .require_git(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                if entry.depth() == 0 || !entry.file_type().is_some_and(|ft| ft.is_dir()) {
                    return true;
                }
                Utf8Path::from_path(entry.path())
                    .and_then(|dir| dir.strip_prefix(&prune_root).ok())
                    .is_none_or(|dir| !engine.prunes_directory(dir))
            })
            .build()
    }
}

fn current_dir() -> Option<Utf8PathBuf> {
    let dir = Utf8PathBuf::from_path_buf(std::env::current_dir().ok()?).ok()?;
    Some(dir.canonicalize_utf8().unwrap_or(dir))
}
