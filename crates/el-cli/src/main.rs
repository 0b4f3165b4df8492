//! CLI entry point for emoji-lint.
//!
//! This binary scans text files for emoji, emoticons, and custom markers,
//! and optionally removes them.
//!
//! # Usage
//!
//! ```bash
//! emoji-lint [OPTIONS] <COMMAND>
//!
//! # Report matches under the current directory
//! emoji-lint scan
//!
//! # Only markdown, allowing checkmarks, as JSON
//! emoji-lint scan docs --include '**/*.md' --allow ✅ --format json
//!
//! # Preview a cleanup, then run it without backups
//! emoji-lint clean src --dry-run
//! emoji-lint clean src --no-backup
//! ```
//!
//! Exit status is `0` when nothing was found (scan) or every file was
//! handled (clean), `1` otherwise.

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::eyre;
use el_core::{Config, Match, ModifyConfig, SkipReason};
use el_scanner::{
    CleanReport, EmojiScanner, ModifyResult, ProcessOutcome, ProcessResult, ProcessUpdate,
    ScanReport, StatsSnapshot,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Find and remove emoji in text files.
#[derive(Parser)]
#[command(name = "emoji-lint", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file. Command-line options are applied on top.
    #[arg(short, long, global = true, env = "EMOJI_LINT_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Report matches without modifying files.
    Scan {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Remove matches from files.
    Clean {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        clean: CleanArgs,
    },
}

/// Options shared by every subcommand.
#[derive(Args)]
struct CommonArgs {
    /// Files or directories to process.
    #[arg(default_value = ".")]
    paths: Vec<Utf8PathBuf>,

    /// Only process files matching this glob (repeatable).
    #[arg(short, long = "include", value_name = "GLOB")]
    include: Vec<String>,

    /// Skip files matching this glob (repeatable).
    #[arg(short = 'x', long = "exclude", value_name = "GLOB")]
    exclude: Vec<String>,

    /// Leave this emoji in place (repeatable).
    #[arg(short, long = "allow", value_name = "EMOJI")]
    allow: Vec<String>,

    /// Also detect text emoticons such as `:)`.
    #[arg(long)]
    emoticons: bool,

    /// Also detect this literal marker (repeatable).
    #[arg(long = "custom", value_name = "TEXT")]
    custom: Vec<String>,

    /// Skip files larger than this many bytes (0 disables the limit).
    #[arg(long, value_name = "BYTES")]
    max_file_size: Option<u64>,

    /// Worker threads (0 uses one per core).
    #[arg(short, long, env = "EMOJI_LINT_JOBS")]
    jobs: Option<usize>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Options for `clean`.
#[derive(Args)]
struct CleanArgs {
    /// Text written in place of each match (default: remove).
    #[arg(short, long, value_name = "TEXT")]
    replacement: Option<String>,

    /// Do not write `<file>.backup.<timestamp>` copies.
    #[arg(long)]
    no_backup: bool,

    /// Report what would change without writing anything.
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Remove allowlisted matches too.
    #[arg(long)]
    ignore_allowlist: bool,

    /// Let rewritten files take the default mode instead of the original.
    #[arg(long)]
    no_preserve_permissions: bool,
}

/// Output format.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum OutputFormat {
    /// One line per match followed by a summary.
    Text,
    /// A single JSON document.
    Json,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `warn` level by default. Logs go
/// to stderr so that stdout carries only the report.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "warn" };
        EnvFilter::new(format!("{level},ignore=warn,globset=warn"))
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(io::stderr),
        )
        .with(filter)
        .init();
}

/// Builds a [`Config`] from the optional config file and CLI arguments.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or is invalid.
fn build_config(path: Option<&Utf8Path>, common: &CommonArgs) -> color_eyre::Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_json_file(path)
            .map_err(|e| eyre!("Failed to load config {path}: {e}"))?,
        None => Config::default(),
    };

    config.filter.cli_include.extend(common.include.iter().cloned());
    config.filter.cli_exclude.extend(common.exclude.iter().cloned());
    config.allowlist.extend(common.allow.iter().cloned());

    if common.emoticons {
        config.processing.enable_emoticons = true;
    }
    if !common.custom.is_empty() {
        config.patterns.custom.extend(common.custom.iter().cloned());
        config.processing.enable_custom = true;
    }
    if let Some(limit) = common.max_file_size {
        config.processing.max_file_size = limit;
    }
    if let Some(jobs) = common.jobs {
        config.workers = Some(jobs);
    }

    Ok(config)
}

/// Applies `clean` options on top of the configured modify settings.
fn apply_clean_args(modify: &mut ModifyConfig, clean: &CleanArgs) {
    if let Some(replacement) = &clean.replacement {
        modify.replacement.clone_from(replacement);
    }
    if clean.no_backup {
        modify.create_backup = false;
    }
    if clean.dry_run {
        modify.dry_run = true;
    }
    if clean.ignore_allowlist {
        modify.respect_allowlist = false;
    }
    if clean.no_preserve_permissions {
        modify.preserve_permissions = false;
    }
}

/// Creates a shared [`EmojiScanner`] from the configuration.
fn create_scanner(config: Config) -> color_eyre::Result<Arc<EmojiScanner>> {
    EmojiScanner::new(config)
        .map(Arc::new)
        .map_err(|e| eyre!("Failed to create scanner: {e}"))
}

/// Returns a token that is cancelled on Ctrl-C.
///
/// Files already being written finish; the rest are reported as not
/// processed.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let handle = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl-C, finishing in-flight files");
            handle.cancel();
        }
    });
    token
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Runs a read-only scan.
///
/// Text output streams results as files finish; JSON output waits for the
/// whole batch.
async fn run_scan(
    scanner: Arc<EmojiScanner>,
    common: &CommonArgs,
    cancel: &CancellationToken,
) -> color_eyre::Result<ExitCode> {
    info!(inputs = common.paths.len(), "Starting scan");

    let paths = common.paths.clone();
    let token = cancel.clone();

    let stats = match common.format {
        OutputFormat::Text => {
            let (tx, mut rx) = mpsc::channel(256);
            let handle =
                tokio::task::spawn_blocking(move || scanner.scan_streaming(&paths, tx, &token));

            let mut stats = StatsSnapshot::default();
            while let Some(update) = rx.recv().await {
                match update {
                    ProcessUpdate::PathsQueued(count) => debug!(count, "Scanning files"),
                    ProcessUpdate::FileProcessed(result) => print_process_result(&result)?,
                    ProcessUpdate::Complete(snapshot) => stats = snapshot,
                }
            }
            handle.await??;

            print_scan_summary(&stats)?;
            stats
        }
        OutputFormat::Json => {
            let report = tokio::task::spawn_blocking(move || scanner.scan(&paths, &token)).await??;
            write_json(&JsonScan::from(&report))?;
            report.stats
        }
    };

    Ok(if stats.has_findings() || stats.is_incomplete() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Runs a cleanup.
async fn run_clean(
    scanner: Arc<EmojiScanner>,
    common: &CommonArgs,
    cancel: &CancellationToken,
) -> color_eyre::Result<ExitCode> {
    let dry_run = scanner.config().modify.dry_run;
    info!(inputs = common.paths.len(), dry_run, "Starting clean");

    let paths = common.paths.clone();
    let token = cancel.clone();
    let report = tokio::task::spawn_blocking(move || scanner.clean(&paths, &token)).await??;

    match common.format {
        OutputFormat::Text => {
            for result in &report.results {
                print_modify_result(result, dry_run)?;
            }
            print_clean_summary(&report.stats, dry_run)?;
        }
        OutputFormat::Json => write_json(&JsonClean::from(&report))?,
    }

    Ok(if report.stats.is_incomplete() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Prints one line per match, or the error to stderr.
fn print_process_result(result: &ProcessResult) -> io::Result<()> {
    if let Some(error) = &result.error {
        if !error.is_not_processed() {
            writeln!(io::stderr().lock(), "error: {error}")?;
        }
        return Ok(());
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for m in &result.detection.matches {
        writeln!(
            handle,
            "{}:{}:{}: {} {}",
            result.path, m.line, m.column, m.category, m.raw
        )?;
    }
    Ok(())
}

/// Prints what happened to one file during a cleanup.
fn print_modify_result(result: &ModifyResult, dry_run: bool) -> io::Result<()> {
    if let Some(error) = &result.error {
        if !error.is_not_processed() {
            writeln!(io::stderr().lock(), "error: {error}")?;
        }
        return Ok(());
    }
    if !result.modified {
        return Ok(());
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let verb = if dry_run { "would clean" } else { "cleaned" };
    match &result.backup_path {
        Some(backup) => writeln!(
            handle,
            "{verb} {} ({} removed, backup {backup})",
            result.path, result.emojis_removed
        ),
        None => writeln!(
            handle,
            "{verb} {} ({} removed)",
            result.path, result.emojis_removed
        ),
    }
}

/// Prints the scan totals.
fn print_scan_summary(stats: &StatsSnapshot) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    writeln!(handle)?;
    writeln!(
        handle,
        "{} matches in {} of {} files",
        stats.matches, stats.with_matches, stats.total
    )?;
    write_incomplete(&mut handle, stats)
}

/// Prints the cleanup totals.
fn print_clean_summary(stats: &StatsSnapshot, dry_run: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let verb = if dry_run { "would be cleaned" } else { "cleaned" };

    writeln!(handle)?;
    writeln!(
        handle,
        "{} of {} files {verb}, {} matches removed",
        stats.modified, stats.total, stats.matches
    )?;
    write_incomplete(&mut handle, stats)
}

fn write_incomplete(handle: &mut impl Write, stats: &StatsSnapshot) -> io::Result<()> {
    if stats.skipped > 0 {
        writeln!(handle, "  Skipped (binary): {}", stats.skipped)?;
    }
    if stats.errors > 0 {
        writeln!(handle, "  Errors:           {}", stats.errors)?;
    }
    if stats.not_processed > 0 {
        writeln!(handle, "  Not processed:    {} (cancelled)", stats.not_processed)?;
    }
    Ok(())
}

/// Writes a pretty-printed JSON document to stdout.
fn write_json<T: Serialize>(value: &T) -> color_eyre::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value)
        .map_err(|e| eyre!("Failed to serialize JSON: {e}"))?;
    writeln!(handle)?;
    Ok(())
}

/// JSON view of a scan.
#[derive(Serialize)]
struct JsonScan<'a> {
    stats: StatsSnapshot,
    files: Vec<JsonProcessed<'a>>,
}

#[derive(Serialize)]
struct JsonProcessed<'a> {
    path: &'a Utf8Path,
    outcome: ProcessOutcome,
    matches: &'a [Match],
    skipped_reason: Option<SkipReason>,
    error: Option<String>,
}

impl<'a> From<&'a ScanReport> for JsonScan<'a> {
    fn from(report: &'a ScanReport) -> Self {
        Self {
            stats: report.stats,
            files: report
                .results
                .iter()
                .map(|r| JsonProcessed {
                    path: &r.path,
                    outcome: r.outcome(),
                    matches: &r.detection.matches,
                    skipped_reason: r.detection.skipped_reason,
                    error: r.error.as_ref().map(ToString::to_string),
                })
                .collect(),
        }
    }
}

/// JSON view of a cleanup.
#[derive(Serialize)]
struct JsonClean<'a> {
    stats: StatsSnapshot,
    files: Vec<JsonModified<'a>>,
}

#[derive(Serialize)]
struct JsonModified<'a> {
    path: &'a Utf8Path,
    outcome: ProcessOutcome,
    modified: bool,
    emojis_removed: usize,
    backup_path: Option<&'a Utf8Path>,
    skipped_reason: Option<SkipReason>,
    error: Option<String>,
}

impl<'a> From<&'a CleanReport> for JsonClean<'a> {
    fn from(report: &'a CleanReport) -> Self {
        Self {
            stats: report.stats,
            files: report
                .results
                .iter()
                .map(|r| JsonModified {
                    path: &r.path,
                    outcome: r.outcome(),
                    modified: r.modified,
                    emojis_removed: r.emojis_removed,
                    backup_path: r.backup_path.as_deref(),
                    skipped_reason: r.skipped_reason,
                    error: r.error.as_ref().map(ToString::to_string),
                })
                .collect(),
        }
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Cancel the batch on Ctrl-C
    let cancel = cancel_on_ctrl_c();

    // 5. Route to appropriate command
    match &cli.command {
        Commands::Scan { common } => {
            let config = build_config(cli.config.as_deref(), common)?;
            run_scan(create_scanner(config)?, common, &cancel).await
        }
        Commands::Clean { common, clean } => {
            let mut config = build_config(cli.config.as_deref(), common)?;
            apply_clean_args(&mut config.modify, clean);
            run_clean(create_scanner(config)?, common, &cancel).await
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("emoji-lint").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_scan_defaults() {
        let cli = parse(&["scan"]);
        let Commands::Scan { common } = &cli.command else {
            panic!("expected scan");
        };
        assert_eq!(common.paths, vec![Utf8PathBuf::from(".")]);
        assert_eq!(common.format, OutputFormat::Text);

        let config = build_config(None, common).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_scan_overrides() {
        let cli = parse(&[
            "scan", "docs", "-i", "*.md", "-x", "CHANGELOG.md", "--allow", "✅", "--emoticons",
            "--custom", "TODO!", "--max-file-size", "0", "-j", "3",
        ]);
        let Commands::Scan { common } = &cli.command else {
            panic!("expected scan");
        };

        let config = build_config(None, common).unwrap();

        assert_eq!(config.filter.cli_include, vec!["*.md".to_owned()]);
        assert_eq!(config.filter.cli_exclude, vec!["CHANGELOG.md".to_owned()]);
        assert_eq!(config.allowlist, vec!["✅".to_owned()]);
        assert!(config.processing.enable_emoticons);
        assert_eq!(config.patterns.custom, vec!["TODO!".to_owned()]);
        assert_eq!(config.processing.size_limit(), None);
        assert_eq!(config.workers, Some(3));
    }

    #[test]
    fn test_clean_args() {
        let cli = parse(&[
            "clean",
            "--no-backup",
            "--dry-run",
            "--replacement",
            "[x]",
            "--ignore-allowlist",
        ]);
        let Commands::Clean { clean, .. } = &cli.command else {
            panic!("expected clean");
        };

        let mut modify = ModifyConfig::default();
        apply_clean_args(&mut modify, clean);

        assert!(!modify.create_backup);
        assert!(modify.dry_run);
        assert!(!modify.respect_allowlist);
        assert!(modify.preserve_permissions);
        assert_eq!(modify.replacement, "[x]");
    }

    #[test]
    fn test_missing_config_file() {
        let cli = parse(&["--config", "/nonexistent/emoji-lint.json", "scan"]);
        let Commands::Scan { common } = &cli.command else {
            panic!("expected scan");
        };
        assert!(build_config(cli.config.as_deref(), common).is_err());
    }
}
