//! Core types, configuration, errors, and diagnostics for emoji-lint.
//!
//! This crate provides the foundational types shared by the detection engine
//! (`el-detect`), the batch scanner (`el-scanner`), and the CLI:
//!
//! - Domain types ([`Match`], [`DetectionResult`], [`FilterDecision`])
//! - Configuration structures ([`Config`], [`ProcessingConfig`], [`ModifyConfig`])
//! - Error types for configuration loading ([`ConfigError`])
//! - The injectable [`Diagnostics`] sink used instead of global logging state
//! - The `FxHashSet` alias used for allowlist lookups

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod hash;
pub mod types;

pub use config::{
    ClassifierConfig, Config, FilterConfig, ModifyConfig, PatternConfig, ProcessingConfig,
};
pub use diagnostics::{
    Diagnostics, Level, MemoryDiagnostics, NullDiagnostics, Record, TracingDiagnostics,
};
pub use error::ConfigError;
pub use hash::{FxHashSet, fx_hash_set, fx_hash_set_with_capacity};
pub use types::{
    DetectionResult, FilterDecision, FilterReason, FilterStage, Match, MatchCategory, SkipReason,
};
