//! Domain types for emoji-lint.
//!
//! # Module Organization
//!
//! - [`matched`] - A single detected occurrence and its category
//! - [`detection`] - Per-file detection results and skip reasons
//! - [`decision`] - Justified include/exclude decisions for file paths
//!
//! All public types are re-exported at this module level and at the crate root:
//!
//! ```
//! use el_core::{DetectionResult, FilterDecision, Match, MatchCategory};
//! ```

pub mod decision;
pub mod detection;
pub mod matched;

pub use decision::{FilterDecision, FilterReason, FilterStage};
pub use detection::{DetectionResult, SkipReason};
pub use matched::{Match, MatchCategory};
