//! Emoji, emoticon, and custom marker detection.
//!
//! This crate is the pure, in-memory half of emoji-lint. Nothing here touches
//! the filesystem except optional loading of a replacement range table.
//!
//! - [`PatternCatalog`] classifies code points and holds the literal matchers
//! - [`Detector`] finds matches in a byte buffer
//! - [`TextClassifier`] tells binary content from text
//! - [`Allowlist`] filters matches that are permitted to stay
//!
//! # Overview
//!
//! ```
//! use std::sync::Arc;
//! use el_detect::{Allowlist, DetectOptions, Detector, PatternCatalog};
//!
//! let catalog = Arc::new(PatternCatalog::with_defaults()?);
//! let detector = Detector::new(catalog, DetectOptions::default());
//!
//! let result = detector.detect("ship it 🚀 ✅".as_bytes());
//! assert_eq!(result.total_count, 2);
//!
//! let allowlist = Allowlist::new(["✅"]);
//! let filtered = Allowlist::apply(&result, Some(&allowlist));
//! assert_eq!(filtered.total_count, 1);
//! assert_eq!(filtered.matches[0].raw, "🚀");
//! # Ok::<(), el_detect::PatternError>(())
//! ```
//!
//! # Sequences
//!
//! | Input | Matches | Category |
//! |-------|---------|----------|
//! | `😀` | 1 | `Emoji` |
//! | `👍🏽` | 1 | `ModifiedEmoji` |
//! | `👨‍👩‍👧` | 1 | `ZwjSequence` |
//! | `🇺🇸` | 1 | `Flag` |
//! | `:)` (emoticons enabled) | 1 | `Emoticon` |

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod allowlist;
pub mod catalog;
pub mod classifier;
pub mod detector;
pub mod error;
pub mod ranges;
pub mod sequence;

pub use allowlist::Allowlist;
pub use catalog::{
    DEFAULT_EMOTICONS, DEFAULT_KEYCAP_BASES, KEYCAP, LiteralMatcher, PatternCatalog, PatternSet,
    RuneClass, ZWJ,
};
pub use classifier::{BinaryReason, Classification, TextClassifier};
pub use detector::{DetectOptions, Detector};
pub use error::PatternError;
pub use ranges::{CodePointRange, UNICODE_RANGES_VERSION, default_ranges, load_ranges};
pub use sequence::{Emission, Rune, SequenceMachine, SequenceState, Span};
