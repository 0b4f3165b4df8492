//! Multi-rune emoji sequence state machine.
//!
//! The machine is fed one classified rune at a time and emits a span each
//! time a sequence closes. Matching is greedy, leftmost, and
//! non-overlapping.
//!
//! ```text
//! Idle          --base | skin tone-->        InEmoji
//! Idle          --regional indicator-->      AfterRegional
//! InEmoji       --skin tone | VS | tag-->    InEmoji
//! InEmoji       --ZWJ-->                     AfterZwj
//! AfterZwj      --base-->                    InEmoji
//! AfterRegional --regional indicator-->      emit flag, Idle
//! Idle          --keycap base-->             AfterKeycapBase
//! AfterKeycapBase --VS-->                    AfterKeycapBase
//! AfterKeycapBase --keycap-->                emit emoji, Idle
//! any other rune closes the open sequence, emits it, and is re-read from Idle
//! ```
//!
//! A joiner that is not followed by a base emoji is left out of the span. A
//! keycap base that is never completed (`12`, `#`) emits nothing.

use std::mem;

use el_core::MatchCategory;

use crate::catalog::RuneClass;

/// A classified rune with its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rune {
    /// Sequence role of the rune.
    pub class: RuneClass,
    /// Byte offset of the first byte.
    pub start: usize,
    /// Byte offset one past the last byte.
    pub end: usize,
    /// 1-based line.
    pub line: u32,
    /// 1-based column in runes.
    pub column: u32,
}

/// The extent of an open or closed sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Byte offset of the first byte.
    pub start: usize,
    /// Byte offset one past the last byte.
    pub end: usize,
    /// Line of the first rune.
    pub line: u32,
    /// Column of the first rune.
    pub column: u32,
    /// Number of runes covered.
    pub runes: u32,
    /// A skin tone modifier is present.
    pub modified: bool,
    /// Two glyphs are joined by a ZWJ.
    pub joined: bool,
    /// Tag characters are present.
    pub tagged: bool,
}

impl Span {
    fn open(rune: Rune) -> Self {
        Self {
            start: rune.start,
            end: rune.end,
            line: rune.line,
            column: rune.column,
            runes: 1,
            modified: rune.class == RuneClass::SkinTone,
            joined: false,
            tagged: false,
        }
    }

    fn extend(&mut self, rune: Rune) {
        self.end = rune.end;
        self.runes += 1;
        match rune.class {
            RuneClass::SkinTone => self.modified = true,
            RuneClass::Tag => self.tagged = true,
            _ => {}
        }
    }

    fn category(&self) -> MatchCategory {
        if self.joined {
            MatchCategory::ZwjSequence
        } else if self.tagged {
            MatchCategory::Flag
        } else if self.modified {
            MatchCategory::ModifiedEmoji
        } else {
            MatchCategory::Emoji
        }
    }
}

/// A closed sequence ready to become a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emission {
    /// Extent of the sequence.
    pub span: Span,
    /// Category assigned on close.
    pub category: MatchCategory,
}

/// Current state of the sequence machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequenceState {
    /// No sequence is open.
    #[default]
    Idle,
    /// A glyph sequence is open.
    InEmoji(Span),
    /// A glyph sequence ended in a joiner; `joiner` is held back until a base
    /// emoji confirms it.
    AfterZwj {
        /// The sequence before the joiner.
        span: Span,
        /// The pending joiner.
        joiner: Rune,
    },
    /// One regional indicator has been seen.
    AfterRegional(Span),
    /// A digit, `#` or `*` that a keycap mark may still complete.
    AfterKeycapBase(Span),
}

/// Drives [`SequenceState`] over a rune stream.
///
/// # Examples
///
/// ```
/// use el_detect::{Rune, RuneClass, SequenceMachine};
///
/// let mut machine = SequenceMachine::new(true);
/// let base = Rune { class: RuneClass::Base, start: 0, end: 4, line: 1, column: 1 };
/// let space = Rune { class: RuneClass::Other, start: 4, end: 5, line: 1, column: 2 };
///
/// assert!(machine.feed(base).is_none());
/// let emitted = machine.feed(space).unwrap();
/// assert_eq!((emitted.span.start, emitted.span.end), (0, 4));
/// ```
#[derive(Debug, Clone)]
pub struct SequenceMachine {
    state: SequenceState,
    lone_regional_indicator: bool,
}

impl SequenceMachine {
    /// Creates a machine in [`SequenceState::Idle`].
    #[must_use]
    pub const fn new(lone_regional_indicator: bool) -> Self {
        Self {
            state: SequenceState::Idle,
            lone_regional_indicator,
        }
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> &SequenceState {
        &self.state
    }

    /// Advances by one rune, returning the sequence it closed, if any.
    pub fn feed(&mut self, rune: Rune) -> Option<Emission> {
        match (mem::take(&mut self.state), rune.class) {
            (SequenceState::Idle, _) => {
                self.start(rune);
                None
            }
            (
                SequenceState::InEmoji(mut span),
                RuneClass::SkinTone | RuneClass::VariationSelector | RuneClass::Tag,
            ) => {
                span.extend(rune);
                self.state = SequenceState::InEmoji(span);
                None
            }
            (SequenceState::InEmoji(span), RuneClass::Zwj) => {
                self.state = SequenceState::AfterZwj { span, joiner: rune };
                None
            }
            (SequenceState::InEmoji(span), _) => {
                self.start(rune);
                Some(close(span))
            }
            (SequenceState::AfterZwj { mut span, joiner }, RuneClass::Base) => {
                span.extend(joiner);
                span.extend(rune);
                span.joined = true;
                self.state = SequenceState::InEmoji(span);
                None
            }
            (SequenceState::AfterZwj { span, .. }, _) => {
                self.start(rune);
                Some(close(span))
            }
            (SequenceState::AfterRegional(mut span), RuneClass::RegionalIndicator) => {
                span.extend(rune);
                Some(Emission {
                    span,
                    category: MatchCategory::Flag,
                })
            }
            (SequenceState::AfterRegional(span), _) => {
                self.start(rune);
                self.lone(span)
            }
            (SequenceState::AfterKeycapBase(mut span), RuneClass::VariationSelector) => {
                span.extend(rune);
                self.state = SequenceState::AfterKeycapBase(span);
                None
            }
            (SequenceState::AfterKeycapBase(mut span), RuneClass::Keycap) => {
                span.extend(rune);
                Some(Emission {
                    span,
                    category: MatchCategory::Emoji,
                })
            }
            (SequenceState::AfterKeycapBase(_), _) => {
                self.start(rune);
                None
            }
        }
    }

    /// Closes whatever is open at end of input.
    pub fn finish(&mut self) -> Option<Emission> {
        match mem::take(&mut self.state) {
            SequenceState::Idle | SequenceState::AfterKeycapBase(_) => None,
            SequenceState::InEmoji(span) | SequenceState::AfterZwj { span, .. } => {
                Some(close(span))
            }
            SequenceState::AfterRegional(span) => self.lone(span),
        }
    }

    fn start(&mut self, rune: Rune) {
        self.state = match rune.class {
            RuneClass::Base | RuneClass::SkinTone => SequenceState::InEmoji(Span::open(rune)),
            RuneClass::RegionalIndicator => SequenceState::AfterRegional(Span::open(rune)),
            RuneClass::KeycapBase => SequenceState::AfterKeycapBase(Span::open(rune)),
            _ => SequenceState::Idle,
        };
    }

    fn lone(&self, span: Span) -> Option<Emission> {
        self.lone_regional_indicator.then_some(Emission {
            span,
            category: MatchCategory::Flag,
        })
    }
}

fn close(span: Span) -> Emission {
    Emission {
        category: span.category(),
        span,
    }
}
