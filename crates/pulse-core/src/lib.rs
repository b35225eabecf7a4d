//! Pulse core
//!
//! Action-based state machines for ephemeral, anonymous, mood-matched chat
//! sessions. A student picks a mood signal, is matched with synthetic peers,
//! chats inside a (possibly timed) session, and leaves. Nothing is persisted
//! beyond the session.
//!
//! # Architecture
//!
//! Everything in this crate is pure: no sleeping, spawning, or I/O. The
//! [`Session`] state machine takes commands and [`SessionEvent`]s along with
//! the current time and an [`Environment`] for randomness, and returns
//! [`SessionAction`]s for a driver to execute. The same code runs under the
//! tokio runtime in production and under virtual time in simulation.
//!
//! # Components
//!
//! - [`MoodRegistry`]: Read-only mood signal catalog
//! - [`MatchSimulator`]: Simulated matchmaker behind the [`Matchmaker`] seam
//! - [`SessionClock`]: One-shot per-second countdown
//! - [`Transcript`]: Append-only, sealable message log
//! - [`Session`]: Lifecycle controller tying the above together
//! - [`ContentProvider`]: Seam for generated text, with local fallbacks
//! - [`CompletionSink`]: Receives one stats notification per ended session

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod action;
pub mod clock;
pub mod config;
pub mod content;
pub mod env;
pub mod error;
pub mod event;
pub mod matching;
pub mod mood;
pub mod peer;
pub mod session;
pub mod stats;
pub mod transcript;

#[cfg(test)]
mod test_support;

pub use action::SessionAction;
pub use clock::{ClockEvent, ClockStatus, SessionClock, format_remaining, is_low_time};
pub use config::{HelperRole, ReplyConfig, SessionConfig, SessionKind, SessionState};
pub use content::{ContentKind, ContentProvider, ContentRequest, OfflineProvider, resolve_text};
pub use env::Environment;
pub use error::{ClockError, ContentError, MoodError, SessionError, TranscriptError};
pub use event::{RequestId, SessionEvent, Timer};
pub use matching::{MatchResult, MatchSimulator, Matchmaker, MatchingConfig};
pub use mood::{MoodRegistry, MoodSignal};
pub use peer::{Avatar, ColorTheme, Peer};
pub use session::{EndReason, Session, SessionSummary, feedback_prompt};
pub use stats::{CompletionSink, StatsDelta, StatsTracker, UserStats};
pub use transcript::{Message, MessageId, SenderRole, Transcript};
