//! Error types for the session engine.
//!
//! Nothing in this taxonomy is fatal. Every variant has a local recovery:
//! unknown mood ids fall back to the default signal, provider failures fall
//! back to canned text, and commands issued in the wrong state are rejected
//! without touching the session.

use std::time::Duration;

use thiserror::Error;

use crate::config::SessionState;

/// Errors from the mood signal registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoodError {
    /// Id is not in the catalog
    #[error("unknown mood signal: {0:?}")]
    UnknownMoodSignal(String),

    /// Catalog must contain at least one signal
    #[error("mood catalog is empty")]
    EmptyCatalog,

    /// Two catalog entries share an id
    #[error("duplicate mood signal id: {0:?}")]
    DuplicateId(String),
}

/// Errors from the session state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Command is not valid in the current state
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// Current state when the command arrived
        state: SessionState,
        /// Command that was attempted
        operation: &'static str,
    },

    /// Session has ended; the transcript is sealed
    #[error("session has ended")]
    Closed,

    /// Message text was empty after trimming
    #[error("message is empty")]
    EmptyMessage,

    /// Rating outside 1..=5
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
}

/// Errors from the message log.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptError {
    /// Append attempted after the log was sealed
    #[error("transcript is sealed")]
    Sealed,
}

/// Errors from the session clock.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// A clock may only be started once
    #[error("clock already started")]
    AlreadyStarted,
}

/// Errors from a content provider.
///
/// These never reach the transcript: callers map them to the request's
/// fallback text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// Provider is not reachable or not configured
    #[error("content provider unavailable: {0}")]
    Unavailable(String),

    /// Provider did not answer in time
    #[error("content provider timed out after {0:?}")]
    Timeout(Duration),

    /// Provider answered with a non-success status
    #[error("content provider returned {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Error message from the provider
        message: String,
    },

    /// Provider answered without usable text
    #[error("content provider returned no text")]
    EmptyResponse,
}

impl ContentError {
    /// Returns true if a retry might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Unavailable(_) => true,
            Self::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            Self::EmptyResponse => false,
        }
    }
}
