//! Session side-effects and intents.
//!
//! [`SessionAction`] values are instructions produced by the
//! [`crate::Session`] state machine. The session never sleeps, spawns, or
//! performs I/O itself; the driver executes these actions and feeds their
//! completions back as [`crate::SessionEvent`]s.

use std::time::Duration;

use crate::{
    config::{SessionKind, SessionState},
    content::ContentRequest,
    event::{RequestId, Timer},
    mood::MoodSignal,
    session::SessionSummary,
    transcript::Message,
};

/// Actions produced by the session state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// Ask the matchmaker for peers; answer with `MatchResolved`.
    FindMatch {
        /// Resolved mood signal
        mood: MoodSignal,
        /// Session shape
        kind: SessionKind,
    },

    /// Wait `delay`, then ask the content provider; answer with
    /// `ContentReady`.
    Generate {
        /// Correlation id
        request_id: RequestId,
        /// What to generate
        request: ContentRequest,
        /// Thinking/typing pause before the request
        delay: Duration,
    },

    /// Fire `TimerFired(timer)` after `delay`.
    Schedule {
        /// Timer to fire
        timer: Timer,
        /// Delay from now
        delay: Duration,
    },

    /// A message was appended to the transcript.
    MessageAppended(Message),

    /// The lifecycle state changed.
    StateChanged {
        /// Previous state
        from: SessionState,
        /// New state
        to: SessionState,
    },

    /// Countdown changed (including the initial value on connect).
    RemainingChanged {
        /// Whole seconds left
        remaining: u32,
    },

    /// Session reached ENDED. Emitted exactly once.
    Completed(SessionSummary),
}
