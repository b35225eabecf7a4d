//! Deferred inputs to the session state machine.
//!
//! These are the completions of work the session asked the driver to do
//! (see [`crate::SessionAction`]) plus the periodic tick. Any of them can
//! arrive after the session has moved on; the session checks its state and
//! discards stale ones instead of applying them.

use std::fmt;

use crate::{error::ContentError, matching::MatchResult};

/// Correlates a [`crate::SessionAction::Generate`] or scheduled reply with
/// its completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Named timers the session schedules through the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timer {
    /// Group chatter opportunity
    Chatter,
    /// Scripted peer reply is due
    Reply(RequestId),
}

/// Events processed by [`crate::Session::handle`].
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Periodic clock poll
    Tick,

    /// Matchmaking finished
    MatchResolved(MatchResult),

    /// Content provider finished (successfully or not)
    ContentReady {
        /// Request being answered
        request_id: RequestId,
        /// Provider outcome; errors are mapped to fallback text
        outcome: Result<String, ContentError>,
    },

    /// A scheduled timer elapsed
    TimerFired(Timer),
}
