//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture what a host could observe about a session at a point
//! in time, plus the history the harness recorded while driving it.
//! Invariants operate on snapshots rather than live state so every check
//! sees one consistent view.

use std::ops::Sub;
use std::time::Duration;

use pulse_core::{SenderRole, Session, SessionKind, SessionState};
use serde::Serialize;

/// One transcript entry as seen by invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSnapshot {
    /// Author role
    pub sender: SenderRole,
    /// Whether a speaking identity is attached
    pub has_author: bool,
    /// Whether the body is blank
    pub blank: bool,
}

/// Snapshot of one session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    /// Lifecycle state
    pub state: SessionState,
    /// Session shape
    pub kind: SessionKind,
    /// Peers connected
    pub peer_count: u32,
    /// Whether a single 1:1 partner is recorded
    pub has_single_peer: bool,
    /// Whether the session kind runs a clock
    pub timed: bool,
    /// Whether the clock is counting down
    pub clock_running: bool,
    /// Outstanding replies
    pub pending_replies: usize,
    /// Transcript contents
    pub messages: Vec<MessageSnapshot>,
    /// Whether the transcript rejects appends
    pub sealed: bool,
    /// Every `RemainingChanged` value observed, in order
    pub remaining_history: Vec<u32>,
    /// Transcript length when ENDED was first observed
    pub ended_len: Option<usize>,
    /// Number of completion notifications observed
    pub completions: usize,
}

impl SessionSnapshot {
    /// Capture the session's observable state with no recorded history.
    pub fn capture<I>(session: &Session<I>) -> Self
    where
        I: Copy + Ord + Sub<Output = Duration>,
    {
        let messages = session
            .transcript()
            .history()
            .iter()
            .map(|m| MessageSnapshot {
                sender: m.sender,
                has_author: m.author.is_some(),
                blank: m.text.trim().is_empty(),
            })
            .collect();

        Self {
            state: session.state(),
            kind: session.kind(),
            peer_count: session.peer_count(),
            has_single_peer: session.peer().is_some(),
            timed: session.config().duration.is_some(),
            clock_running: session.clock_running(),
            pending_replies: session.pending_replies(),
            messages,
            sealed: session.transcript().is_sealed(),
            remaining_history: Vec::new(),
            ended_len: None,
            completions: 0,
        }
    }

    /// Attach the countdown values observed so far.
    #[must_use]
    pub fn with_remaining_history(mut self, history: Vec<u32>) -> Self {
        self.remaining_history = history;
        self
    }

    /// Attach the transcript length observed at the ENDED transition.
    #[must_use]
    pub fn with_ended_len(mut self, len: Option<usize>) -> Self {
        self.ended_len = len;
        self
    }

    /// Attach the number of completion notifications observed.
    #[must_use]
    pub fn with_completions(mut self, completions: usize) -> Self {
        self.completions = completions;
        self
    }
}
