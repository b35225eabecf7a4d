//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use pulse_core::{SenderRole, SessionKind, SessionState};

use super::{Invariant, InvariantResult, SessionSnapshot, Violation};

/// No peer is recorded before a match resolves.
pub struct SearchingHoldsNoPeer;

impl Invariant for SearchingHoldsNoPeer {
    fn name(&self) -> &'static str {
        "searching_holds_no_peer"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if matches!(state.state, SessionState::Idle | SessionState::Searching)
            && (state.peer_count != 0 || !state.messages.is_empty())
        {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "{:?} with {} peers and {} messages",
                    state.state,
                    state.peer_count,
                    state.messages.len()
                ),
            });
        }
        Ok(())
    }
}

/// A connected session holds its peer(s) and, when timed, exactly one
/// running clock.
pub struct ConnectedHoldsPeer;

impl Invariant for ConnectedHoldsPeer {
    fn name(&self) -> &'static str {
        "connected_holds_peer"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.state != SessionState::Connected {
            return Ok(());
        }
        let peers_ok = match state.kind {
            SessionKind::Group => state.peer_count >= 1,
            SessionKind::OneOnOne | SessionKind::HelpingHand(_) => {
                state.has_single_peer && state.peer_count == 1
            },
        };
        if !peers_ok {
            return Err(Violation {
                invariant: self.name(),
                message: format!("{} connected with {} peers", state.kind, state.peer_count),
            });
        }
        if state.timed && !state.clock_running {
            return Err(Violation {
                invariant: self.name(),
                message: format!("{} connected without a running clock", state.kind),
            });
        }
        Ok(())
    }
}

/// ENDED is frozen: sealed transcript, nothing pending, no clock, and no
/// message appended after the transition.
pub struct EndedIsFrozen;

impl Invariant for EndedIsFrozen {
    fn name(&self) -> &'static str {
        "ended_is_frozen"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if !state.state.is_terminal() {
            return Ok(());
        }
        let violation = |message: String| Err(Violation { invariant: self.name(), message });

        if !state.sealed {
            return violation("transcript still accepts appends".into());
        }
        if state.clock_running {
            return violation("clock still running".into());
        }
        if state.pending_replies != 0 {
            return violation(format!("{} replies still pending", state.pending_replies));
        }
        if let Some(len) = state.ended_len {
            if len != state.messages.len() {
                return violation(format!(
                    "transcript grew from {len} to {} after ENDED",
                    state.messages.len()
                ));
            }
        }
        Ok(())
    }
}

/// Completion is reported exactly once, at ENDED, and never before.
pub struct SingleCompletion;

impl Invariant for SingleCompletion {
    fn name(&self) -> &'static str {
        "single_completion"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let expected = usize::from(state.state.is_terminal());
        if state.completions != expected {
            return Err(Violation {
                invariant: self.name(),
                message: format!("{} completions in {:?}", state.completions, state.state),
            });
        }
        Ok(())
    }
}

/// Observed countdown values step down by exactly one second.
pub struct RemainingMonotonic;

impl Invariant for RemainingMonotonic {
    fn name(&self) -> &'static str {
        "remaining_monotonic"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        for window in state.remaining_history.windows(2) {
            if window[1] + 1 != window[0] {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("remaining went {} → {}", window[0], window[1]),
                });
            }
        }
        Ok(())
    }
}

/// The connection announcement precedes every other message, and no
/// message body is blank.
pub struct SystemBeforeChatter;

impl Invariant for SystemBeforeChatter {
    fn name(&self) -> &'static str {
        "system_before_chatter"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if let Some(first) = state.messages.first() {
            if first.sender != SenderRole::System {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("first message is from {:?}", first.sender),
                });
            }
        }
        if let Some(index) = state.messages.iter().position(|m| m.blank) {
            return Err(Violation {
                invariant: self.name(),
                message: format!("message {index} is blank"),
            });
        }
        Ok(())
    }
}
