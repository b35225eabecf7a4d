//! Session completion stats.
//!
//! Points and focus minutes are awarded once per session, at the ENDED
//! transition, through the [`CompletionSink`] collaborator. The engine never
//! touches a global "current user".

use serde::Serialize;

use crate::config::SessionKind;

/// Flat bonus awarded for every completed session.
pub const COMPLETION_BONUS_POINTS: u32 = 10;

/// Change to a student's running stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatsDelta {
    /// Whole minutes spent connected
    pub focus_minutes: u32,
    /// Sessions completed (always 1 per completion)
    pub sessions_completed: u32,
    /// One point per whole minute plus the completion bonus
    pub community_points: u32,
}

impl StatsDelta {
    /// Delta for a session that was connected for `duration_secs`.
    pub fn for_session(duration_secs: u32) -> Self {
        let minutes = duration_secs / 60;
        Self {
            focus_minutes: minutes,
            sessions_completed: 1,
            community_points: minutes + COMPLETION_BONUS_POINTS,
        }
    }
}

/// Running totals for one student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UserStats {
    /// Total focus minutes
    pub focus_minutes: u32,
    /// Total sessions completed
    pub sessions_completed: u32,
    /// Total community points
    pub community_points: u32,
}

impl UserStats {
    /// Add a delta.
    pub fn apply(&mut self, delta: StatsDelta) {
        self.focus_minutes = self.focus_minutes.saturating_add(delta.focus_minutes);
        self.sessions_completed = self.sessions_completed.saturating_add(delta.sessions_completed);
        self.community_points = self.community_points.saturating_add(delta.community_points);
    }
}

/// Receives exactly one notification per ended session.
pub trait CompletionSink: Send {
    /// Record a completed session and return the delta applied.
    fn on_session_completed(&mut self, kind: SessionKind, duration_secs: u32) -> StatsDelta;
}

/// In-memory sink that accumulates [`UserStats`].
#[derive(Debug, Clone, Default)]
pub struct StatsTracker {
    stats: UserStats,
}

impl StatsTracker {
    /// Start from existing totals.
    pub fn with_stats(stats: UserStats) -> Self {
        Self { stats }
    }

    /// Current totals.
    pub fn stats(&self) -> UserStats {
        self.stats
    }
}

impl CompletionSink for StatsTracker {
    fn on_session_completed(&mut self, kind: SessionKind, duration_secs: u32) -> StatsDelta {
        let delta = StatsDelta::for_session(duration_secs);
        self.stats.apply(delta);
        tracing::info!(%kind, duration_secs, points = delta.community_points, "session completed");
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_are_minutes_plus_bonus() {
        assert_eq!(StatsDelta::for_session(0), StatsDelta {
            focus_minutes: 0,
            sessions_completed: 1,
            community_points: 10,
        });
        assert_eq!(StatsDelta::for_session(600).community_points, 20);
        assert_eq!(StatsDelta::for_session(119).focus_minutes, 1);
    }

    #[test]
    fn tracker_accumulates() {
        let mut tracker = StatsTracker::default();
        tracker.on_session_completed(SessionKind::Group, 300);
        tracker.on_session_completed(SessionKind::OneOnOne, 30);
        assert_eq!(tracker.stats(), UserStats {
            focus_minutes: 5,
            sessions_completed: 2,
            community_points: 25,
        });
    }
}
