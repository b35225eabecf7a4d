//! Session countdown clock.
//!
//! A pure clock: it never sleeps or spawns. The driver polls it with the
//! current time and receives the ticks and expiry that became due since the
//! last poll. Ticks are reported one per whole second crossed, so a late poll
//! catches up with every missed second instead of skipping values.
//!
//! # Lifecycle
//!
//! ```text
//! ┌──────┐ start ┌─────────┐ remaining = 0 ┌─────────┐
//! │ Idle │──────>│ Running │──────────────>│ Expired │
//! └──────┘       └─────────┘               └─────────┘
//!                     │ cancel
//!                     ↓
//!                ┌───────────┐
//!                │ Cancelled │
//!                └───────────┘
//! ```
//!
//! Expiry is reported exactly once. Cancelled and expired clocks never tick
//! again, and a clock can only be started once.

use std::{num::NonZeroU32, ops::Sub, time::Duration};

use crate::error::ClockError;

/// Clock lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockStatus {
    /// Not yet started
    Idle,
    /// Counting down
    Running,
    /// Reached zero
    Expired,
    /// Stopped early without expiring
    Cancelled,
}

/// Output of [`SessionClock::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// One second elapsed
    Tick {
        /// Whole seconds left
        remaining: u32,
    },
    /// Countdown reached zero
    Expired,
}

/// One-shot countdown clock with one-second granularity.
#[derive(Debug, Clone)]
pub struct SessionClock<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    duration_secs: u32,
    started_at: Option<I>,
    remaining: u32,
    status: ClockStatus,
}

impl<I> SessionClock<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create an idle clock.
    pub fn new(duration: NonZeroU32) -> Self {
        Self {
            duration_secs: duration.get(),
            started_at: None,
            remaining: duration.get(),
            status: ClockStatus::Idle,
        }
    }

    /// Start counting down from `now`.
    ///
    /// # Errors
    ///
    /// - `ClockError::AlreadyStarted` if the clock has ever been started
    pub fn start(&mut self, now: I) -> Result<(), ClockError> {
        if self.status != ClockStatus::Idle {
            return Err(ClockError::AlreadyStarted);
        }
        self.started_at = Some(now);
        self.status = ClockStatus::Running;
        Ok(())
    }

    /// Report ticks (and expiry) that became due by `now`.
    pub fn poll(&mut self, now: I) -> Vec<ClockEvent> {
        let Some(started_at) = self.started_at else {
            return Vec::new();
        };
        if self.status != ClockStatus::Running {
            return Vec::new();
        }

        // A `now` earlier than the start is treated as no elapsed time
        let elapsed = if now > started_at { (now - started_at).as_secs() } else { 0 };
        let target = self.duration_secs.saturating_sub(u32::try_from(elapsed).unwrap_or(u32::MAX));

        let mut events = Vec::new();
        while self.remaining > target {
            self.remaining -= 1;
            events.push(ClockEvent::Tick { remaining: self.remaining });
        }

        if self.remaining == 0 {
            self.status = ClockStatus::Expired;
            events.push(ClockEvent::Expired);
        }

        events
    }

    /// Stop without expiring. Returns `true` if the clock was running.
    pub fn cancel(&mut self) -> bool {
        if self.status == ClockStatus::Running {
            self.status = ClockStatus::Cancelled;
            true
        } else {
            false
        }
    }

    /// Whole seconds left as of the last poll.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Configured duration in seconds.
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// Current lifecycle status.
    pub fn status(&self) -> ClockStatus {
        self.status
    }

    /// `true` while counting down.
    pub fn is_running(&self) -> bool {
        self.status == ClockStatus::Running
    }

    /// Time until the next tick is due, measured from `now`. `None` unless
    /// running.
    pub fn until_next_tick(&self, now: I) -> Option<Duration> {
        let started_at = self.started_at?;
        if self.status != ClockStatus::Running {
            return None;
        }
        let next_at = Duration::from_secs(u64::from(self.duration_secs - self.remaining + 1));
        let elapsed = if now > started_at { now - started_at } else { Duration::ZERO };
        Some(next_at.saturating_sub(elapsed))
    }
}

/// Format seconds as `m:ss`.
pub fn format_remaining(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Hosts highlight the countdown during the last minute.
pub fn is_low_time(seconds: u32) -> bool {
    seconds < 60
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn clock(d: u32) -> SessionClock<Duration> {
        SessionClock::new(NonZeroU32::new(d).unwrap())
    }

    #[test]
    fn idle_clock_does_not_tick() {
        let mut c = clock(5);
        assert!(c.poll(secs(10)).is_empty());
        assert_eq!(c.remaining(), 5);
    }

    #[test]
    fn ticks_once_per_second() {
        let mut c = clock(3);
        c.start(secs(0)).unwrap();

        assert!(c.poll(Duration::from_millis(999)).is_empty());
        assert_eq!(c.poll(secs(1)), vec![ClockEvent::Tick { remaining: 2 }]);
        assert_eq!(c.poll(secs(2)), vec![ClockEvent::Tick { remaining: 1 }]);
        assert_eq!(c.poll(secs(3)), vec![ClockEvent::Tick { remaining: 0 }, ClockEvent::Expired]);
        assert_eq!(c.status(), ClockStatus::Expired);
    }

    #[test]
    fn late_poll_catches_up_every_second() {
        let mut c = clock(4);
        c.start(secs(10)).unwrap();

        let events = c.poll(secs(13));
        assert_eq!(events, vec![
            ClockEvent::Tick { remaining: 3 },
            ClockEvent::Tick { remaining: 2 },
            ClockEvent::Tick { remaining: 1 },
        ]);
    }

    #[test]
    fn expiry_fires_exactly_once() {
        let mut c = clock(1);
        c.start(secs(0)).unwrap();
        let first = c.poll(secs(100));
        assert_eq!(first.iter().filter(|e| **e == ClockEvent::Expired).count(), 1);
        assert!(c.poll(secs(200)).is_empty());
    }

    #[test]
    fn cancel_stops_without_expiry() {
        let mut c = clock(10);
        c.start(secs(0)).unwrap();
        let _ = c.poll(secs(2));
        assert!(c.cancel());
        assert!(!c.cancel());
        assert!(c.poll(secs(20)).is_empty());
        assert_eq!(c.remaining(), 8);
        assert_eq!(c.status(), ClockStatus::Cancelled);
    }

    #[test]
    fn second_start_is_rejected() {
        let mut c = clock(10);
        c.start(secs(0)).unwrap();
        assert_eq!(c.start(secs(1)), Err(ClockError::AlreadyStarted));

        let mut cancelled = clock(10);
        cancelled.start(secs(0)).unwrap();
        cancelled.cancel();
        assert_eq!(cancelled.start(secs(1)), Err(ClockError::AlreadyStarted));
    }

    #[test]
    fn next_tick_deadline() {
        let mut c = clock(10);
        assert_eq!(c.until_next_tick(secs(0)), None);
        c.start(secs(0)).unwrap();
        assert_eq!(c.until_next_tick(Duration::from_millis(400)), Some(Duration::from_millis(600)));
        let _ = c.poll(secs(1));
        assert_eq!(c.until_next_tick(secs(1)), Some(secs(1)));
    }

    #[test]
    fn formatting() {
        assert_eq!(format_remaining(300), "5:00");
        assert_eq!(format_remaining(61), "1:01");
        assert_eq!(format_remaining(9), "0:09");
        assert!(is_low_time(59));
        assert!(!is_low_time(60));
    }
}
