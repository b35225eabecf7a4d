//! Property tests for the session countdown.
//!
//! These tests verify:
//! - Ticks report strictly decreasing remaining time, one second apart
//! - Expiry fires at most once, and only right after the zero tick
//! - Cancel silences the clock permanently

use std::{num::NonZeroU32, time::Duration};

use proptest::prelude::*;
use pulse_core::{ClockEvent, ClockStatus, SessionClock};

fn poll_offsets() -> impl Strategy<Value = Vec<u64>> {
    // Millisecond gaps between polls; zero gaps model duplicate polls
    prop::collection::vec(0u64..2_500, 1..200)
}

proptest! {
    #[test]
    fn ticks_strictly_decrease(duration in 1u32..120, gaps in poll_offsets()) {
        let mut clock = SessionClock::new(NonZeroU32::new(duration).unwrap());
        clock.start(Duration::ZERO).unwrap();

        let mut now = Duration::ZERO;
        let mut last = duration;
        let mut expired = 0;
        let mut saw_zero = false;

        for gap in gaps {
            now += Duration::from_millis(gap);
            for event in clock.poll(now) {
                match event {
                    ClockEvent::Tick { remaining } => {
                        prop_assert_eq!(remaining + 1, last);
                        prop_assert_eq!(expired, 0);
                        last = remaining;
                        saw_zero |= remaining == 0;
                    },
                    ClockEvent::Expired => {
                        prop_assert!(saw_zero);
                        expired += 1;
                    },
                }
            }
            // Remaining always matches whole elapsed seconds
            let elapsed = u32::try_from(now.as_secs()).unwrap_or(u32::MAX);
            prop_assert_eq!(clock.remaining(), duration.saturating_sub(elapsed));
        }

        prop_assert!(expired <= 1);
        if now >= Duration::from_secs(u64::from(duration)) {
            prop_assert_eq!(expired, 1);
            prop_assert_eq!(clock.status(), ClockStatus::Expired);
        }
    }

    #[test]
    fn cancel_is_permanent(duration in 2u32..60, cancel_at in 0u64..60_000, more in poll_offsets()) {
        let mut clock = SessionClock::new(NonZeroU32::new(duration).unwrap());
        clock.start(Duration::ZERO).unwrap();

        let mut now = Duration::from_millis(cancel_at);
        let _ = clock.poll(now);
        let was_running = clock.is_running();
        prop_assert_eq!(clock.cancel(), was_running);
        let frozen = clock.remaining();

        for gap in more {
            now += Duration::from_millis(gap);
            prop_assert!(clock.poll(now).is_empty());
        }
        prop_assert_eq!(clock.remaining(), frozen);
    }
}
