//! Production environment using tokio time and the OS RNG.
//!
//! `SystemEnv` uses `tokio::time::Instant` rather than `std::time::Instant`
//! so that a runtime started with paused time (as in the async tests) sees
//! the same virtual clock for `now()` and `sleep()`.

use std::time::Duration;

use pulse_core::Environment;

/// Production environment backed by tokio time and getrandom.
///
/// # Panics
///
/// Panics if the OS RNG fails. Randomness only drives pacing and avatar
/// choice here, but a host without a working RNG is broken beyond anything
/// a session can recover from.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("invariant: OS RNG failure is unrecoverable");
    }
}
