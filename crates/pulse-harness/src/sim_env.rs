//! Seeded, manually advanced environment.
//!
//! Time only moves when the harness moves it, and every random draw comes
//! from one ChaCha8 stream, so the same seed replays a session exactly:
//! same discovery delay, same group size, same avatars, same chatter.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use pulse_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug)]
struct SimState {
    rng: ChaCha8Rng,
    now: Duration,
}

/// Simulation environment with a virtual clock.
///
/// Instants are offsets from the start of the simulation. Clones share the
/// same clock and RNG.
#[derive(Debug, Clone)]
pub struct SimEnv {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEnv {
    /// Environment seeded with 0.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Environment with an explicit seed.
    pub fn with_seed(seed: u64) -> Self {
        let state = SimState { rng: ChaCha8Rng::seed_from_u64(seed), now: Duration::ZERO };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    /// Move the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut state = self.lock();
        state.now += duration;
    }

    /// Move the clock to `instant`. Earlier instants are ignored so time
    /// never goes backwards.
    pub fn advance_to(&self, instant: Duration) {
        let mut state = self.lock();
        state.now = state.now.max(instant);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        // A panicking test thread must not hide the clock from the others
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Environment for SimEnv {
    type Instant = Duration;

    fn now(&self) -> Duration {
        self.lock().now
    }

    /// Sleeping advances virtual time and completes immediately.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.lock().rng.fill_bytes(buffer);
    }
}
