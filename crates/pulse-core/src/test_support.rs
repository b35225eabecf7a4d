//! Deterministic environment for unit tests.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use crate::env::Environment;

/// Seeded xorshift RNG with a frozen clock. Tests pass `now` explicitly.
#[derive(Debug, Clone)]
pub(crate) struct TestEnv {
    state: Arc<AtomicU64>,
}

impl TestEnv {
    pub(crate) fn new(seed: u64) -> Self {
        // xorshift is stuck at zero
        Self { state: Arc::new(AtomicU64::new(seed.max(1))) }
    }
}

impl Environment for TestEnv {
    type Instant = Duration;

    fn now(&self) -> Duration {
        Duration::ZERO
    }

    fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        std::future::ready(())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        for chunk in buffer.chunks_mut(8) {
            let mut x = self.state.load(Ordering::Relaxed);
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            self.state.store(x, Ordering::Relaxed);
            let bytes = x.to_be_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}
