//! Environment abstraction for deterministic testing.
//!
//! Decouples session logic from system resources (time, randomness). Every
//! randomized decision the engine makes (discovery delay, group size, peer
//! avatar, thinking delay, chatter) is drawn through this trait, so a seeded
//! simulation replays a session exactly while production uses the OS RNG and
//! the tokio clock.

use std::time::Duration;

/// Abstract environment providing time, randomness, and async primitives.
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - Methods are infallible except in exceptional circumstances (e.g., OS
///   entropy exhaustion, incorrect simulation setup)
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `tokio::time::Instant`, while simulation
    /// environments use a manually advanced virtual instant.
    type Instant: Copy + Ord + Send + Sync + std::fmt::Debug + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    ///
    /// # Invariants
    ///
    /// - Subsequent calls must return times >= previous calls.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// This is the ONLY async method in the trait, and it should only be used
    /// by driver code (not session logic).
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    ///
    /// Given the same seed, a simulation environment produces the same
    /// sequence of bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Uniform index in `0..upper`. Returns 0 when `upper` is 0.
    fn random_below(&self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        (self.random_u64() % upper as u64) as usize
    }

    /// Uniform duration in `[min, max]` at millisecond resolution.
    ///
    /// Swapped bounds are tolerated and treated as `[max, min]`.
    fn random_duration_between(&self, min: Duration, max: Duration) -> Duration {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        let lo_ms = lo.as_millis() as u64;
        let span = hi.as_millis() as u64 - lo_ms;
        let offset = if span == 0 { 0 } else { self.random_u64() % (span + 1) };
        Duration::from_millis(lo_ms + offset)
    }

    /// Returns `true` with the given probability (clamped to `[0, 1]`).
    fn random_chance(&self, probability: f64) -> bool {
        if probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        // 53 bits gives a uniform f64 in [0, 1)
        let sample = (self.random_u64() >> 11) as f64 / (1u64 << 53) as f64;
        sample < probability
    }
}
