//! Runtime pacing.

use std::time::Duration;

/// How often the runtime polls the session clock.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound on a single content provider call. Slower answers are
/// replaced by the request's fallback text.
pub const DEFAULT_CONTENT_TIMEOUT: Duration = Duration::from_secs(8);

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Clock poll cadence
    pub tick_interval: Duration,
    /// Per-call content provider deadline
    pub content_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { tick_interval: DEFAULT_TICK_INTERVAL, content_timeout: DEFAULT_CONTENT_TIMEOUT }
    }
}
