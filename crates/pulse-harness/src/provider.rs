//! Scripted content provider.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use pulse_core::{ContentError, ContentProvider, ContentRequest};

/// What a [`ScriptedProvider`] answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    /// The request's local default text
    Default,
    /// The same text for every request
    Fixed(String),
    /// Whitespace only
    Blank,
    /// Always this error
    Fail(ContentError),
}

/// Deterministic provider for simulations.
///
/// Answers synchronously; `latency` is how long the simulated call takes in
/// virtual time.
#[derive(Debug, Clone)]
pub struct ScriptedProvider {
    script: Script,
    latency: Duration,
    calls: Arc<AtomicUsize>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new(Script::Default)
    }
}

impl ScriptedProvider {
    /// Provider following `script` with no latency.
    pub fn new(script: Script) -> Self {
        Self { script, latency: Duration::ZERO, calls: Arc::new(AtomicUsize::new(0)) }
    }

    /// Provider that always fails as unreachable.
    pub fn failing() -> Self {
        Self::new(Script::Fail(ContentError::Unavailable("scripted outage".into())))
    }

    /// Set the simulated call latency.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Simulated call latency.
    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// Number of requests answered so far (shared across clones).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Answer a request.
    pub fn answer(&self, request: &ContentRequest) -> Result<String, ContentError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match &self.script {
            Script::Default => Ok(request.default_text().to_string()),
            Script::Fixed(text) => Ok(text.clone()),
            Script::Blank => Ok("  ".to_string()),
            Script::Fail(err) => Err(err.clone()),
        }
    }
}

#[async_trait]
impl ContentProvider for ScriptedProvider {
    async fn generate(&self, request: &ContentRequest) -> Result<String, ContentError> {
        self.answer(request)
    }
}
