//! Virtual-time session driver.
//!
//! `SimSession` plays the role the tokio runtime plays in production: it
//! executes the [`SessionAction`]s a session emits and feeds completions
//! back as [`SessionEvent`]s. Instead of spawning tasks it keeps one ordered
//! queue of deferred events keyed by virtual due time, and instead of an
//! interval timer it injects `Tick` on every tick boundary. Advancing time
//! drains the queue in due order, so a whole session replays identically
//! from a seed.

use std::{collections::BTreeMap, time::Duration};

use pulse_app::RuntimeConfig;
use pulse_core::{
    CompletionSink, ContentError, Environment, MatchSimulator, MoodRegistry, Session,
    SessionAction, SessionConfig, SessionError, SessionEvent, SessionState, SessionSummary,
    StatsTracker, UserStats,
};

use crate::{
    SimEnv,
    invariants::{InvariantRegistry, SessionSnapshot},
    provider::ScriptedProvider,
};

/// Deterministic driver for one session.
pub struct SimSession {
    env: SimEnv,
    session: Session<Duration>,
    matcher: MatchSimulator<SimEnv>,
    provider: ScriptedProvider,
    runtime: RuntimeConfig,
    queue: BTreeMap<(Duration, u64), SessionEvent>,
    seq: u64,
    next_tick: Duration,
    actions: Vec<SessionAction>,
    remaining_history: Vec<u32>,
    summaries: Vec<SessionSummary>,
    ended_len: Option<usize>,
    stats: StatsTracker,
    invariants: Option<InvariantRegistry>,
}

impl SimSession {
    /// Simulate `config` with a fresh environment seeded with `seed`.
    pub fn new(config: SessionConfig, seed: u64) -> Self {
        Self::with_env(SimEnv::with_seed(seed), config, &MoodRegistry::campus())
    }

    /// Simulate `config` on an existing environment.
    pub fn with_env(env: SimEnv, config: SessionConfig, registry: &MoodRegistry) -> Self {
        let matcher = MatchSimulator::new(env.clone(), config.matching.clone());
        let runtime = RuntimeConfig::default();
        let next_tick = env.now() + runtime.tick_interval;
        Self {
            session: Session::new(config, registry),
            env,
            matcher,
            provider: ScriptedProvider::default(),
            runtime,
            queue: BTreeMap::new(),
            seq: 0,
            next_tick,
            actions: Vec::new(),
            remaining_history: Vec::new(),
            summaries: Vec::new(),
            ended_len: None,
            stats: StatsTracker::default(),
            invariants: None,
        }
    }

    /// Use a scripted content provider.
    #[must_use]
    pub fn with_provider(mut self, provider: ScriptedProvider) -> Self {
        self.provider = provider;
        self
    }

    /// Use custom runtime pacing (tick interval, content timeout).
    #[must_use]
    pub fn with_runtime(mut self, runtime: RuntimeConfig) -> Self {
        self.next_tick = self.env.now() + runtime.tick_interval;
        self.runtime = runtime;
        self
    }

    /// Check invariants after every step.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(registry);
        self
    }

    /// Begin matchmaking.
    ///
    /// # Errors
    ///
    /// Propagates the session's rejection.
    pub fn start(&mut self) -> Result<(), SessionError> {
        let actions = self.session.start(self.env.now())?;
        self.execute(actions);
        self.check("after start");
        Ok(())
    }

    /// Send a user message.
    ///
    /// # Errors
    ///
    /// Propagates the session's rejection.
    pub fn send(&mut self, text: &str) -> Result<(), SessionError> {
        let actions = self.session.send_user_message(text, &self.env, self.env.now())?;
        self.execute(actions);
        self.check("after send");
        Ok(())
    }

    /// Leave the session.
    pub fn exit(&mut self) {
        let actions = self.session.exit(self.env.now());
        self.execute(actions);
        self.check("after exit");
    }

    /// Close the feedback step.
    ///
    /// # Errors
    ///
    /// Propagates the session's rejection.
    pub fn submit_feedback(&mut self, rating: Option<u8>) -> Result<(), SessionError> {
        let actions = self.session.submit_feedback(rating, self.env.now())?;
        self.execute(actions);
        self.check("after feedback");
        Ok(())
    }

    /// Deliver an event immediately, bypassing the queue.
    ///
    /// Models completions arriving at arbitrary moments (duplicates, late
    /// arrivals after teardown).
    pub fn inject(&mut self, event: SessionEvent) {
        self.dispatch(event);
    }

    /// Advance virtual time by `duration`, delivering everything that
    /// becomes due on the way.
    pub fn advance(&mut self, duration: Duration) {
        let target = self.env.now() + duration;
        self.run_until(target);
    }

    /// Advance in tick-sized steps until `done` holds or `limit` elapses.
    ///
    /// Returns whether `done` was reached.
    pub fn advance_until(
        &mut self,
        limit: Duration,
        mut done: impl FnMut(&Session<Duration>) -> bool,
    ) -> bool {
        let deadline = self.env.now() + limit;
        while !done(&self.session) {
            if self.env.now() >= deadline {
                return false;
            }
            let step = self.runtime.tick_interval.min(deadline - self.env.now());
            self.advance(step);
        }
        true
    }

    fn run_until(&mut self, target: Duration) {
        loop {
            let next_event = self.queue.keys().next().map(|(due, _)| *due);
            let (due, is_tick) = match next_event {
                Some(due) if due <= self.next_tick => (due, false),
                _ => (self.next_tick, true),
            };
            if due > target {
                break;
            }

            self.env.advance_to(due);
            if is_tick {
                self.next_tick += self.runtime.tick_interval;
                self.dispatch(SessionEvent::Tick);
            } else if let Some((_, event)) = self.queue.pop_first() {
                self.dispatch(event);
            }
        }
        self.env.advance_to(target);
    }

    fn dispatch(&mut self, event: SessionEvent) {
        let label = format!("after {event:?}");
        let actions = self.session.handle(event, &self.env, self.env.now());
        self.execute(actions);
        self.check(&label);
    }

    fn schedule(&mut self, delay: Duration, event: SessionEvent) {
        let due = self.env.now() + delay;
        self.queue.insert((due, self.seq), event);
        self.seq += 1;
    }

    fn execute(&mut self, actions: Vec<SessionAction>) {
        for action in actions {
            match &action {
                SessionAction::FindMatch { mood, kind } => {
                    let delay = self.matcher.discovery_delay();
                    let result = self.matcher.resolve(*kind);
                    tracing::debug!(mood = mood.id, ?delay, "scheduling simulated match");
                    self.schedule(delay, SessionEvent::MatchResolved(result));
                },
                SessionAction::Generate { request_id, request, delay } => {
                    let timeout = self.runtime.content_timeout;
                    let latency = self.provider.latency();
                    let (outcome, took) = if latency > timeout {
                        (Err(ContentError::Timeout(timeout)), timeout)
                    } else {
                        (self.provider.answer(request), latency)
                    };
                    let event = SessionEvent::ContentReady { request_id: *request_id, outcome };
                    self.schedule(*delay + took, event);
                },
                SessionAction::Schedule { timer, delay } => {
                    self.schedule(*delay, SessionEvent::TimerFired(*timer));
                },
                SessionAction::RemainingChanged { remaining } => {
                    self.remaining_history.push(*remaining);
                },
                SessionAction::StateChanged { to: SessionState::Ended, .. } => {
                    self.ended_len = Some(self.session.transcript().len());
                },
                SessionAction::Completed(summary) => {
                    self.stats.on_session_completed(summary.kind, summary.connected_secs);
                    self.summaries.push(summary.clone());
                },
                SessionAction::StateChanged { .. } | SessionAction::MessageAppended(_) => {},
            }
            self.actions.push(action);
        }
    }

    fn check(&self, context: &str) {
        if let Some(registry) = &self.invariants {
            registry.assert_all(&self.snapshot(), context);
        }
    }

    /// Observable state plus recorded history.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(&self.session)
            .with_remaining_history(self.remaining_history.clone())
            .with_ended_len(self.ended_len)
            .with_completions(self.summaries.len())
    }

    /// The simulated session.
    pub fn session(&self) -> &Session<Duration> {
        &self.session
    }

    /// The shared environment.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.env.now()
    }

    /// Every action executed so far, in order.
    pub fn actions(&self) -> &[SessionAction] {
        &self.actions
    }

    /// Countdown values observed so far.
    pub fn remaining_history(&self) -> &[u32] {
        &self.remaining_history
    }

    /// Completion summaries observed so far.
    pub fn summaries(&self) -> &[SessionSummary] {
        &self.summaries
    }

    /// Stats accumulated by the completion sink.
    pub fn stats(&self) -> UserStats {
        self.stats.stats()
    }

    /// Deferred events not yet delivered.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}
