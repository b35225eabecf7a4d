//! Generic runtime for session orchestration.
//!
//! The Runtime drives one session from start to ENDED, coordinating between:
//! - [`Session`]: the pure state machine
//! - [`Matchmaker`] and [`ContentProvider`]: async collaborators
//! - [`Driver`]: frontend I/O
//!
//! Every deferred effect the session asks for (matching, generation,
//! timers) runs as its own task and reports back through one event queue,
//! so the session itself is only ever touched from the loop in
//! [`Runtime::run`]. Tasks still in flight when the session ends are
//! aborted; any completion that slips through is discarded by the session.

use std::sync::Arc;

use pulse_core::{
    CompletionSink, ContentError, ContentProvider, Environment, MatchSimulator, Matchmaker,
    MoodRegistry, OfflineProvider, Session, SessionAction, SessionConfig, SessionEvent,
    SessionState, SessionSummary, StatsDelta, StatsTracker,
};
use tokio::{
    sync::mpsc,
    task::JoinSet,
    time::{self, MissedTickBehavior},
};

use crate::{Driver, RuntimeConfig, RuntimeError, UserCommand};

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Session outcome
    pub summary: SessionSummary,
    /// Stats applied by the completion sink
    pub delta: StatsDelta,
}

/// Generic runtime that orchestrates one [`Session`] over a [`Driver`].
///
/// # Type Parameters
///
/// - `D`: Frontend driver
/// - `E`: Environment for time and randomness
pub struct Runtime<D, E>
where
    D: Driver<Instant = E::Instant>,
    E: Environment,
{
    driver: D,
    env: E,
    session: Session<E::Instant>,
    matchmaker: Arc<dyn Matchmaker>,
    provider: Arc<dyn ContentProvider>,
    sink: Box<dyn CompletionSink>,
    config: RuntimeConfig,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    tasks: JoinSet<()>,
    report: Option<RunReport>,
}

impl<D, E> Runtime<D, E>
where
    D: Driver<Instant = E::Instant>,
    E: Environment,
{
    /// Create a runtime for one session.
    ///
    /// Defaults to the simulated matchmaker, the offline content provider,
    /// and an in-memory stats tracker.
    pub fn new(driver: D, env: E, config: SessionConfig, registry: &MoodRegistry) -> Self {
        let matchmaker: Arc<dyn Matchmaker> =
            Arc::new(MatchSimulator::new(env.clone(), config.matching.clone()));
        let session = Session::new(config, registry);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            driver,
            env,
            session,
            matchmaker,
            provider: Arc::new(OfflineProvider),
            sink: Box::new(StatsTracker::default()),
            config: RuntimeConfig::default(),
            events_tx,
            events_rx,
            tasks: JoinSet::new(),
            report: None,
        }
    }

    /// Replace the matchmaker.
    #[must_use]
    pub fn with_matchmaker(mut self, matchmaker: Arc<dyn Matchmaker>) -> Self {
        self.matchmaker = matchmaker;
        self
    }

    /// Replace the content provider.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn ContentProvider>) -> Self {
        self.provider = provider;
        self
    }

    /// Replace the completion sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn CompletionSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the runtime pacing.
    #[must_use]
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the session to ENDED.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails or the session cannot start.
    pub async fn run(mut self) -> Result<RunReport, RuntimeError<D::Error>> {
        let result = self.drive().await;

        self.tasks.abort_all();
        self.driver.stop();
        result
    }

    async fn drive(&mut self) -> Result<RunReport, RuntimeError<D::Error>> {
        let actions = self.session.start(self.env.now())?;
        self.execute(actions)?;

        let mut ticker = time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            if let Some(report) = self.report.take() {
                return Ok(report);
            }

            tokio::select! {
                command = self.driver.poll_command() => {
                    match command.map_err(RuntimeError::Driver)? {
                        Some(command) => self.apply(command)?,
                        None => self.leave()?,
                    }
                },
                Some(event) = self.events_rx.recv() => {
                    let now = self.env.now();
                    let actions = self.session.handle(event, &self.env, now);
                    self.execute(actions)?;
                },
                _ = ticker.tick() => {
                    let now = self.env.now();
                    let actions = self.session.handle(SessionEvent::Tick, &self.env, now);
                    self.execute(actions)?;
                },
            }

            // Reap finished tasks so long chatty sessions don't accumulate them
            while self.tasks.try_join_next().is_some() {}
        }
    }

    /// Apply a user command. Rejections go back to the driver.
    fn apply(&mut self, command: UserCommand) -> Result<(), RuntimeError<D::Error>> {
        let now = self.env.now();
        let result = match &command {
            UserCommand::Send(text) => self.session.send_user_message(text, &self.env, now),
            UserCommand::Exit => Ok(self.session.exit(now)),
            UserCommand::Feedback(rating) => self.session.submit_feedback(*rating, now),
        };

        match result {
            Ok(actions) => self.execute(actions),
            Err(err) => {
                tracing::debug!(%err, ?command, "command rejected");
                self.driver.reject(&command, &err).map_err(RuntimeError::Driver)
            },
        }
    }

    /// Input closed: leave and skip any feedback step.
    fn leave(&mut self) -> Result<(), RuntimeError<D::Error>> {
        let now = self.env.now();
        let mut actions = self.session.exit(now);
        if self.session.state() == SessionState::Feedback {
            actions.extend(self.session.submit_feedback(None, now)?);
        }
        self.execute(actions)
    }

    /// Execute session actions, then hand each to the driver.
    fn execute(&mut self, actions: Vec<SessionAction>) -> Result<(), RuntimeError<D::Error>> {
        for action in actions {
            match &action {
                SessionAction::FindMatch { mood, kind } => {
                    let matchmaker = Arc::clone(&self.matchmaker);
                    let tx = self.events_tx.clone();
                    let (mood, kind) = (*mood, *kind);
                    self.tasks.spawn(async move {
                        let result = matchmaker.find_match(mood, kind).await;
                        // Receiver is gone once the runtime has torn down
                        let _ = tx.send(SessionEvent::MatchResolved(result));
                    });
                },
                SessionAction::Generate { request_id, request, delay } => {
                    let provider = Arc::clone(&self.provider);
                    let tx = self.events_tx.clone();
                    let env = self.env.clone();
                    let timeout = self.config.content_timeout;
                    let (request_id, request, delay) = (*request_id, request.clone(), *delay);
                    self.tasks.spawn(async move {
                        env.sleep(delay).await;
                        let outcome = match time::timeout(timeout, provider.generate(&request)).await
                        {
                            Ok(outcome) => outcome,
                            Err(_) => Err(ContentError::Timeout(timeout)),
                        };
                        let _ = tx.send(SessionEvent::ContentReady { request_id, outcome });
                    });
                },
                SessionAction::Schedule { timer, delay } => {
                    let tx = self.events_tx.clone();
                    let env = self.env.clone();
                    let (timer, delay) = (*timer, *delay);
                    self.tasks.spawn(async move {
                        env.sleep(delay).await;
                        let _ = tx.send(SessionEvent::TimerFired(timer));
                    });
                },
                SessionAction::Completed(summary) => {
                    let delta = self.sink.on_session_completed(summary.kind, summary.connected_secs);
                    self.report = Some(RunReport { summary: summary.clone(), delta });
                },
                SessionAction::MessageAppended(_)
                | SessionAction::StateChanged { .. }
                | SessionAction::RemainingChanged { .. } => {},
            }

            self.driver.render(&self.session, &action).map_err(RuntimeError::Driver)?;
        }
        Ok(())
    }

    /// Get a reference to the session
    pub fn session(&self) -> &Session<E::Instant> {
        &self.session
    }
}
