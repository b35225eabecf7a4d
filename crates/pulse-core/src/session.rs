//! Session controller state machine.
//!
//! One [`Session`] orchestrates one ephemeral chat: matchmaking, the
//! countdown, the transcript, and peer replies. It uses the action pattern:
//! every method takes the current time (and an environment for randomness)
//! and returns [`SessionAction`]s for the driver to execute. Nothing here
//! sleeps or performs I/O, so transitions can be tested without timers.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ start ┌───────────┐ MatchResolved ┌───────────┐
//! │ Idle │──────>│ Searching │──────────────>│ Connected │<──┐ user message,
//! └──────┘       └───────────┘               └───────────┘───┘ replies, chatter
//!                      │ exit                  │        │
//!                      │         exit / expiry │        │ exit / expiry
//!                      │   (group, 1:1)        │        │ (helping hand)
//!                      ↓                       ↓        ↓
//!                  ┌───────┐<──────────────────┘   ┌──────────┐
//!                  │ Ended │<──────────────────────│ Feedback │
//!                  └───────┘    submit_feedback    └──────────┘
//! ```
//!
//! `Ended` is terminal: the transcript is sealed, the clock is stopped, and
//! every deferred completion that arrives afterwards is discarded.

use std::{collections::HashMap, ops::Sub, time::Duration};

use serde::Serialize;

use crate::{
    action::SessionAction,
    clock::{ClockEvent, SessionClock},
    config::{HelperRole, SessionConfig, SessionKind, SessionState},
    content::{ContentKind, ContentRequest, helping_hand_replies, resolve_text},
    env::Environment,
    error::{ContentError, SessionError, TranscriptError},
    event::{RequestId, SessionEvent, Timer},
    matching::{MatchResult, roll_chatter},
    mood::{MoodRegistry, MoodSignal},
    peer::Peer,
    transcript::{Message, SenderRole, Transcript},
};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EndReason {
    /// Countdown reached zero
    Expired,
    /// User left while connected
    UserExit,
    /// User left before a match was found
    AbandonedWhileSearching,
}

/// Emitted once when a session ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// Session shape
    pub kind: SessionKind,
    /// Resolved mood signal id
    pub mood_id: &'static str,
    /// Whole seconds between connecting and the conversation ending
    pub connected_secs: u32,
    /// Transcript length at teardown
    pub message_count: usize,
    /// Helping-hand rating from a venter
    pub rating: Option<u8>,
    /// What ended the conversation
    pub reason: EndReason,
}

/// Reply the session is waiting on.
#[derive(Debug, Clone)]
enum PendingReply {
    /// Waiting on the content provider
    Generated(ContentRequest),
    /// Waiting on a timer; text already chosen
    Scripted(&'static str),
}

/// Session controller.
///
/// Generic over `Instant` to support both real time and virtual time for
/// deterministic testing.
#[derive(Debug, Clone)]
pub struct Session<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    config: SessionConfig,
    mood: MoodSignal,
    state: SessionState,
    matched: Option<MatchResult>,
    clock: Option<SessionClock<I>>,
    transcript: Transcript,
    pending: HashMap<RequestId, PendingReply>,
    next_request: u64,
    started_at: Option<I>,
    connected_at: Option<I>,
    connected_secs: u32,
    reason: Option<EndReason>,
    rating: Option<u8>,
}

impl<I> Session<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create an idle session.
    ///
    /// Never fails: an unknown mood id resolves to the registry's default
    /// signal.
    pub fn new(config: SessionConfig, registry: &MoodRegistry) -> Self {
        let mood = registry.resolve_or_default(&config.mood_id);
        Self {
            config,
            mood,
            state: SessionState::Idle,
            matched: None,
            clock: None,
            transcript: Transcript::new(),
            pending: HashMap::new(),
            next_request: 0,
            started_at: None,
            connected_at: None,
            connected_secs: 0,
            reason: None,
            rating: None,
        }
    }

    /// Begin matchmaking.
    ///
    /// Transitions to `Searching` and returns `FindMatch`.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidState` if not `Idle`
    pub fn start(&mut self, now: I) -> Result<Vec<SessionAction>, SessionError> {
        if self.state != SessionState::Idle {
            return Err(self.invalid("start"));
        }
        self.started_at = Some(now);
        tracing::info!(kind = %self.config.kind, mood = self.mood.id, "session searching");

        let mut actions = vec![self.transition(SessionState::Searching)];
        actions.push(SessionAction::FindMatch { mood: self.mood, kind: self.config.kind });
        Ok(actions)
    }

    /// Process a deferred event.
    ///
    /// Events that no longer apply (a match after exit, a reply after
    /// teardown) are discarded and produce no actions.
    pub fn handle<E: Environment>(
        &mut self,
        event: SessionEvent,
        env: &E,
        now: I,
    ) -> Vec<SessionAction> {
        match event {
            SessionEvent::Tick => self.tick(now),
            SessionEvent::MatchResolved(result) => self.on_match(result, now),
            SessionEvent::ContentReady { request_id, outcome } => {
                self.on_content(request_id, outcome, now)
            },
            SessionEvent::TimerFired(Timer::Chatter) => self.on_chatter(env, now),
            SessionEvent::TimerFired(Timer::Reply(request_id)) => {
                self.on_scripted_reply(request_id, now)
            },
        }
    }

    /// Send a message as the local user.
    ///
    /// In 1:1 and helping-hand sessions exactly one peer reply is scheduled
    /// after a randomized thinking delay.
    ///
    /// # Errors
    ///
    /// - `SessionError::EmptyMessage` if `text` is blank
    /// - `SessionError::Closed` if the session has ended
    /// - `SessionError::InvalidState` if not `Connected`
    pub fn send_user_message<E: Environment>(
        &mut self,
        text: &str,
        env: &E,
        now: I,
    ) -> Result<Vec<SessionAction>, SessionError> {
        match self.state {
            SessionState::Connected => {},
            SessionState::Ended => return Err(SessionError::Closed),
            SessionState::Idle | SessionState::Searching | SessionState::Feedback => {
                return Err(self.invalid("send_user_message"));
            },
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let mut actions = Vec::new();
        actions.extend(self.append(SenderRole::User, None, text.to_string(), now));

        let replies = &self.config.replies;
        let delay = env.random_duration_between(replies.thinking_delay_min, replies.thinking_delay_max);

        match self.config.kind {
            SessionKind::Group => {},
            SessionKind::OneOnOne => {
                let request_id = self.next_request_id();
                let request = ContentRequest::reply(self.mood, text);
                self.pending.insert(request_id, PendingReply::Generated(request.clone()));
                actions.push(SessionAction::Generate { request_id, request, delay });
            },
            SessionKind::HelpingHand(role) => {
                let table = helping_hand_replies(role);
                let line = table[env.random_below(table.len())];
                let request_id = self.next_request_id();
                self.pending.insert(request_id, PendingReply::Scripted(line));
                actions.push(SessionAction::Schedule { timer: Timer::Reply(request_id), delay });
            },
        }

        Ok(actions)
    }

    /// Leave the session.
    ///
    /// Cancels the clock synchronously. Helping-hand sessions move to
    /// `Feedback`; everything else ends. Calling this again, or from
    /// `Feedback`/`Ended`, is a no-op.
    pub fn exit(&mut self, now: I) -> Vec<SessionAction> {
        match self.state {
            SessionState::Idle => {
                self.finish_conversation(EndReason::UserExit, now);
                self.end()
            },
            SessionState::Searching => {
                self.finish_conversation(EndReason::AbandonedWhileSearching, now);
                self.end()
            },
            SessionState::Connected => {
                self.finish_conversation(EndReason::UserExit, now);
                match self.config.kind {
                    SessionKind::HelpingHand(_) => vec![self.transition(SessionState::Feedback)],
                    SessionKind::Group | SessionKind::OneOnOne => self.end(),
                }
            },
            SessionState::Feedback | SessionState::Ended => Vec::new(),
        }
    }

    /// Close the feedback step of a helping-hand session.
    ///
    /// Ratings are recorded for venters only; a listener's rating is ignored.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidRating` if `rating` is outside 1..=5
    /// - `SessionError::Closed` if the session has ended
    /// - `SessionError::InvalidState` if not in `Feedback`
    pub fn submit_feedback(
        &mut self,
        rating: Option<u8>,
        now: I,
    ) -> Result<Vec<SessionAction>, SessionError> {
        match self.state {
            SessionState::Feedback => {},
            SessionState::Ended => return Err(SessionError::Closed),
            SessionState::Idle | SessionState::Searching | SessionState::Connected => {
                return Err(self.invalid("submit_feedback"));
            },
        }
        if let Some(r) = rating {
            if !(1..=5).contains(&r) {
                return Err(SessionError::InvalidRating(r));
            }
        }

        self.rating = match self.config.kind.role() {
            Some(HelperRole::Vent) => rating,
            _ => {
                if rating.is_some() {
                    tracing::debug!("ignoring rating from listener");
                }
                None
            },
        };
        Ok(self.end())
    }

    fn tick(&mut self, now: I) -> Vec<SessionAction> {
        if self.state != SessionState::Connected {
            return Vec::new();
        }
        let Some(clock) = self.clock.as_mut() else {
            return Vec::new();
        };

        let mut actions = Vec::new();
        let mut expired = false;
        for event in clock.poll(now) {
            match event {
                ClockEvent::Tick { remaining } => {
                    actions.push(SessionAction::RemainingChanged { remaining });
                },
                ClockEvent::Expired => expired = true,
            }
        }

        if expired {
            tracing::debug!(kind = %self.config.kind, "session clock expired");
            actions.extend(self.announce(time_up_notice(self.config.kind), now));
            self.finish_conversation(EndReason::Expired, now);
            match self.config.kind {
                SessionKind::HelpingHand(_) => actions.push(self.transition(SessionState::Feedback)),
                SessionKind::Group | SessionKind::OneOnOne => actions.extend(self.end()),
            }
        }
        actions
    }

    fn on_match(&mut self, result: MatchResult, now: I) -> Vec<SessionAction> {
        if self.state != SessionState::Searching {
            tracing::debug!(state = ?self.state, "discarding stale match after teardown");
            return Vec::new();
        }

        let mut actions = vec![self.transition(SessionState::Connected)];
        self.connected_at = Some(now);

        let announcement = connection_notice(self.config.kind, &self.mood, &result);
        self.matched = Some(result);
        actions.extend(self.announce(announcement, now));

        if let Some(duration) = self.config.duration {
            let mut clock = SessionClock::new(duration);
            // Fresh clock; start cannot fail
            if clock.start(now).is_ok() {
                actions.push(SessionAction::RemainingChanged { remaining: clock.remaining() });
                self.clock = Some(clock);
            }
        }

        match self.config.kind {
            SessionKind::Group => {
                let request_id = self.next_request_id();
                let request = ContentRequest::new(ContentKind::Icebreaker, self.mood);
                self.pending.insert(request_id, PendingReply::Generated(request.clone()));
                actions.push(SessionAction::Generate { request_id, request, delay: Duration::ZERO });
                actions.push(SessionAction::Schedule {
                    timer: Timer::Chatter,
                    delay: self.config.matching.chatter_interval,
                });
            },
            SessionKind::OneOnOne => {
                let request_id = self.next_request_id();
                let request = ContentRequest::new(ContentKind::Greeting, self.mood);
                self.pending.insert(request_id, PendingReply::Generated(request.clone()));
                actions.push(SessionAction::Generate {
                    request_id,
                    request,
                    delay: self.config.replies.greeting_delay,
                });
            },
            SessionKind::HelpingHand(_) => {},
        }

        tracing::info!(kind = %self.config.kind, peers = self.peer_count(), "session connected");
        actions
    }

    fn on_content(
        &mut self,
        request_id: RequestId,
        outcome: Result<String, ContentError>,
        now: I,
    ) -> Vec<SessionAction> {
        if self.state != SessionState::Connected {
            tracing::debug!(%request_id, state = ?self.state, "discarding stale content after teardown");
            return Vec::new();
        }
        let Some(PendingReply::Generated(request)) = self.pending.remove(&request_id) else {
            tracing::debug!(%request_id, "discarding content for unknown request");
            return Vec::new();
        };

        let text = resolve_text(&request, outcome);
        let author = match request.kind {
            ContentKind::Icebreaker => None,
            _ => self.peer().cloned(),
        };
        self.append(SenderRole::Peer, author, text, now).into_iter().collect()
    }

    fn on_scripted_reply(&mut self, request_id: RequestId, now: I) -> Vec<SessionAction> {
        if self.state != SessionState::Connected {
            tracing::debug!(%request_id, state = ?self.state, "discarding stale reply after teardown");
            return Vec::new();
        }
        let Some(PendingReply::Scripted(line)) = self.pending.remove(&request_id) else {
            tracing::debug!(%request_id, "discarding reply for unknown request");
            return Vec::new();
        };
        let author = self.peer().cloned();
        self.append(SenderRole::Peer, author, line.to_string(), now).into_iter().collect()
    }

    fn on_chatter<E: Environment>(&mut self, env: &E, now: I) -> Vec<SessionAction> {
        if self.state != SessionState::Connected {
            tracing::debug!(state = ?self.state, "discarding stale chatter after teardown");
            return Vec::new();
        }
        let Some(MatchResult::Group { roster, .. }) = &self.matched else {
            return Vec::new();
        };

        let line = roll_chatter(env, &self.config.matching, roster)
            .map(|(peer, line)| (peer.clone(), line));

        let mut actions = Vec::new();
        if let Some((peer, line)) = line {
            actions.extend(self.append(SenderRole::Peer, Some(peer), line.to_string(), now));
        }
        actions.push(SessionAction::Schedule {
            timer: Timer::Chatter,
            delay: self.config.matching.chatter_interval,
        });
        actions
    }

    /// Stop the conversation: cancel the clock, drop pending replies, and
    /// seal the transcript.
    fn finish_conversation(&mut self, reason: EndReason, now: I) {
        if let Some(clock) = self.clock.as_mut() {
            clock.cancel();
        }
        self.pending.clear();
        self.transcript.seal();
        self.reason = Some(reason);
        self.connected_secs = self
            .connected_at
            .map(|at| if now > at { (now - at).as_secs() } else { 0 })
            .map_or(0, |secs| u32::try_from(secs).unwrap_or(u32::MAX));
    }

    fn end(&mut self) -> Vec<SessionAction> {
        let from = self.state;
        let transition = self.transition(SessionState::Ended);
        let summary = SessionSummary {
            kind: self.config.kind,
            mood_id: self.mood.id,
            connected_secs: self.connected_secs,
            message_count: self.transcript.len(),
            rating: self.rating,
            reason: self.reason.unwrap_or(EndReason::UserExit),
        };
        tracing::info!(?from, reason = ?summary.reason, secs = summary.connected_secs, "session ended");
        vec![transition, SessionAction::Completed(summary)]
    }

    fn transition(&mut self, to: SessionState) -> SessionAction {
        let from = self.state;
        self.state = to;
        tracing::debug!(?from, ?to, "session transition");
        SessionAction::StateChanged { from, to }
    }

    fn append(
        &mut self,
        sender: SenderRole,
        author: Option<Peer>,
        text: String,
        now: I,
    ) -> Option<SessionAction> {
        let at = self.elapsed(now);
        let stored = match author {
            Some(peer) => self.transcript.append_from(peer, text, at),
            None => self.transcript.append(sender, text, at),
        };
        appended(stored)
    }

    /// Append a SYSTEM announcement.
    fn announce(&mut self, text: String, now: I) -> Option<SessionAction> {
        let at = self.elapsed(now);
        appended(self.transcript.append_system(text, at))
    }

    fn elapsed(&self, now: I) -> Duration {
        match self.started_at {
            Some(at) if now > at => now - at,
            _ => Duration::ZERO,
        }
    }

    fn next_request_id(&mut self) -> RequestId {
        let id = RequestId(self.next_request);
        self.next_request += 1;
        id
    }

    fn invalid(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidState { state: self.state, operation }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Session shape.
    pub fn kind(&self) -> SessionKind {
        self.config.kind
    }

    /// Configuration this session was built from.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Resolved mood signal.
    pub fn mood(&self) -> &MoodSignal {
        &self.mood
    }

    /// Whole seconds left. `None` for sessions without a clock or before the
    /// clock starts.
    pub fn remaining_seconds(&self) -> Option<u32> {
        self.clock.as_ref().map(SessionClock::remaining)
    }

    /// Message log.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// 1:1 partner. `None` for group sessions and before a match.
    pub fn peer(&self) -> Option<&Peer> {
        match &self.matched {
            Some(MatchResult::Single(peer)) => Some(peer),
            _ => None,
        }
    }

    /// Group identities. Empty for 1:1 sessions and before a match.
    pub fn roster(&self) -> &[Peer] {
        match &self.matched {
            Some(MatchResult::Group { roster, .. }) => roster,
            _ => &[],
        }
    }

    /// Number of peers connected. Zero before a match.
    pub fn peer_count(&self) -> u32 {
        self.matched.as_ref().map_or(0, MatchResult::peer_count)
    }

    /// `true` while a peer reply (or opening line) is outstanding.
    pub fn is_peer_typing(&self) -> bool {
        self.state == SessionState::Connected && !self.pending.is_empty()
    }

    /// Number of outstanding replies.
    pub fn pending_replies(&self) -> usize {
        self.pending.len()
    }

    /// `true` while the clock is counting down.
    pub fn clock_running(&self) -> bool {
        self.clock.as_ref().is_some_and(SessionClock::is_running)
    }

    /// Recorded helping-hand rating.
    pub fn rating(&self) -> Option<u8> {
        self.rating
    }

    /// Why the conversation ended. `None` while it is still going.
    pub fn end_reason(&self) -> Option<EndReason> {
        self.reason
    }
}

fn appended(stored: Result<&Message, TranscriptError>) -> Option<SessionAction> {
    match stored {
        Ok(message) => Some(SessionAction::MessageAppended(message.clone())),
        Err(err) => {
            tracing::debug!(%err, "dropping append to closed transcript");
            None
        },
    }
}

fn connection_notice(kind: SessionKind, mood: &MoodSignal, result: &MatchResult) -> String {
    match kind {
        SessionKind::Group => format!(
            "You are connected with {} peers feeling \"{}\".",
            result.peer_count(),
            mood.label
        ),
        SessionKind::OneOnOne => format!(
            "You are connected with someone else feeling \"{}\". This chat is private and \
             disappears when you leave.",
            mood.label
        ),
        SessionKind::HelpingHand(HelperRole::Vent) => {
            "Session started. Go ahead, let it out. This is a safe space.".to_string()
        },
        SessionKind::HelpingHand(HelperRole::Listen) => {
            "Session started. Waiting for them to share...".to_string()
        },
    }
}

fn time_up_notice(kind: SessionKind) -> String {
    match kind {
        SessionKind::Group => "Time's up. This pulse room has closed.".to_string(),
        SessionKind::OneOnOne | SessionKind::HelpingHand(_) => {
            "Time's up. This session has ended.".to_string()
        },
    }
}

/// Prompt shown at the feedback step.
pub fn feedback_prompt(role: HelperRole) -> &'static str {
    match role {
        HelperRole::Vent => "Did your listener help you feel heard?",
        HelperRole::Listen => "Thank you for lending an ear.",
    }
}
