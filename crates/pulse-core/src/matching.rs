//! Matching simulator.
//!
//! Stands in for a real matchmaking broker. Discovery is simulated with a
//! randomized delay; the result is synthesized from the avatar palette. The
//! [`Matchmaker`] trait is the seam a real queue/broker would plug into: the
//! session state machine only ever sees a [`MatchResult`] arriving as an
//! event.
//!
//! The simulator also owns the group "chatter" model: once a pulse room is
//! connected it offers a chatter opportunity every
//! [`MatchingConfig::chatter_interval`], and each opportunity produces a
//! canned line with probability [`MatchingConfig::chatter_probability`].
//! Chatter never touches the content provider, so a room cannot go silent
//! for lack of network.

use std::time::Duration;

use async_trait::async_trait;

use crate::{
    config::{HelperRole, SessionKind},
    env::Environment,
    mood::MoodSignal,
    peer::{ANONYMOUS, ANONYMOUS_LISTENER, ANONYMOUS_PEER, Peer},
};

/// Lower bound of the simulated discovery delay.
pub const DEFAULT_DISCOVERY_DELAY_MIN: Duration = Duration::from_secs(2);

/// Upper bound of the simulated discovery delay.
pub const DEFAULT_DISCOVERY_DELAY_MAX: Duration = Duration::from_secs(3);

/// Smallest simulated pulse room.
pub const DEFAULT_GROUP_SIZE_MIN: u32 = 3;

/// Largest simulated pulse room.
pub const DEFAULT_GROUP_SIZE_MAX: u32 = 6;

/// Spacing between group chatter opportunities.
pub const DEFAULT_CHATTER_INTERVAL: Duration = Duration::from_secs(5);

/// Chance that a chatter opportunity produces a message.
pub const DEFAULT_CHATTER_PROBABILITY: f64 = 0.3;

/// Canned group chatter.
pub const CHATTER_PHRASES: [&str; 6] = [
    "Yeah, same here.",
    "Library is packed.",
    "Just need to finish this.",
    "Coffee?",
    "We got this.",
    "Glad it's not just me.",
];

/// Matcher pacing and group shape.
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Minimum discovery delay
    pub discovery_delay_min: Duration,
    /// Maximum discovery delay
    pub discovery_delay_max: Duration,
    /// Minimum simulated group size
    pub group_size_min: u32,
    /// Maximum simulated group size
    pub group_size_max: u32,
    /// Spacing between chatter opportunities
    pub chatter_interval: Duration,
    /// Probability in `[0, 1]` that an opportunity yields a message
    pub chatter_probability: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            discovery_delay_min: DEFAULT_DISCOVERY_DELAY_MIN,
            discovery_delay_max: DEFAULT_DISCOVERY_DELAY_MAX,
            group_size_min: DEFAULT_GROUP_SIZE_MIN,
            group_size_max: DEFAULT_GROUP_SIZE_MAX,
            chatter_interval: DEFAULT_CHATTER_INTERVAL,
            chatter_probability: DEFAULT_CHATTER_PROBABILITY,
        }
    }
}

/// Outcome of matchmaking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// Exactly one partner (1:1 and helping-hand)
    Single(Peer),
    /// A pulse room
    Group {
        /// Number of peers in the room
        peer_count: u32,
        /// Identities used to attribute chatter; one per peer
        roster: Vec<Peer>,
    },
}

impl MatchResult {
    /// Number of peers this result connects the user with.
    pub fn peer_count(&self) -> u32 {
        match self {
            Self::Single(_) => 1,
            Self::Group { peer_count, .. } => *peer_count,
        }
    }
}

/// Anything that can find peers for a mood signal.
///
/// Implementations must always resolve; matchmaking has no failure path.
#[async_trait]
pub trait Matchmaker: Send + Sync {
    /// Find a partner or room for the given signal and session shape.
    async fn find_match(&self, mood: MoodSignal, kind: SessionKind) -> MatchResult;
}

/// Simulated matcher backed by an [`Environment`].
#[derive(Debug, Clone)]
pub struct MatchSimulator<E: Environment> {
    env: E,
    config: MatchingConfig,
}

impl<E: Environment> MatchSimulator<E> {
    /// Create a simulator.
    pub fn new(env: E, config: MatchingConfig) -> Self {
        Self { env, config }
    }

    /// Pacing in use.
    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Draw a discovery delay.
    pub fn discovery_delay(&self) -> Duration {
        discovery_delay(&self.env, &self.config)
    }

    /// Synthesize a match immediately (no delay).
    pub fn resolve(&self, kind: SessionKind) -> MatchResult {
        resolve_match(&self.env, &self.config, kind)
    }
}

#[async_trait]
impl<E: Environment> Matchmaker for MatchSimulator<E> {
    async fn find_match(&self, mood: MoodSignal, kind: SessionKind) -> MatchResult {
        let delay = self.discovery_delay();
        tracing::debug!(mood = mood.id, %kind, ?delay, "simulating peer discovery");
        self.env.sleep(delay).await;
        self.resolve(kind)
    }
}

/// Draw a discovery delay within the configured bounds.
pub fn discovery_delay<E: Environment>(env: &E, config: &MatchingConfig) -> Duration {
    env.random_duration_between(config.discovery_delay_min, config.discovery_delay_max)
}

/// Synthesize a match result for the session shape.
pub fn resolve_match<E: Environment>(
    env: &E,
    config: &MatchingConfig,
    kind: SessionKind,
) -> MatchResult {
    match kind {
        SessionKind::Group => {
            let (lo, hi) = if config.group_size_min <= config.group_size_max {
                (config.group_size_min, config.group_size_max)
            } else {
                (config.group_size_max, config.group_size_min)
            };
            let lo = lo.max(1);
            let hi = hi.max(lo);
            let peer_count = lo + env.random_below((hi - lo + 1) as usize) as u32;
            let roster = (0..peer_count).map(|_| Peer::synthesize(env, ANONYMOUS)).collect();
            MatchResult::Group { peer_count, roster }
        },
        SessionKind::OneOnOne | SessionKind::HelpingHand(HelperRole::Listen) => {
            MatchResult::Single(Peer::synthesize(env, ANONYMOUS_PEER))
        },
        SessionKind::HelpingHand(HelperRole::Vent) => {
            MatchResult::Single(Peer::synthesize(env, ANONYMOUS_LISTENER))
        },
    }
}

/// Roll one chatter opportunity.
///
/// Returns the speaking peer and line, or `None` if the room stays quiet this
/// time. An empty roster never speaks.
pub fn roll_chatter<'a, E: Environment>(
    env: &E,
    config: &MatchingConfig,
    roster: &'a [Peer],
) -> Option<(&'a Peer, &'static str)> {
    if roster.is_empty() || !env.random_chance(config.chatter_probability) {
        return None;
    }
    let peer = &roster[env.random_below(roster.len())];
    let line = CHATTER_PHRASES[env.random_below(CHATTER_PHRASES.len())];
    Some((peer, line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestEnv;

    #[test]
    fn discovery_delay_stays_in_window() {
        let env = TestEnv::new(42);
        let config = MatchingConfig::default();
        for _ in 0..200 {
            let delay = discovery_delay(&env, &config);
            assert!(delay >= DEFAULT_DISCOVERY_DELAY_MIN, "{delay:?}");
            assert!(delay <= DEFAULT_DISCOVERY_DELAY_MAX, "{delay:?}");
        }
    }

    #[test]
    fn group_size_within_bounds() {
        let env = TestEnv::new(8);
        let config = MatchingConfig::default();
        for _ in 0..200 {
            let MatchResult::Group { peer_count, roster } =
                resolve_match(&env, &config, SessionKind::Group)
            else {
                panic!("group kind must resolve to a room");
            };
            assert!((DEFAULT_GROUP_SIZE_MIN..=DEFAULT_GROUP_SIZE_MAX).contains(&peer_count));
            assert_eq!(roster.len() as u32, peer_count);
            assert!(roster.iter().all(|p| p.display_label == ANONYMOUS));
        }
    }

    #[test]
    fn single_partner_labels_follow_role() {
        let env = TestEnv::new(8);
        let config = MatchingConfig::default();

        let vent = resolve_match(&env, &config, SessionKind::HelpingHand(HelperRole::Vent));
        let listen = resolve_match(&env, &config, SessionKind::HelpingHand(HelperRole::Listen));
        let one = resolve_match(&env, &config, SessionKind::OneOnOne);

        assert!(matches!(vent, MatchResult::Single(ref p) if p.display_label == ANONYMOUS_LISTENER));
        assert!(matches!(listen, MatchResult::Single(ref p) if p.display_label == ANONYMOUS_PEER));
        assert_eq!(one.peer_count(), 1);
    }

    #[test]
    fn chatter_respects_probability_edges() {
        let env = TestEnv::new(3);
        let roster = vec![Peer::synthesize(&env, ANONYMOUS)];

        let silent = MatchingConfig { chatter_probability: 0.0, ..MatchingConfig::default() };
        let loud = MatchingConfig { chatter_probability: 1.0, ..MatchingConfig::default() };
        for _ in 0..50 {
            assert!(roll_chatter(&env, &silent, &roster).is_none());
            let (peer, line) = roll_chatter(&env, &loud, &roster).unwrap();
            assert_eq!(peer, &roster[0]);
            assert!(CHATTER_PHRASES.contains(&line));
        }
        assert!(roll_chatter(&env, &loud, &[]).is_none());
    }

    #[test]
    fn simulator_resolves_after_sleeping() {
        let env = TestEnv::new(5);
        let sim = MatchSimulator::new(env.clone(), MatchingConfig::default());
        let mood = crate::mood::MoodRegistry::campus().default_signal();

        let result = block_on_ready(sim.find_match(mood, SessionKind::OneOnOne));
        assert_eq!(result.peer_count(), 1);
    }

    // TestEnv::sleep is ready immediately, so a single poll completes.
    fn block_on_ready<F: std::future::Future>(fut: F) -> F::Output {
        use std::task::{Context, Poll, Waker};
        let mut fut = std::pin::pin!(fut);
        let mut cx = Context::from_waker(Waker::noop());
        match fut.as_mut().poll(&mut cx) {
            Poll::Ready(out) => out,
            Poll::Pending => panic!("test future was not immediately ready"),
        }
    }
}
