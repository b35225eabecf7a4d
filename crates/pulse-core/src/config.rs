//! Session configuration and state vocabulary.

use std::{fmt, num::NonZeroU32, time::Duration};

use serde::Serialize;

use crate::matching::MatchingConfig;

/// Group pulse rooms run for five minutes.
pub const GROUP_DURATION_SECS: u32 = 300;

/// Helping-hand sessions run for ten minutes regardless of role.
pub const HELPING_HAND_DURATION_SECS: u32 = 600;

/// Lower bound of the randomized peer "thinking" delay before a reply.
pub const DEFAULT_THINKING_DELAY_MIN: Duration = Duration::from_millis(1500);

/// Upper bound of the randomized peer "thinking" delay before a reply.
pub const DEFAULT_THINKING_DELAY_MAX: Duration = Duration::from_millis(3500);

/// Typing pause before a 1:1 peer's greeting is requested.
pub const DEFAULT_GREETING_DELAY: Duration = Duration::from_millis(1500);

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SessionState {
    /// Created, not started
    Idle,
    /// Waiting for the matcher to produce a peer
    Searching,
    /// Peer(s) present, messages flowing
    Connected,
    /// Helping-hand only: conversation over, collecting an optional rating
    Feedback,
    /// Terminal
    Ended,
}

impl SessionState {
    /// `true` for [`SessionState::Ended`].
    pub fn is_terminal(self) -> bool {
        self == Self::Ended
    }
}

/// Side a student takes in a helping-hand session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HelperRole {
    /// Wants to be heard
    Vent,
    /// Offers to listen
    Listen,
}

/// Shape of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SessionKind {
    /// Timed group pulse room with background chatter
    Group,
    /// Open-ended 1:1 chat with a generated peer
    OneOnOne,
    /// Timed 1:1 vent/listen session with a feedback step
    HelpingHand(HelperRole),
}

impl SessionKind {
    /// Default lifetime for this kind. `None` means no clock.
    pub fn default_duration(self) -> Option<NonZeroU32> {
        match self {
            Self::Group => NonZeroU32::new(GROUP_DURATION_SECS),
            Self::OneOnOne => None,
            Self::HelpingHand(_) => NonZeroU32::new(HELPING_HAND_DURATION_SECS),
        }
    }

    /// Helping-hand role, if any.
    pub fn role(self) -> Option<HelperRole> {
        match self {
            Self::HelpingHand(role) => Some(role),
            Self::Group | Self::OneOnOne => None,
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group => write!(f, "pulse room"),
            Self::OneOnOne => write!(f, "1:1 chat"),
            Self::HelpingHand(HelperRole::Vent) => write!(f, "helping hand (vent)"),
            Self::HelpingHand(HelperRole::Listen) => write!(f, "helping hand (listen)"),
        }
    }
}

/// Peer reply pacing.
#[derive(Debug, Clone)]
pub struct ReplyConfig {
    /// Minimum thinking delay before a reply lands
    pub thinking_delay_min: Duration,
    /// Maximum thinking delay before a reply lands
    pub thinking_delay_max: Duration,
    /// Pause before the opening greeting of a 1:1 chat
    pub greeting_delay: Duration,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            thinking_delay_min: DEFAULT_THINKING_DELAY_MIN,
            thinking_delay_max: DEFAULT_THINKING_DELAY_MAX,
            greeting_delay: DEFAULT_GREETING_DELAY,
        }
    }
}

/// Everything needed to construct a session.
///
/// Immutable once the session is created.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session shape
    pub kind: SessionKind,
    /// Requested mood signal id; unknown ids fall back to the catalog default
    pub mood_id: String,
    /// Lifetime in seconds. `None` runs until the user exits.
    pub duration: Option<NonZeroU32>,
    /// Matcher and chatter pacing
    pub matching: MatchingConfig,
    /// Reply pacing
    pub replies: ReplyConfig,
}

impl SessionConfig {
    /// Config with the kind's default duration and pacing.
    pub fn new(kind: SessionKind, mood_id: impl Into<String>) -> Self {
        Self {
            kind,
            mood_id: mood_id.into(),
            duration: kind.default_duration(),
            matching: MatchingConfig::default(),
            replies: ReplyConfig::default(),
        }
    }

    /// Group pulse room.
    pub fn group(mood_id: impl Into<String>) -> Self {
        Self::new(SessionKind::Group, mood_id)
    }

    /// Open-ended 1:1 chat.
    pub fn one_on_one(mood_id: impl Into<String>) -> Self {
        Self::new(SessionKind::OneOnOne, mood_id)
    }

    /// Helping-hand session with the given role.
    pub fn helping_hand(role: HelperRole, mood_id: impl Into<String>) -> Self {
        Self::new(SessionKind::HelpingHand(role), mood_id)
    }

    /// Override the lifetime.
    #[must_use]
    pub fn with_duration(mut self, duration: Option<NonZeroU32>) -> Self {
        self.duration = duration;
        self
    }

    /// Override matcher pacing.
    #[must_use]
    pub fn with_matching(mut self, matching: MatchingConfig) -> Self {
        self.matching = matching;
        self
    }

    /// Override reply pacing.
    #[must_use]
    pub fn with_replies(mut self, replies: ReplyConfig) -> Self {
        self.replies = replies;
        self
    }
}
