//! Session rules checked after every simulated step.
//!
//! A check never looks at a live [`pulse_core::Session`]. [`SimSession`]
//! captures a [`SessionSnapshot`] (state, peers, clock, transcript shape and
//! the history the simulator recorded), and each rule judges that snapshot
//! alone. Rules that need history, such as "the countdown never goes back
//! up", read it from the snapshot rather than keeping their own.
//!
//! ```ignore
//! let sim = SimSession::new(SessionConfig::group("resetting"), 7)
//!     .with_invariants(InvariantRegistry::standard());
//! ```
//!
//! [`SimSession`]: crate::SimSession

mod checks;
mod snapshot;

use std::fmt;

pub use checks::{
    ConnectedHoldsPeer, EndedIsFrozen, RemainingMonotonic, SearchingHoldsNoPeer,
    SingleCompletion, SystemBeforeChatter,
};
pub use snapshot::{MessageSnapshot, SessionSnapshot};

/// Outcome of one rule against one snapshot.
pub type InvariantResult = Result<(), Violation>;

/// A broken session rule.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Rule that failed
    pub invariant: &'static str,
    /// What the snapshot showed
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// One rule over a [`SessionSnapshot`].
pub trait Invariant: Send + Sync {
    /// Short snake_case name, used in violation reports.
    fn name(&self) -> &'static str;

    /// Judge a snapshot. Rules that do not apply to the snapshot's state
    /// pass.
    fn check(&self, state: &SessionSnapshot) -> InvariantResult;
}

/// Set of session rules run together.
#[derive(Default)]
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl InvariantRegistry {
    /// Every lifecycle rule: peers match the state, ENDED stays frozen with
    /// one completion, the countdown only falls, and the connection notice
    /// precedes any chatter.
    pub fn standard() -> Self {
        Self::default()
            .with(SearchingHoldsNoPeer)
            .with(ConnectedHoldsPeer)
            .with(EndedIsFrozen)
            .with(SingleCompletion)
            .with(RemainingMonotonic)
            .with(SystemBeforeChatter)
    }

    /// Add a rule.
    #[must_use]
    pub fn with<I: Invariant + 'static>(mut self, invariant: I) -> Self {
        self.invariants.push(Box::new(invariant));
        self
    }

    /// Run every rule, collecting all failures.
    ///
    /// # Errors
    ///
    /// Returns each [`Violation`] found, in registration order.
    pub fn check_all(&self, state: &SessionSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|rule| rule.check(state).err()).collect();
        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Run every rule and panic with all failures, labelled by `step`.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, state: &SessionSnapshot, step: &str) {
        if let Err(violations) = self.check_all(state) {
            let lines: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("session rule broken after {step}:\n  {}", lines.join("\n  "));
        }
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// `true` when no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
