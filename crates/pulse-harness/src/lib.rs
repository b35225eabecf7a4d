//! Deterministic simulation harness for pulse session testing.
//!
//! Seeded, virtual-time implementations of the [`pulse_core::Environment`]
//! trait and of the runtime's job (executing session actions), so whole
//! sessions replay exactly from a seed without real timers.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the common
//! session invariants, and [`SimSession::with_invariants`] to check them
//! after every simulated step.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod provider;
pub mod sim_env;
pub mod sim_session;

pub use invariants::{
    ConnectedHoldsPeer, EndedIsFrozen, Invariant, InvariantRegistry, InvariantResult,
    MessageSnapshot, RemainingMonotonic, SearchingHoldsNoPeer, SessionSnapshot, SingleCompletion,
    SystemBeforeChatter, Violation,
};
pub use provider::{Script, ScriptedProvider};
pub use sim_env::SimEnv;
pub use sim_session::SimSession;
