//! Driver trait for abstracting frontend I/O.
//!
//! The [`Driver`] trait decouples the session runtime from a specific
//! frontend. Each frontend implements it to read user commands and present
//! session changes, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::{future::Future, ops::Sub, time::Duration};

use pulse_core::{Session, SessionAction, SessionError};

use crate::UserCommand;

/// Abstracts frontend I/O for the session runtime.
///
/// # Implementations
///
/// - **CLI**: stdin lines in, formatted lines on stdout
/// - **Simulation**: scripted commands in, captured actions out
pub trait Driver: Send {
    /// Frontend-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in simulation.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Wait for the next user command.
    ///
    /// Returns `None` once the input is closed; the runtime treats that as
    /// the user leaving. Must be cancel-safe: the runtime races it against
    /// session events.
    fn poll_command(
        &mut self,
    ) -> impl Future<Output = Result<Option<UserCommand>, Self::Error>> + Send;

    /// Present one session action.
    ///
    /// Called for every action the session produces, after the runtime has
    /// applied it, so `session` already reflects the change.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    fn render(
        &mut self,
        session: &Session<Self::Instant>,
        action: &SessionAction,
    ) -> Result<(), Self::Error>;

    /// Tell the user a command was rejected. The session is unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    fn reject(&mut self, command: &UserCommand, error: &SessionError) -> Result<(), Self::Error>;

    /// Release frontend resources.
    fn stop(&mut self);
}
