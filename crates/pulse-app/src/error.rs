//! Runtime errors.

use pulse_core::SessionError;
use thiserror::Error;

/// Errors that stop a [`crate::Runtime`].
///
/// Rejected user commands are not in this list: they are reported to the
/// driver and the session continues.
#[derive(Error, Debug)]
pub enum RuntimeError<E> {
    /// The driver failed to read input or render output
    #[error("driver error: {0}")]
    Driver(#[source] E),

    /// The session refused to start
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}
