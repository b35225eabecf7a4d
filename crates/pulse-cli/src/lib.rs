//! Terminal front end for Pulse
//!
//! A line-oriented host for one session: stdin lines become
//! [`pulse_app::UserCommand`]s, session actions become lines on stdout.
//! Diagnostics go to stderr through `tracing`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod render;
pub mod terminal;

pub use terminal::{TerminalDriver, TerminalError};
