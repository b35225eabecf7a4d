//! Application layer for Pulse
//!
//! Tokio runtime that drives a [`pulse_core::Session`] in real time, plus
//! the production pieces a frontend needs to plug in.
//!
//! # Components
//!
//! - [`Driver`]: Trait for frontend-specific I/O
//! - [`Runtime`]: Generic orchestration loop using Driver
//! - [`SystemEnv`]: Production environment (tokio time, OS RNG)
//! - [`GeminiProvider`]: Content provider backed by the Gemini API
//! - [`UserCommand`]: Commands a frontend feeds in

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod command;
mod config;
mod driver;
mod error;
mod gemini;
mod runtime;
mod system_env;

pub use command::UserCommand;
pub use config::{DEFAULT_CONTENT_TIMEOUT, DEFAULT_TICK_INTERVAL, RuntimeConfig};
pub use driver::Driver;
pub use error::RuntimeError;
pub use gemini::{DEFAULT_GEMINI_MODEL, GeminiProvider};
pub use runtime::{RunReport, Runtime};
pub use system_env::SystemEnv;
