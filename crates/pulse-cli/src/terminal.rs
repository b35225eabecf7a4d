//! Line-oriented terminal driver.
//!
//! Implements the [`Driver`] trait over a line reader and a writer. Input is
//! read on a detached OS thread that forwards parsed [`UserCommand`]s through
//! a channel, so `poll_command` is a plain cancel-safe `recv`. A blocking
//! stdin read cannot be cancelled; keeping it off the tokio blocking pool
//! lets the process exit while the reader is still parked on input.
//! Rendering writes one line per displayable action.

use std::{
    io::{self, BufRead, Stdout, Write},
    thread,
};

use pulse_app::{Driver, UserCommand};
use pulse_core::{Session, SessionAction, SessionError};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::render;

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Terminal driver implementing the [`Driver`] trait.
pub struct TerminalDriver<W: Write + Send = Stdout> {
    commands: mpsc::Receiver<UserCommand>,
    out: W,
}

impl TerminalDriver<Stdout> {
    /// Create a driver reading stdin and writing stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the input thread cannot be spawned.
    pub fn stdio() -> Result<Self, TerminalError> {
        Self::from_reader(io::BufReader::new(io::stdin()), io::stdout())
    }
}

impl<W: Write + Send> TerminalDriver<W> {
    /// Create a driver reading commands from `input` on a detached thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the input thread cannot be spawned.
    pub fn from_reader<R>(input: R, out: W) -> Result<Self, TerminalError>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(16);
        // Never joined: the thread ends with the process or on the next
        // line after the driver is gone
        thread::Builder::new()
            .name("pulse-input".into())
            .spawn(move || read_commands(input, &tx))?;
        Ok(Self::with_io(rx, out))
    }

    /// Create a driver over an existing command channel and writer.
    pub fn with_io(commands: mpsc::Receiver<UserCommand>, out: W) -> Self {
        Self { commands, out }
    }

    /// Write one line and flush.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn line(&mut self, text: &str) -> Result<(), TerminalError> {
        writeln!(self.out, "{text}")?;
        self.out.flush()?;
        Ok(())
    }

    /// Consume the driver, returning the writer.
    pub fn into_inner(mut self) -> W {
        self.stop();
        self.out
    }
}

fn read_commands<R: BufRead>(input: R, tx: &mpsc::Sender<UserCommand>) {
    for line in input.lines() {
        match line {
            Ok(line) => {
                let Some(command) = UserCommand::parse(&line) else { continue };
                if tx.blocking_send(command).is_err() {
                    // Runtime is gone
                    return;
                }
            },
            Err(err) => {
                tracing::warn!(%err, "input read failed, closing input");
                return;
            },
        }
    }
}

impl<W: Write + Send> Driver for TerminalDriver<W> {
    type Error = TerminalError;
    type Instant = tokio::time::Instant;

    async fn poll_command(&mut self) -> Result<Option<UserCommand>, Self::Error> {
        Ok(self.commands.recv().await)
    }

    fn render(
        &mut self,
        session: &Session<Self::Instant>,
        action: &SessionAction,
    ) -> Result<(), Self::Error> {
        match render::action_line(session, action) {
            Some(line) => self.line(&line),
            None => Ok(()),
        }
    }

    fn reject(&mut self, command: &UserCommand, error: &SessionError) -> Result<(), Self::Error> {
        self.line(&render::reject_line(command, error))
    }

    fn stop(&mut self) {
        self.commands.close();
        let _ = self.out.flush();
    }
}
