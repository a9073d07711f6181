//! File-processing session as an explicit state machine.
//!
//! Each input walks `Idle → FileSelected → Processed | Error → Idle`. A
//! failure is recorded and the session moves on to the next file.

use std::path::{Path, PathBuf};

use crate::CliResult;

/// Where the session is in handling one file.
#[derive(Debug, Clone, PartialEq)]
pub enum State {
    Idle,
    FileSelected(PathBuf),
    Processed { input: PathBuf, output: PathBuf },
    Error { input: PathBuf, message: String },
}

/// Inputs that drive [`State`] transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Select(PathBuf),
    Succeeded(PathBuf),
    Failed(String),
    Acknowledge,
}

impl State {
    /// Apply one event. Events that make no sense in the current state are
    /// ignored and the state is returned unchanged.
    pub fn on(self, event: Event) -> State {
        match (self, event) {
            (State::Idle, Event::Select(path)) => State::FileSelected(path),
            (State::FileSelected(input), Event::Succeeded(output)) => {
                State::Processed { input, output }
            }
            (State::FileSelected(input), Event::Failed(message)) => State::Error { input, message },
            (State::Processed { .. } | State::Error { .. }, Event::Acknowledge) => State::Idle,
            (state, event) => {
                tracing::warn!("ignoring {:?} in state {:?}", event, state);
                state
            }
        }
    }
}

/// Runs files one at a time and keeps the tally.
#[derive(Debug)]
pub struct Session {
    state: State,
    succeeded: Vec<(PathBuf, PathBuf)>,
    failed: Vec<(PathBuf, String)>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    fn step(&mut self, event: Event) {
        let state = std::mem::replace(&mut self.state, State::Idle);
        self.state = state.on(event);
    }

    /// Select `path`, run `process` on it and return to `Idle`.
    ///
    /// `process` returns the path of the written output.
    pub fn process_file<F>(&mut self, path: &Path, process: F)
    where
        F: FnOnce(&Path) -> CliResult<PathBuf>,
    {
        self.step(Event::Select(path.to_path_buf()));

        let event = if !path.exists() {
            Event::Failed(format!("file not found: {}", path.display()))
        } else {
            match process(path) {
                Ok(output) => Event::Succeeded(output),
                Err(e) => Event::Failed(e.to_string()),
            }
        };
        self.step(event);

        match &self.state {
            State::Processed { input, output } => {
                tracing::info!("{} -> {}", input.display(), output.display());
                self.succeeded.push((input.clone(), output.clone()));
            }
            State::Error { input, message } => {
                tracing::error!("Error processing {}: {}", input.display(), message);
                self.failed.push((input.clone(), message.clone()));
            }
            other => tracing::warn!("unexpected session state {:?}", other),
        }
        self.step(Event::Acknowledge);
    }

    /// (input, output) pairs written so far.
    pub fn succeeded(&self) -> &[(PathBuf, PathBuf)] {
        &self.succeeded
    }

    /// (input, message) pairs that failed.
    pub fn failures(&self) -> &[(PathBuf, String)] {
        &self.failed
    }

    /// Number of processed files, or an error if any of them failed.
    pub fn finish(self) -> CliResult<usize> {
        if self.failed.is_empty() {
            Ok(self.succeeded.len())
        } else {
            Err(format!(
                "{} of {} files failed",
                self.failed.len(),
                self.failed.len() + self.succeeded.len()
            )
            .into())
        }
    }
}
