//! Progress reporting from the pipeline worker
//!
//! The worker never talks to the front end directly. It pushes
//! `ProgressEvent`s into an ordered channel and the front end drains them.

use std::sync::mpsc::Sender;

use tracing::info;

/// Events emitted by a running pipeline, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A human-readable log line
    Log(String),
    /// Work of unknown length has started (scanning, selecting)
    BeginIndeterminate,
    /// The run now has a known number of steps
    SetupDeterminate(usize),
    /// Advance by this many steps
    Step(usize),
    /// The run is over, successfully or not
    Finished,
}

/// Sending half used by the worker
///
/// A dropped receiver is not an error: events are discarded and the run
/// carries on.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    sender: Option<Sender<ProgressEvent>>,
}

impl ProgressReporter {
    pub fn new(sender: Sender<ProgressEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// A reporter that only writes to the tracing log
    pub fn silent() -> Self {
        Self::default()
    }

    fn send(&self, event: ProgressEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }

    /// Emit a log line
    pub fn log(&self, message: &str) {
        info!(target: "nfe_backup::run", "{}", message);
        self.send(ProgressEvent::Log(message.to_string()));
    }

    pub fn begin_indeterminate(&self) {
        self.send(ProgressEvent::BeginIndeterminate);
    }

    pub fn setup_determinate(&self, total_steps: usize) {
        self.send(ProgressEvent::SetupDeterminate(total_steps));
    }

    pub fn step(&self) {
        self.send(ProgressEvent::Step(1));
    }

    pub fn finished(&self) {
        self.send(ProgressEvent::Finished);
    }
}
