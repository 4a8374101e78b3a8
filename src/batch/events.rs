//! Progress and log notifications from a running batch.
//!
//! The orchestrator only talks to a [`BatchObserver`]. A front-end that owns
//! its own thread hands the orchestrator an `mpsc::Sender<BatchEvent>` and
//! drains the receiver on its side; the orchestrator never touches caller
//! state directly.

use std::sync::mpsc::Sender;

use chrono::Local;

use super::result::BatchResult;

/// Receives notifications from the orchestrator.
///
/// Implementations must return quickly; they run on the orchestrator's thread.
pub trait BatchObserver {
    /// A human-readable log line.
    fn on_log(&self, message: &str);

    /// `current` of `total` candidate files have been handled.
    fn on_progress(&self, current: usize, total: usize);
}

/// Message sent across the thread boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// Timestamped log line
    Log(String),
    /// Progress after each file
    Progress {
        /// Files handled so far
        current: usize,
        /// Candidate files in the run
        total: usize,
    },
    /// Run completed
    Finished(BatchResult),
    /// Run aborted before completion
    Aborted(String),
}

impl BatchEvent {
    /// Fraction of the batch completed, for progress events.
    pub fn fraction(&self) -> Option<f32> {
        match self {
            BatchEvent::Progress { current, total } if *total > 0 => {
                Some(*current as f32 / *total as f32)
            },
            _ => None,
        }
    }
}

/// Prefix a message with the local wall-clock time, `[HH:MM:SS] message`.
pub fn timestamped(message: &str) -> String {
    format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
}

/// Events are dropped silently once the receiver has gone away.
impl BatchObserver for Sender<BatchEvent> {
    fn on_log(&self, message: &str) {
        let _ = self.send(BatchEvent::Log(timestamped(message)));
    }

    fn on_progress(&self, current: usize, total: usize) {
        let _ = self.send(BatchEvent::Progress { current, total });
    }
}

/// Ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl BatchObserver for NullObserver {
    fn on_log(&self, _message: &str) {}

    fn on_progress(&self, _current: usize, _total: usize) {}
}

impl<T: BatchObserver + ?Sized> BatchObserver for &T {
    fn on_log(&self, message: &str) {
        (**self).on_log(message)
    }

    fn on_progress(&self, current: usize, total: usize) {
        (**self).on_progress(current, total)
    }
}
