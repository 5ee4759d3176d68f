//! Progress reporting: the sink for log lines, status text and session events.
//!
//! The controller never touches presentation state directly; it talks to a
//! `ProgressReporter`. `ChannelReporter` forwards everything over a channel so
//! a UI (the CLI) can render it on its own task.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::queue::QueueCounts;
use crate::session::Phase;

/// Aggregate counts at a phase transition or unit completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionEvent {
    pub phase: Phase,
    pub planned: usize,
    pub pending: usize,
    pub in_flight: usize,
    pub completed: usize,
    pub failed: usize,
    /// Human-readable one-line summary.
    pub summary: String,
}

impl SessionEvent {
    pub fn new(phase: Phase, counts: QueueCounts, summary: impl Into<String>) -> Self {
        Self {
            phase,
            planned: counts.planned,
            pending: counts.pending,
            in_flight: counts.in_flight,
            completed: counts.completed,
            failed: counts.failed,
            summary: summary.into(),
        }
    }

    /// Fraction of planned units with a final outcome, in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.planned == 0 {
            return 1.0;
        }
        ((self.completed + self.failed) as f64 / self.planned as f64).min(1.0)
    }
}

/// Sink for everything the controller wants a user to see.
pub trait ProgressReporter: Send + Sync {
    fn log(&self, line: &str);
    fn set_status(&self, text: &str);
    fn on_session_event(&self, event: &SessionEvent);
}

/// Message forwarded by `ChannelReporter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressMessage {
    Log(String),
    Status(String),
    Session(SessionEvent),
}

/// Forwards reporter calls to an unbounded channel. Sends never block the controller.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<ProgressMessage>,
}

impl ChannelReporter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressReporter for ChannelReporter {
    fn log(&self, line: &str) {
        let _ = self.tx.send(ProgressMessage::Log(line.to_string()));
    }

    fn set_status(&self, text: &str) {
        let _ = self.tx.send(ProgressMessage::Status(text.to_string()));
    }

    fn on_session_event(&self, event: &SessionEvent) {
        let _ = self.tx.send(ProgressMessage::Session(event.clone()));
    }
}

/// Writes all progress to `tracing`. Useful headless.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn log(&self, line: &str) {
        tracing::info!(target: "atcdl::progress", "{}", line);
    }

    fn set_status(&self, text: &str) {
        tracing::debug!(target: "atcdl::progress", status = text);
    }

    fn on_session_event(&self, event: &SessionEvent) {
        tracing::info!(
            target: "atcdl::progress",
            phase = %event.phase,
            completed = event.completed,
            failed = event.failed,
            pending = event.pending,
            in_flight = event.in_flight,
            "{}",
            event.summary
        );
    }
}
