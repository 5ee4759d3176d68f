use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};

use crate::queue::{QueueCounts, TaskRecord};

use super::config::SessionConfig;
use super::controller::Command;
use super::error::OrchestratorError;
use super::phase::Phase;

/// Phase and counts at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    /// Station of the current session, if one was started.
    pub station: Option<String>,
    #[serde(flatten)]
    pub counts: QueueCounts,
}

/// Cloneable handle to a running [`Orchestrator`](super::Orchestrator).
#[derive(Debug, Clone)]
pub struct OrchestratorHandle {
    commands: mpsc::Sender<Command>,
    phase: watch::Receiver<Phase>,
}

impl OrchestratorHandle {
    pub(super) fn new(commands: mpsc::Sender<Command>, phase: watch::Receiver<Phase>) -> Self {
        Self { commands, phase }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, OrchestratorError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| OrchestratorError::ControllerGone)?;
        rx.await.map_err(|_| OrchestratorError::ControllerGone)
    }

    /// Plans the range and starts downloading. Returns the number of intervals.
    pub async fn start(&self, config: SessionConfig) -> Result<usize, OrchestratorError> {
        self.request(|tx| Command::Start(config, tx)).await?
    }

    /// Stops new dispatches; the session becomes `Paused` once in-flight units
    /// report back. Returns false when there was nothing to pause.
    pub async fn pause(&self) -> Result<bool, OrchestratorError> {
        self.request(Command::Pause).await
    }

    /// Continues a paused session. Returns the number of pending units.
    pub async fn resume(&self) -> Result<usize, OrchestratorError> {
        self.request(Command::Resume).await?
    }

    /// Hard stop. Pending units are abandoned. Returns false when nothing was running.
    pub async fn cancel(&self) -> Result<bool, OrchestratorError> {
        self.request(Command::Cancel).await
    }

    /// Requeues every failed unit and runs them again. Returns how many moved.
    pub async fn retry_failed(&self) -> Result<usize, OrchestratorError> {
        self.request(Command::RetryFailed).await?
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, OrchestratorError> {
        self.request(Command::Snapshot).await
    }

    /// Failed units with their reasons.
    pub async fn failed_units(&self) -> Result<Vec<TaskRecord>, OrchestratorError> {
        self.request(Command::Failed).await
    }

    /// Every unit of the current session, sorted by interval.
    pub async fn records(&self) -> Result<Vec<TaskRecord>, OrchestratorError> {
        self.request(Command::Records).await
    }

    /// Current phase without a round trip to the controller.
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Receiver that observes every phase change.
    pub fn phases(&self) -> watch::Receiver<Phase> {
        self.phase.clone()
    }

    /// Waits until the session is no longer planning or running.
    pub async fn wait_settled(&self) -> Result<Phase, OrchestratorError> {
        let mut rx = self.phase.clone();
        let phase = rx
            .wait_for(|p| p.is_settled())
            .await
            .map_err(|_| OrchestratorError::ControllerGone)?;
        Ok(*phase)
    }
}
