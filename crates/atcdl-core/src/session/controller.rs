//! Controller actor: owns the session and serializes every command and pool event.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

use crate::control::SessionFlags;
use crate::fetch::FetchClient;
use crate::planner::{plan_intervals, TimeInterval};
use crate::pool::{Completion, PoolEvent, UnitOutcome, UnitWork, WorkerPool};
use crate::progress::{ProgressReporter, SessionEvent};
use crate::queue::{QueueCounts, TaskRecord, WorkQueue};

use super::config::SessionConfig;
use super::error::OrchestratorError;
use super::handle::{OrchestratorHandle, SessionSnapshot};
use super::phase::Phase;
use super::summary;

type Reply<T> = oneshot::Sender<T>;

pub(super) enum Command {
    Start(SessionConfig, Reply<Result<usize, OrchestratorError>>),
    Pause(Reply<bool>),
    Resume(Reply<Result<usize, OrchestratorError>>),
    Cancel(Reply<bool>),
    RetryFailed(Reply<Result<usize, OrchestratorError>>),
    Snapshot(Reply<SessionSnapshot>),
    Failed(Reply<Vec<TaskRecord>>),
    Records(Reply<Vec<TaskRecord>>),
}

/// State of one started session.
struct Session {
    config: SessionConfig,
    queue: Arc<WorkQueue>,
    flags: Arc<SessionFlags>,
    pool: WorkerPool,
    work: Arc<UnitWork>,
    dispatcher_active: bool,
    /// Denominator and counter for the `[k/total]` lines of the current round.
    round_total: usize,
    round_done: usize,
}

/// The session controller. Create one with [`Orchestrator::spawn`].
pub struct Orchestrator {
    fetcher: Arc<dyn FetchClient>,
    reporter: Arc<dyn ProgressReporter>,
    phase: Phase,
    phase_tx: watch::Sender<Phase>,
    session: Option<Session>,
    events_tx: mpsc::UnboundedSender<PoolEvent>,
}

impl Orchestrator {
    /// Spawns the controller task and returns a handle to it.
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        fetcher: Arc<dyn FetchClient>,
        reporter: Arc<dyn ProgressReporter>,
    ) -> OrchestratorHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (phase_tx, phase_rx) = watch::channel(Phase::Idle);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let actor = Orchestrator {
            fetcher,
            reporter,
            phase: Phase::Idle,
            phase_tx,
            session: None,
            events_tx,
        };
        tokio::spawn(actor.run(cmd_rx, events_rx));
        OrchestratorHandle::new(cmd_tx, phase_rx)
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut events: mpsc::UnboundedReceiver<PoolEvent>,
    ) {
        loop {
            tokio::select! {
                // Drain worker results first so snapshots never lag behind them.
                biased;
                Some(event) = events.recv() => self.on_pool_event(event),
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.on_command(cmd),
                    None => break,
                },
            }
        }
        if let Some(session) = &self.session {
            session.flags.request_cancel();
        }
        tracing::debug!("orchestrator stopped: all handles dropped");
    }

    fn on_command(&mut self, cmd: Command) {
        match cmd {
            Command::Start(cfg, reply) => {
                let _ = reply.send(self.start(cfg));
            }
            Command::Pause(reply) => {
                let _ = reply.send(self.pause());
            }
            Command::Resume(reply) => {
                let _ = reply.send(self.resume());
            }
            Command::Cancel(reply) => {
                let _ = reply.send(self.cancel());
            }
            Command::RetryFailed(reply) => {
                let _ = reply.send(self.retry_failed());
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::Failed(reply) => {
                let failed = self
                    .session
                    .as_ref()
                    .map(|s| s.queue.failed())
                    .unwrap_or_default();
                let _ = reply.send(failed);
            }
            Command::Records(reply) => {
                let records = self
                    .session
                    .as_ref()
                    .map(|s| s.queue.records())
                    .unwrap_or_default();
                let _ = reply.send(records);
            }
        }
    }

    fn counts(&self) -> QueueCounts {
        self.session
            .as_ref()
            .map(|s| s.queue.snapshot())
            .unwrap_or_default()
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            station: self.session.as_ref().map(|s| s.config.station.clone()),
            counts: self.counts(),
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            tracing::info!(from = %self.phase, to = %phase, "session phase change");
        }
        self.phase = phase;
        // Reporter first: a watcher woken by the phase change sees every event.
        self.emit_event();
        self.phase_tx.send_replace(phase);
    }

    fn emit_event(&self) {
        let counts = self.counts();
        let event = SessionEvent::new(self.phase, counts, summary::one_line(self.phase, &counts));
        self.reporter.on_session_event(&event);
    }

    fn log(&self, line: &str) {
        self.reporter.log(line);
    }

    fn start(&mut self, cfg: SessionConfig) -> Result<usize, OrchestratorError> {
        if !self.phase.is_settled() {
            tracing::debug!(phase = %self.phase, "start rejected");
            return Err(OrchestratorError::InvalidState {
                operation: "start",
                phase: self.phase,
            });
        }
        cfg.validate()?;

        let previous = self.phase;
        self.set_phase(Phase::Planning);
        let plan = match self.plan(&cfg) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::debug!(error = %e, "start rejected during planning");
                self.set_phase(previous);
                return Err(e);
            }
        };
        let planned = plan.len();

        let work = UnitWork::new(
            Arc::clone(&self.fetcher),
            cfg.station.clone(),
            cfg.destination.clone(),
            cfg.max_error_len,
        );
        let session = Session {
            pool: WorkerPool::new(cfg.concurrency, cfg.stagger_delay()),
            queue: Arc::new(WorkQueue::from_plan(plan)),
            flags: Arc::new(SessionFlags::new()),
            work: Arc::new(work),
            dispatcher_active: false,
            round_total: planned,
            round_done: 0,
            config: cfg,
        };
        for line in summary::header(&session.config, planned) {
            self.log(&line);
        }
        tracing::info!(
            station = %session.config.station,
            intervals = planned,
            concurrency = session.config.concurrency,
            "session started"
        );
        self.session = Some(session);
        self.set_phase(Phase::Running);
        self.spawn_dispatcher();
        Ok(planned)
    }

    fn plan(&self, cfg: &SessionConfig) -> Result<Vec<TimeInterval>, OrchestratorError> {
        let plan = plan_intervals(cfg.start, cfg.end)?;
        std::fs::create_dir_all(&cfg.destination).map_err(|source| {
            OrchestratorError::Destination {
                path: cfg.destination.clone(),
                source,
            }
        })?;
        Ok(plan)
    }

    fn pause(&mut self) -> bool {
        if self.phase != Phase::Running {
            tracing::debug!(phase = %self.phase, "pause ignored");
            return false;
        }
        let Some(session) = &self.session else {
            return false;
        };
        if !session.flags.request_pause() {
            return false;
        }
        self.log("Pausing download... (will finish current batch)");
        self.reporter.set_status("Pausing...");
        self.settle();
        true
    }

    fn resume(&mut self) -> Result<usize, OrchestratorError> {
        if self.phase != Phase::Paused {
            tracing::debug!(phase = %self.phase, "resume rejected");
            return Err(OrchestratorError::InvalidState {
                operation: "resume",
                phase: self.phase,
            });
        }
        let Some(session) = &mut self.session else {
            return Err(OrchestratorError::InvalidState {
                operation: "resume",
                phase: self.phase,
            });
        };
        session.flags.clear();
        let pending = session.queue.snapshot().pending;
        self.log("=== Resuming Download ===");
        self.log(&format!("Resuming with {} remaining interval(s)", pending));
        self.set_phase(Phase::Running);
        self.spawn_dispatcher();
        Ok(pending)
    }

    fn cancel(&mut self) -> bool {
        if !matches!(self.phase, Phase::Running | Phase::Paused) {
            tracing::debug!(phase = %self.phase, "cancel ignored");
            return false;
        }
        let Some(session) = &self.session else {
            return false;
        };
        if !session.flags.request_cancel() {
            return false;
        }
        self.log("Download cancelled by user");
        self.reporter.set_status("Cancelling download...");
        if self.phase == Phase::Paused {
            // Nothing in flight; the session stops right away.
            let counts = self.counts();
            self.finish(Phase::Cancelled, counts);
        } else {
            self.settle();
        }
        true
    }

    fn retry_failed(&mut self) -> Result<usize, OrchestratorError> {
        if !matches!(
            self.phase,
            Phase::Paused | Phase::Cancelled | Phase::Completed
        ) {
            tracing::debug!(phase = %self.phase, "retry rejected");
            return Err(OrchestratorError::InvalidState {
                operation: "retry failed units",
                phase: self.phase,
            });
        }
        let Some(session) = &mut self.session else {
            return Err(OrchestratorError::NothingToRetry);
        };
        if session.queue.snapshot().failed == 0 {
            return Err(OrchestratorError::NothingToRetry);
        }
        let moved = session.queue.requeue_failed();
        session.flags.clear();
        session.round_total = session.queue.snapshot().pending;
        session.round_done = 0;
        self.log(&format!("=== Retrying {} Failed Download(s) ===", moved));
        self.set_phase(Phase::Running);
        self.spawn_dispatcher();
        Ok(moved)
    }

    fn spawn_dispatcher(&mut self) {
        let Some(session) = &mut self.session else {
            return;
        };
        session.dispatcher_active = true;
        // The dispatcher reports `Stopped` when done; the handle is not needed.
        drop(session.pool.spawn_dispatcher(
            Arc::clone(&session.queue),
            Arc::clone(&session.flags),
            Arc::clone(&session.work),
            self.events_tx.clone(),
        ));
    }

    fn on_pool_event(&mut self, event: PoolEvent) {
        match event {
            PoolEvent::Finished(completion) => self.on_finished(completion),
            PoolEvent::Stopped { dispatched } => {
                tracing::debug!(dispatched, "dispatcher reported stop");
                if let Some(session) = &mut self.session {
                    session.dispatcher_active = false;
                }
                self.settle();
            }
        }
    }

    fn on_finished(&mut self, completion: Completion) {
        let Completion {
            interval,
            outcome,
            permit,
        } = completion;
        let Some(session) = &mut self.session else {
            tracing::error!(%interval, "unit outcome without a session");
            return;
        };

        let recorded = match &outcome {
            UnitOutcome::Completed(path) => session.queue.mark_completed(interval, path.clone()),
            UnitOutcome::Failed(failure) => session.queue.mark_failed(interval, failure.reason()),
        };
        // Slot is released only after the outcome is in the queue.
        drop(permit);
        if let Err(e) = recorded {
            tracing::error!(error = %e, "dropping unit outcome");
            debug_assert!(false, "{}", e);
            return;
        }

        session.round_done += 1;
        let (done, total) = (session.round_done, session.round_total.max(session.round_done));
        let counts = session.queue.snapshot();
        let line = match &outcome {
            UnitOutcome::Completed(path) => {
                tracing::debug!(%interval, path = %path.display(), "unit completed");
                summary::unit_ok(done, total, &interval, path)
            }
            UnitOutcome::Failed(failure) => {
                let reason = failure.reason();
                tracing::warn!(%interval, reason = %reason, "unit failed");
                summary::unit_failed(done, total, &interval, &reason)
            }
        };
        self.log(&line);
        self.reporter
            .set_status(&summary::progress(done, total, &counts));
        self.emit_event();
        self.settle();
    }

    /// Moves a running session to its resting phase once the dispatcher has
    /// stopped and nothing is in flight.
    fn settle(&mut self) {
        if self.phase != Phase::Running {
            return;
        }
        let Some(session) = &self.session else {
            return;
        };
        if session.dispatcher_active {
            return;
        }
        let counts = session.queue.snapshot();
        if counts.in_flight > 0 {
            return;
        }
        let next = if session.flags.is_cancelled() {
            Phase::Cancelled
        } else if session.flags.is_paused() {
            Phase::Paused
        } else if counts.pending > 0 {
            // Work was requeued after the dispatcher drained; pick it up.
            self.spawn_dispatcher();
            return;
        } else {
            Phase::Completed
        };
        self.finish(next, counts);
    }

    fn finish(&mut self, next: Phase, counts: QueueCounts) {
        for line in summary::settled_block(next, &counts) {
            self.log(&line);
        }
        self.reporter.set_status(&summary::one_line(next, &counts));
        self.set_phase(next);
    }
}
