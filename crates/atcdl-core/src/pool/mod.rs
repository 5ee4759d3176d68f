//! Bounded worker pool.
//!
//! One dispatcher task drains the work queue, holding a semaphore permit per
//! unit so at most N units are ever in flight. Each unit's blocking fetch runs
//! on the blocking thread pool; its outcome travels back to the controller as
//! a message together with the permit, which the controller releases only
//! after it has recorded the outcome.

mod unit;

pub use unit::{UnitFailure, UnitOutcome, UnitWork};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};

use crate::control::SessionFlags;
use crate::planner::TimeInterval;
use crate::queue::WorkQueue;

/// One unit's outcome, delivered exactly once per dispatched unit.
#[derive(Debug)]
pub struct Completion {
    pub interval: TimeInterval,
    pub outcome: UnitOutcome,
    /// Worker slot; dropping it lets the dispatcher issue the next unit.
    pub permit: OwnedSemaphorePermit,
}

/// Messages from the pool to the controller.
#[derive(Debug)]
pub enum PoolEvent {
    Finished(Completion),
    /// The dispatcher issued its last unit (queue drained, or pause/cancel seen).
    Stopped { dispatched: usize },
}

/// Concurrency limit plus submission pacing.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    concurrency: usize,
    dispatch_gap: Duration,
    slots: Arc<Semaphore>,
}

impl WorkerPool {
    /// `stagger_budget` is the per-unit delay D; consecutive dispatches are
    /// spaced by D/N so the submission rate does not grow with N.
    pub fn new(concurrency: usize, stagger_budget: Duration) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            concurrency,
            dispatch_gap: stagger_budget / concurrency as u32,
            slots: Arc::new(Semaphore::new(concurrency)),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Delay inserted between two consecutive dispatches.
    pub fn dispatch_gap(&self) -> Duration {
        self.dispatch_gap
    }

    /// Spawns a dispatcher that drains `queue` until it is empty or `flags` halt it.
    /// Must be called from within a tokio runtime.
    pub fn spawn_dispatcher(
        &self,
        queue: Arc<WorkQueue>,
        flags: Arc<SessionFlags>,
        work: Arc<UnitWork>,
        events: mpsc::UnboundedSender<PoolEvent>,
    ) -> tokio::task::JoinHandle<()> {
        let slots = Arc::clone(&self.slots);
        let gap = self.dispatch_gap;
        tokio::spawn(async move {
            let dispatched = dispatch_loop(slots, gap, &queue, &flags, &work, &events).await;
            tracing::debug!(dispatched, "dispatcher stopped");
            let _ = events.send(PoolEvent::Stopped { dispatched });
        })
    }
}

async fn dispatch_loop(
    slots: Arc<Semaphore>,
    gap: Duration,
    queue: &WorkQueue,
    flags: &SessionFlags,
    work: &Arc<UnitWork>,
    events: &mpsc::UnboundedSender<PoolEvent>,
) -> usize {
    let mut dispatched = 0usize;
    loop {
        if flags.halted() || !queue.has_pending() {
            break;
        }

        let permit = {
            let woken = flags.notified();
            tokio::pin!(woken);
            woken.as_mut().enable();
            if flags.halted() {
                break;
            }
            tokio::select! {
                permit = Arc::clone(&slots).acquire_owned() => match permit {
                    Ok(p) => p,
                    Err(_) => break,
                },
                _ = &mut woken => continue,
            }
        };

        // Flags may have flipped while we waited for a slot.
        if flags.halted() {
            break;
        }
        let Some(interval) = queue.take_pending() else {
            break;
        };
        dispatched += 1;
        tracing::debug!(%interval, "dispatching unit");
        spawn_unit(interval, permit, Arc::clone(work), events.clone());

        if !gap.is_zero() && queue.has_pending() {
            let woken = flags.notified();
            tokio::pin!(woken);
            woken.as_mut().enable();
            if flags.halted() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(gap) => {}
                _ = &mut woken => {}
            }
        }
    }
    dispatched
}

fn spawn_unit(
    interval: TimeInterval,
    permit: OwnedSemaphorePermit,
    work: Arc<UnitWork>,
    events: mpsc::UnboundedSender<PoolEvent>,
) {
    tokio::spawn(async move {
        let outcome = match tokio::task::spawn_blocking(move || work.run(interval)).await {
            Ok(outcome) => outcome,
            Err(e) => UnitOutcome::Failed(UnitFailure::Unexpected(join_error_reason(e))),
        };
        let _ = events.send(PoolEvent::Finished(Completion {
            interval,
            outcome,
            permit,
        }));
    });
}

fn join_error_reason(e: tokio::task::JoinError) -> String {
    if e.is_panic() {
        let payload = e.into_panic();
        if let Some(s) = payload.downcast_ref::<&str>() {
            return format!("worker panicked: {}", s);
        }
        if let Some(s) = payload.downcast_ref::<String>() {
            return format!("worker panicked: {}", s);
        }
        return "worker panicked".to_string();
    }
    format!("worker task failed: {}", e)
}
