//! Mutex-guarded pending/in-flight/completed/failed collections.
//!
//! Every mutation takes the single lock, so concurrent completions can never
//! duplicate or drop an interval.

use std::collections::{BTreeSet, VecDeque};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

use crate::planner::TimeInterval;

use super::record::{QueueCounts, TaskRecord, UnitStatus};

/// Protocol violation: an outcome was reported for an interval that is not in flight.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("interval {0} is not in flight")]
    NotInFlight(TimeInterval),
}

#[derive(Debug, Default)]
struct QueueState {
    planned: usize,
    pending: VecDeque<TimeInterval>,
    in_flight: BTreeSet<TimeInterval>,
    completed: Vec<TaskRecord>,
    failed: Vec<TaskRecord>,
}

/// Thread-safe work queue for one session.
#[derive(Debug, Default)]
pub struct WorkQueue {
    state: Mutex<QueueState>,
}

impl WorkQueue {
    /// Creates a queue whose pending set is the given plan, in order.
    pub fn from_plan(plan: Vec<TimeInterval>) -> Self {
        let state = QueueState {
            planned: plan.len(),
            pending: plan.into_iter().collect(),
            ..QueueState::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Removes the next pending interval and marks it in flight.
    pub fn take_pending(&self) -> Option<TimeInterval> {
        let mut st = self.lock();
        let interval = st.pending.pop_front()?;
        st.in_flight.insert(interval);
        Some(interval)
    }

    /// Records a successful unit.
    pub fn mark_completed(
        &self,
        interval: TimeInterval,
        artifact: PathBuf,
    ) -> Result<(), QueueError> {
        let mut st = self.lock();
        if !st.in_flight.remove(&interval) {
            return Err(QueueError::NotInFlight(interval));
        }
        st.completed.push(TaskRecord {
            interval,
            status: UnitStatus::Completed,
            artifact: Some(artifact),
            error: None,
        });
        Ok(())
    }

    /// Records a failed unit with its reason.
    pub fn mark_failed(
        &self,
        interval: TimeInterval,
        reason: impl Into<String>,
    ) -> Result<(), QueueError> {
        let mut st = self.lock();
        if !st.in_flight.remove(&interval) {
            return Err(QueueError::NotInFlight(interval));
        }
        st.failed.push(TaskRecord {
            interval,
            status: UnitStatus::Failed,
            artifact: None,
            error: Some(reason.into()),
        });
        Ok(())
    }

    /// Moves every failed interval back to pending (in failure order) and
    /// clears the failed set. Returns how many moved.
    pub fn requeue_failed(&self) -> usize {
        let mut st = self.lock();
        let failed = std::mem::take(&mut st.failed);
        let moved = failed.len();
        st.pending.extend(failed.into_iter().map(|r| r.interval));
        moved
    }

    pub fn snapshot(&self) -> QueueCounts {
        let st = self.lock();
        QueueCounts {
            planned: st.planned,
            pending: st.pending.len(),
            in_flight: st.in_flight.len(),
            completed: st.completed.len(),
            failed: st.failed.len(),
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.lock().pending.is_empty()
    }

    pub fn in_flight_count(&self) -> usize {
        self.lock().in_flight.len()
    }

    /// Failed records with their reasons, in failure order.
    pub fn failed(&self) -> Vec<TaskRecord> {
        self.lock().failed.clone()
    }

    /// Completed records, in completion order.
    pub fn completed(&self) -> Vec<TaskRecord> {
        self.lock().completed.clone()
    }

    /// Pending intervals, in dispatch order.
    pub fn pending(&self) -> Vec<TimeInterval> {
        self.lock().pending.iter().copied().collect()
    }

    /// Every tracked record, sorted by interval.
    pub fn records(&self) -> Vec<TaskRecord> {
        let st = self.lock();
        let mut out: Vec<TaskRecord> = st
            .pending
            .iter()
            .map(|i| TaskRecord::pending(*i))
            .chain(st.in_flight.iter().map(|i| TaskRecord::in_flight(*i)))
            .chain(st.completed.iter().cloned())
            .chain(st.failed.iter().cloned())
            .collect();
        out.sort_by_key(|r| r.interval);
        out
    }
}
