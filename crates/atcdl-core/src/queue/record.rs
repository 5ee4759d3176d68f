//! Per-interval task record and queue counters.

use serde::Serialize;
use std::path::PathBuf;

use crate::planner::TimeInterval;

/// Lifecycle state of one work unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Pending,
    InFlight,
    Completed,
    Failed,
}

impl UnitStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UnitStatus::Pending => "pending",
            UnitStatus::InFlight => "in-flight",
            UnitStatus::Completed => "completed",
            UnitStatus::Failed => "failed",
        }
    }
}

/// One planned interval plus its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRecord {
    pub interval: TimeInterval,
    pub status: UnitStatus,
    /// Local artifact path once completed.
    pub artifact: Option<PathBuf>,
    /// Human-readable failure reason once failed.
    pub error: Option<String>,
}

impl TaskRecord {
    pub(super) fn pending(interval: TimeInterval) -> Self {
        Self {
            interval,
            status: UnitStatus::Pending,
            artifact: None,
            error: None,
        }
    }

    pub(super) fn in_flight(interval: TimeInterval) -> Self {
        Self {
            status: UnitStatus::InFlight,
            ..Self::pending(interval)
        }
    }
}

/// Snapshot of collection sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueCounts {
    pub planned: usize,
    pub pending: usize,
    pub in_flight: usize,
    pub completed: usize,
    pub failed: usize,
}

impl QueueCounts {
    /// Units that have reached a final outcome for the current attempt.
    pub fn processed(&self) -> usize {
        self.completed + self.failed
    }

    /// True when `pending + in_flight + completed + failed == planned`.
    pub fn is_consistent(&self) -> bool {
        self.pending + self.in_flight + self.completed + self.failed == self.planned
    }
}
