use std::path::PathBuf;
use thiserror::Error;

use crate::planner::PlanError;

use super::config::ConfigError;
use super::phase::Phase;

/// Errors returned by controller commands. Unit failures are never errors
/// here; they are recorded in the session's failed list.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    InvalidRange(#[from] PlanError),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
    #[error("cannot create destination {}: {source}", path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot {operation} while {phase}")]
    InvalidState {
        operation: &'static str,
        phase: Phase,
    },
    #[error("no failed units to retry")]
    NothingToRetry,
    #[error("orchestrator task is no longer running")]
    ControllerGone,
}
