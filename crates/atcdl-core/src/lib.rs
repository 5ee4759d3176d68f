pub mod config;
pub mod logging;

pub mod control;
pub mod fetch;
pub mod lookup;
pub mod planner;
pub mod pool;
pub mod progress;
pub mod queue;
pub mod retry;
pub mod session;

pub use session::{
    Orchestrator, OrchestratorError, OrchestratorHandle, Phase, SessionConfig, SessionSnapshot,
};
