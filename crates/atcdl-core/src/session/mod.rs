//! Download session orchestration.
//!
//! The controller runs as a single actor task that owns the session: it is the
//! only place queue outcomes are recorded and the only place control flags are
//! written. Callers drive it through a cloneable `OrchestratorHandle`; workers
//! report back over a channel.

mod config;
mod controller;
mod error;
mod handle;
mod phase;
mod summary;

pub use config::{ConfigError, SessionConfig, MAX_CONCURRENCY};
pub use controller::Orchestrator;
pub use error::OrchestratorError;
pub use handle::{OrchestratorHandle, SessionSnapshot};
pub use phase::Phase;
