use serde::Serialize;
use std::fmt;

/// Controller state.
///
/// `Idle -> Planning -> Running -> {Paused, Cancelled, Completed}`. `Paused`
/// re-enters `Running` on resume; `Paused`, `Cancelled` and `Completed` re-enter
/// it on retry-failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Planning,
    Running,
    Paused,
    Cancelled,
    Completed,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Planning => "planning",
            Phase::Running => "running",
            Phase::Paused => "paused",
            Phase::Cancelled => "cancelled",
            Phase::Completed => "completed",
        }
    }

    /// No dispatcher and no in-flight units: the session is at rest.
    pub fn is_settled(self) -> bool {
        !matches!(self, Phase::Planning | Phase::Running)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
