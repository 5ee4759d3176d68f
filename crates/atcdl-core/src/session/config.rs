//! Validated session parameters.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::AtcConfig;

/// Upper bound on concurrent downloads.
pub const MAX_CONCURRENCY: usize = 100;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("concurrency must be between 1 and {MAX_CONCURRENCY}, got {0}")]
    Concurrency(usize),
    #[error("stagger delay must be a finite number of seconds >= 0, got {0}")]
    Delay(f64),
    #[error("station identifier is empty")]
    EmptyStation,
}

/// What one `start` command asks for.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub station: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub destination: PathBuf,
    /// Concurrency limit N.
    pub concurrency: usize,
    /// Stagger delay budget D, in seconds.
    pub stagger_delay_secs: f64,
    /// Failure reasons are truncated to this many characters.
    pub max_error_len: usize,
}

impl SessionConfig {
    /// New session parameters with N, D and error length taken from `cfg`.
    pub fn new(
        station: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        destination: impl Into<PathBuf>,
        cfg: &AtcConfig,
    ) -> Self {
        Self {
            station: station.into(),
            start,
            end,
            destination: destination.into(),
            concurrency: cfg.concurrency,
            stagger_delay_secs: cfg.stagger_delay_secs,
            max_error_len: cfg.max_error_len,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n;
        self
    }

    pub fn with_stagger_delay(mut self, secs: f64) -> Self {
        self.stagger_delay_secs = secs;
        self
    }

    /// Rejects N outside [1, 100], negative or non-finite D, and an empty station.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.station.trim().is_empty() {
            return Err(ConfigError::EmptyStation);
        }
        if !(1..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(ConfigError::Concurrency(self.concurrency));
        }
        if !self.stagger_delay_secs.is_finite() || self.stagger_delay_secs < 0.0 {
            return Err(ConfigError::Delay(self.stagger_delay_secs));
        }
        Ok(())
    }

    /// D as a duration. Call after `validate`.
    pub fn stagger_delay(&self) -> Duration {
        Duration::from_secs_f64(self.stagger_delay_secs.max(0.0))
    }
}
