//! One archive slot: a start instant plus a fixed 30-minute duration.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of one archive recording, in minutes.
pub const INTERVAL_MINUTES: i64 = 30;

/// A single work unit. Identity is the start instant; the duration is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeInterval {
    start: DateTime<Utc>,
}

impl TimeInterval {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { start }
    }

    /// Fixed slot length.
    pub fn duration() -> Duration {
        Duration::minutes(INTERVAL_MINUTES)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// End instant (exclusive).
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Self::duration()
    }

    /// The slot that immediately follows this one.
    pub fn next(&self) -> Self {
        Self::new(self.end())
    }

    /// Archive date token, e.g. `Oct-01-2021`.
    pub fn date_token(&self) -> String {
        self.start.format("%b-%d-%Y").to_string()
    }

    /// Archive time token, e.g. `0030Z`.
    pub fn time_token(&self) -> String {
        self.start.format("%H%MZ").to_string()
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date_token(), self.time_token())
    }
}
