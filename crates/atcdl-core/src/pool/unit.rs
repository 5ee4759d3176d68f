//! The unit of work: fetch one interval, then move the artifact to the
//! session destination.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::fetch::{truncate_reason, FetchClient, FetchError};
use crate::planner::TimeInterval;

/// Why a unit failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitFailure {
    /// The fetch client gave up (retryable failure exhausted, or terminal).
    Fetch(FetchError),
    /// Anything else while processing the unit (move failure, panic).
    Unexpected(String),
}

impl UnitFailure {
    pub fn reason(&self) -> String {
        match self {
            UnitFailure::Fetch(e) => e.message.clone(),
            UnitFailure::Unexpected(msg) => msg.clone(),
        }
    }
}

/// Final outcome of one dispatched unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    Completed(PathBuf),
    Failed(UnitFailure),
}

/// Everything a worker needs to process intervals for one session.
pub struct UnitWork {
    fetcher: Arc<dyn FetchClient>,
    station: String,
    destination: PathBuf,
    max_error_len: usize,
}

impl UnitWork {
    pub fn new(
        fetcher: Arc<dyn FetchClient>,
        station: impl Into<String>,
        destination: impl Into<PathBuf>,
        max_error_len: usize,
    ) -> Self {
        Self {
            fetcher,
            station: station.into(),
            destination: destination.into(),
            max_error_len,
        }
    }

    /// Blocking. Runs on a worker thread.
    pub fn run(&self, interval: TimeInterval) -> UnitOutcome {
        let staged = match self
            .fetcher
            .fetch(&self.station, &interval.date_token(), &interval.time_token())
        {
            Ok(path) => path,
            Err(e) => return UnitOutcome::Failed(UnitFailure::Fetch(e)),
        };
        match move_into(&staged, &self.destination) {
            Ok(dest) => UnitOutcome::Completed(dest),
            Err(e) => UnitOutcome::Failed(UnitFailure::Unexpected(truncate_reason(
                &format!("move {} -> {}: {}", staged.display(), self.destination.display(), e),
                self.max_error_len,
            ))),
        }
    }
}

/// Moves `src` into directory `dir`, keeping its file name. Falls back to
/// copy + remove when a rename crosses filesystems.
fn move_into(src: &Path, dir: &Path) -> io::Result<PathBuf> {
    let name = src
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "artifact has no file name"))?;
    let dest = dir.join(name);
    if src == dest {
        return Ok(dest);
    }
    if fs::rename(src, &dest).is_err() {
        fs::copy(src, &dest)?;
        fs::remove_file(src)?;
    }
    Ok(dest)
}
