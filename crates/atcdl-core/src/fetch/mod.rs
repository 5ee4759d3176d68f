//! Per-unit archive retrieval.
//!
//! `FetchClient` is the boundary the worker pool calls once per interval. The
//! client owns its own bounded retry/backoff; whatever it returns is final for
//! that attempt.

mod archive;
mod naming;
mod transfer;

pub use archive::ArchiveFetchClient;
pub use naming::{airport_code, archive_file_name, derive_archive_identifier, selected_option_value};
pub use transfer::HttpOptions;
pub(crate) use transfer::get_page;

use std::path::PathBuf;
use thiserror::Error;

/// Whether the failure was transient (retries exhausted) or final (403/404 class).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Retryable,
    Terminal,
}

/// A unit's fetch failure, with a reason already truncated for log hygiene.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Retryable,
            message: message.into(),
        }
    }

    pub fn terminal(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Terminal,
            message: message.into(),
        }
    }
}

/// Retrieves one archived recording.
///
/// Implementations block (network I/O) and are called from worker threads.
pub trait FetchClient: Send + Sync {
    /// Downloads the recording for `station` at the given archive date/time
    /// tokens and returns the local artifact path.
    fn fetch(&self, station: &str, date_token: &str, time_token: &str) -> Result<PathBuf, FetchError>;
}

/// Truncates `message` to at most `max_chars` characters, appending `...` when cut.
pub fn truncate_reason(message: &str, max_chars: usize) -> String {
    match message.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &message[..idx]),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_reasons_untouched() {
        assert_eq!(truncate_reason("HTTP 404", 100), "HTTP 404");
        assert_eq!(truncate_reason("", 3), "");
    }

    #[test]
    fn long_reasons_cut_with_ellipsis() {
        let long = "x".repeat(150);
        let out = truncate_reason(&long, 100);
        assert_eq!(out.len(), 103);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_reason("ääää", 2), "ää...");
    }

    #[test]
    fn error_displays_message() {
        let e = FetchError::terminal("HTTP 403");
        assert_eq!(e.to_string(), "HTTP 403");
        assert_eq!(e.kind, FetchErrorKind::Terminal);
    }
}
