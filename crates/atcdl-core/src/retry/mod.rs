//! Retry and backoff policy for a single archive fetch.
//!
//! Classifies transfer failures (timeouts, throttling, connection errors,
//! HTTP status) and decides exponential backoff. This is private policy of the
//! fetch client; the session controller never re-submits on its own.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::TransferError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
