//! In-process `FetchClient` doubles for orchestrator tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use atcdl_core::fetch::{FetchClient, FetchError};

/// Writes a small file per call into `staging`, tracking calls and concurrency.
///
/// Time tokens in `fail_once` fail on their first call only; tokens in
/// `fail_always` fail on every call; tokens in `panic_on` panic.
#[derive(Debug, Default)]
pub struct MockFetch {
    pub staging: PathBuf,
    pub delay: Duration,
    pub fail_once: Vec<String>,
    pub fail_always: Vec<String>,
    pub panic_on: Vec<String>,
    calls: Mutex<Vec<String>>,
    started: Mutex<Vec<Instant>>,
    attempts: Mutex<HashMap<String, usize>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl MockFetch {
    pub fn new(staging: impl Into<PathBuf>) -> Self {
        Self {
            staging: staging.into(),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_once(mut self, time_token: &str) -> Self {
        self.fail_once.push(time_token.to_string());
        self
    }

    pub fn failing_always(mut self, time_token: &str) -> Self {
        self.fail_always.push(time_token.to_string());
        self
    }

    pub fn panicking_on(mut self, time_token: &str) -> Self {
        self.panic_on.push(time_token.to_string());
        self
    }

    /// Time tokens of every call, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// When each call began, in call order.
    pub fn call_times(&self) -> Vec<Instant> {
        self.started.lock().unwrap().clone()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FetchClient for MockFetch {
    fn fetch(&self, station: &str, date_token: &str, time_token: &str) -> Result<PathBuf, FetchError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = ActiveGuard(&self.active);
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.started.lock().unwrap().push(Instant::now());
        self.calls.lock().unwrap().push(time_token.to_string());
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let n = attempts.entry(time_token.to_string()).or_insert(0);
            *n += 1;
            *n
        };

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.panic_on.iter().any(|t| t == time_token) {
            panic!("simulated crash at {}", time_token);
        }
        if self.fail_always.iter().any(|t| t == time_token) {
            return Err(FetchError::terminal("HTTP 404"));
        }
        if attempt == 1 && self.fail_once.iter().any(|t| t == time_token) {
            return Err(FetchError::retryable("failed after 3 attempt(s): connection reset"));
        }

        let path = self
            .staging
            .join(format!("{}-{}-{}.mp3", station, date_token, time_token));
        std::fs::write(&path, b"ID3").map_err(|e| FetchError::terminal(e.to_string()))?;
        Ok(path)
    }
}
