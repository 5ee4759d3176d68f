//! Session control flags for pause/cancel.
//!
//! The worker pool checks these before every dispatch; the controller sets
//! them. Cancellation is cooperative: units already dispatched run to the end.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// Shared `paused` / `cancelled` flags plus a wake-up for a dispatcher that is
/// sleeping between dispatches or waiting for a free worker.
#[derive(Debug, Default)]
pub struct SessionFlags {
    paused: AtomicBool,
    cancelled: AtomicBool,
    wake: Notify,
}

impl SessionFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a pause. Returns false if a pause or cancel was already requested.
    pub fn request_pause(&self) -> bool {
        if self.is_cancelled() {
            return false;
        }
        let first = !self.paused.swap(true, Ordering::AcqRel);
        self.wake.notify_waiters();
        first
    }

    /// Requests cancellation. Returns false if already cancelled.
    pub fn request_cancel(&self) -> bool {
        let first = !self.cancelled.swap(true, Ordering::AcqRel);
        self.wake.notify_waiters();
        first
    }

    /// Clears both flags (resume / retry).
    pub fn clear(&self) {
        self.paused.store(false, Ordering::Release);
        self.cancelled.store(false, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// True when no further dispatches may be issued.
    pub fn halted(&self) -> bool {
        self.is_paused() || self.is_cancelled()
    }

    /// Resolves on the next pause/cancel request.
    pub(crate) fn notified(&self) -> tokio::sync::futures::Notified<'_> {
        self.wake.notified()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_twice_reports_once() {
        let f = SessionFlags::new();
        assert!(f.request_pause());
        assert!(!f.request_pause());
        assert!(f.halted());
        f.clear();
        assert!(!f.halted());
    }

    #[test]
    fn pause_after_cancel_is_ignored() {
        let f = SessionFlags::new();
        assert!(f.request_cancel());
        assert!(!f.request_pause());
        assert!(!f.is_paused());
        assert!(!f.request_cancel());
    }
}
