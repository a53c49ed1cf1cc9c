//! Single-frame handoff between the renderer and a UI thread
//!
//! Holds at most one pending frame. A new frame replaces an undelivered
//! one, so a UI thread that falls behind drops frames instead of queueing
//! them.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

pub(crate) struct FrameSlot<T> {
    pending: Mutex<Option<T>>,
    ready: Condvar,
}

impl<T> FrameSlot<T> {
    pub(crate) fn new() -> Self {
        Self {
            pending: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store `frame` as the pending frame
    ///
    /// Returns true if an undelivered frame was replaced.
    pub(crate) fn put(&self, frame: T) -> bool {
        let replaced = self.lock().replace(frame).is_some();
        self.ready.notify_one();
        replaced
    }

    /// Take the pending frame, waiting up to `timeout` for one
    pub(crate) fn take_timeout(&self, timeout: Duration) -> Option<T> {
        let guard = self.lock();
        let (mut guard, _) = self
            .ready
            .wait_timeout_while(guard, timeout, |pending| pending.is_none())
            .unwrap_or_else(|e| e.into_inner());
        guard.take()
    }
}
