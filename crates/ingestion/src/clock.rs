//! Time source for sampling delays
//!
//! Tick sensors never call `std::thread::sleep` directly; they go through a
//! `Clock` so that tests can replace real time with a virtual one.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Sampling clock
pub trait Clock: Send + Sync {
    /// Block for `duration`
    fn sleep(&self, duration: Duration);

    /// Time elapsed since the clock was created
    fn now(&self) -> Duration;
}

/// Wall clock
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Virtual clock
///
/// `sleep` returns immediately and advances virtual time instead.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move virtual time forward without sleeping
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += duration;
    }
}

impl Clock for ManualClock {
    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }

    fn now(&self) -> Duration {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
