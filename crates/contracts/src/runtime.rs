//! CancellationToken - run lifecycle
//!
//! Shared by every producer and the consumer. The state only moves forward:
//! Running -> Cancelling -> Stopped.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RigState {
    Running,
    Cancelling,
    Stopped,
}

impl RigState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => RigState::Running,
            1 => RigState::Cancelling,
            _ => RigState::Stopped,
        }
    }
}

/// Why the run was cancelled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    /// User pressed the quit key
    QuitKey,
    /// Process signal (Ctrl+C / SIGTERM)
    Signal,
    /// A sensor failed fatally
    DeviceFailure { sensor: String, message: String },
    /// The display surface rejected a frame
    RenderFailure(String),
    /// Normal end of program
    EndOfRun,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelReason::QuitKey => write!(f, "quit key"),
            CancelReason::Signal => write!(f, "signal"),
            CancelReason::DeviceFailure { sensor, message } => {
                write!(f, "device failure on '{sensor}': {message}")
            }
            CancelReason::RenderFailure(message) => write!(f, "render failure: {message}"),
            CancelReason::EndOfRun => write!(f, "end of run"),
        }
    }
}

/// State transitions happen with `reason` locked, and the reason is
/// written before the state leaves Running.
#[derive(Debug, Default)]
struct Inner {
    state: AtomicU8,
    reason: Mutex<Option<CancelReason>>,
}

impl Inner {
    fn lock_reason(&self) -> MutexGuard<'_, Option<CancelReason>> {
        self.reason.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Cooperative cancellation token
///
/// Cloning shares the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    ///
    /// Returns true only for the call that moved the token out of Running;
    /// later calls are no-ops and do not replace the first reason.
    pub fn cancel(&self, reason: CancelReason) -> bool {
        let mut slot = self.inner.lock_reason();
        if self.inner.state.load(Ordering::SeqCst) != 0 {
            return false;
        }
        *slot = Some(reason);
        self.inner.state.store(1, Ordering::SeqCst);
        true
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.inner.state.load(Ordering::SeqCst) != 0
    }

    /// All producers joined and resources released
    pub fn mark_stopped(&self) {
        let _slot = self.inner.lock_reason();
        self.inner.state.store(2, Ordering::SeqCst);
    }

    pub fn state(&self) -> RigState {
        RigState::from_u8(self.inner.state.load(Ordering::SeqCst))
    }

    /// Reason recorded by the first `cancel` call
    ///
    /// Always `Some` once `is_cancelled` has returned true for a token that
    /// was cancelled rather than only marked stopped.
    pub fn reason(&self) -> Option<CancelReason> {
        self.inner.lock_reason().clone()
    }
}
