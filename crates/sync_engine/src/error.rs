//! Sync engine error types

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SyncError {
    /// No tick sensor to derive ratios from
    #[error("at least one tick sensor delay is required")]
    NoTickSensors,

    /// Delay is zero, negative or not a number
    #[error("tick delay {index} must be finite and > 0, got {delay}")]
    InvalidDelay { index: usize, delay: f64 },

    /// Target frequency lower than the fastest tick delay
    #[error("target frequency {frequency} is below the fastest tick delay {min_delay}")]
    FrequencyTooLow { frequency: f64, min_delay: f64 },

    /// Tick count of the synchronizer does not match the queue layout
    #[error("synchronizer expects {expected} tick queues, context has {actual}")]
    LayoutMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, SyncError>;
