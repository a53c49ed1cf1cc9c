//! # Sync Engine
//!
//! Multi-rate synchronization engine.
//!
//! Responsibilities:
//! - Frequency ratios and synthetic time
//! - Non-blocking drain of the per-sensor queues
//! - Hold-advance decision for the displayed frame
//! - Consumer loop with cooperative cancellation
//!
//! ## Usage Example
//!
//! ```ignore
//! use sync_engine::{run_consumer, ConsumerOptions, Synchronizer};
//!
//! let mut sync = Synchronizer::from_config(&config)?;
//! let report = run_consumer(&ctx, &mut sync, &mut quit, |rv| renderer.render(rv), &options).await?;
//! println!("{}", report.stats.summary());
//! ```

mod consumer;
mod error;
mod ratios;
mod synchronizer;

// Re-exports
pub use consumer::{run_consumer, ConsumerOptions, ConsumerReport};
pub use error::{Result, SyncError};
pub use ratios::FrequencyRatios;
pub use synchronizer::{DrainCounters, StepOutcome, Synchronizer};

// Re-export contracts types
pub use contracts::{HoldAdvance, ResultVector};
