//! # Ingestion
//!
//! Sensor sampling module.
//!
//! Responsibilities:
//! - Tick sensors and the camera frame sensor
//! - Capture backends (synthetic `stub://`, V4L2)
//! - One unbounded queue per sensor index
//! - Producer threads with cooperative cancellation
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{spawn_producer, RigContext, TickSensor};
//!
//! let ctx = RigContext::new(1);
//! let handle = spawn_producer(TickSensor::with_delay_secs("tick_0", 0.01)?, 0, &ctx)?;
//!
//! // ... consumer drains ctx.queues ...
//!
//! ctx.cancel.cancel(contracts::CancelReason::EndOfRun);
//! let (sensor, _exit) = handle.join()?;
//! ```

pub mod capture;
pub mod clock;
mod context;
mod counters;
mod error;
mod frame;
mod producer;
mod queue;
mod tick;

// Re-exports
pub use capture::open_device;
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::RigContext;
pub use counters::{IngestionMetrics, MetricsSnapshot, SensorCounters, SensorSnapshot};
pub use error::{IngestionError, Result};
pub use frame::FrameSensor;
pub use producer::{run_producer, spawn_producer, ProducerExit, ProducerHandle};
pub use queue::{QueuePublisher, SensorQueues};
pub use tick::TickSensor;
