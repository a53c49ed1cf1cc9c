//! Sensor trait - sampling abstraction
//!
//! A sensor has a single capability: produce the next reading.
//! Tick sensors and the frame sensor implement it; the producer loop drives
//! any of them the same way.

use thiserror::Error;

use crate::{Reading, SensorKind};

/// Failure to produce a reading
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SensorError {
    /// One sample was lost; the producer keeps running
    #[error("transient failure on sensor '{sensor}': {message}")]
    Transient { sensor: String, message: String },

    /// The sensor cannot produce any more readings; the run must stop
    #[error("fatal failure on sensor '{sensor}': {message}")]
    Fatal { sensor: String, message: String },
}

impl SensorError {
    /// Create transient error
    pub fn transient(sensor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transient {
            sensor: sensor.into(),
            message: message.into(),
        }
    }

    /// Create fatal error
    pub fn fatal(sensor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fatal {
            sensor: sensor.into(),
            message: message.into(),
        }
    }

    /// Whether the error must stop the producer
    pub fn is_fatal(&self) -> bool {
        matches!(self, SensorError::Fatal { .. })
    }
}

/// Sensor trait
///
/// # Example
///
/// ```ignore
/// let mut sensor = TickSensor::new("tick_0", Duration::from_millis(10), clock);
/// assert_eq!(sensor.produce()?.as_tick(), Some(1));
/// ```
pub trait Sensor: Send {
    /// Sensor name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Sensor type
    fn kind(&self) -> SensorKind;

    /// Produce the next reading, blocking for as long as sampling takes
    fn produce(&mut self) -> Result<Reading, SensorError>;

    /// Release any external resource held by the sensor
    ///
    /// Called once, after every producer loop has been joined.
    fn release(&mut self) {}
}
