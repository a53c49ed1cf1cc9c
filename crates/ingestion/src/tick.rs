//! Tick sensor
//!
//! Produces 1, 2, 3, ... with a fixed delay before each value.

use std::sync::Arc;
use std::time::Duration;

use contracts::{Reading, Sensor, SensorError, SensorKind};
use tracing::trace;

use crate::clock::{Clock, SystemClock};

/// Fixed-delay counter sensor
pub struct TickSensor {
    name: String,
    delay: Duration,
    counter: u64,
    clock: Arc<dyn Clock>,
}

impl TickSensor {
    /// Create a tick sensor driven by the given clock
    pub fn new(name: impl Into<String>, delay: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: name.into(),
            delay,
            counter: 0,
            clock,
        }
    }

    /// Create a tick sensor on the wall clock, delay in seconds
    ///
    /// # Errors
    /// `SensorError::Fatal` if the delay is negative, not finite or too
    /// large for a `Duration`.
    pub fn with_delay_secs(name: impl Into<String>, delay_s: f64) -> Result<Self, SensorError> {
        let name = name.into();
        let delay = Duration::try_from_secs_f64(delay_s)
            .map_err(|e| SensorError::fatal(&name, format!("invalid delay {delay_s}s: {e}")))?;
        Ok(Self::new(name, delay, Arc::new(SystemClock::new())))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Last produced value (0 before the first sample)
    pub fn counter(&self) -> u64 {
        self.counter
    }
}

impl Sensor for TickSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SensorKind {
        SensorKind::Tick
    }

    fn produce(&mut self) -> Result<Reading, SensorError> {
        self.clock.sleep(self.delay);
        self.counter += 1;
        trace!(sensor = %self.name, value = self.counter, "tick");
        Ok(Reading::Tick(self.counter))
    }
}
