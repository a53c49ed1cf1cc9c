//! Frame sensor
//!
//! Wraps a capture device. Read failures are transient; disconnection, or
//! too many consecutive read failures, is fatal.

use contracts::{CaptureDevice, CaptureError, Reading, Sensor, SensorError, SensorKind};
use tracing::{debug, info};

/// Camera frame sensor
pub struct FrameSensor {
    name: String,
    device: Box<dyn CaptureDevice>,
    last_error: Option<CaptureError>,
    consecutive_failures: u32,
    failure_limit: Option<u32>,
    frames_captured: u64,
    released: bool,
}

impl FrameSensor {
    /// Wrap an opened device
    ///
    /// # Errors
    /// `SensorError::Fatal` if the device does not report itself opened.
    pub fn new(name: impl Into<String>, device: Box<dyn CaptureDevice>) -> Result<Self, SensorError> {
        let name = name.into();
        if !device.is_opened() {
            return Err(SensorError::fatal(&name, "capture device is not opened"));
        }
        Ok(Self {
            name,
            device,
            last_error: None,
            consecutive_failures: 0,
            failure_limit: None,
            frames_captured: 0,
            released: false,
        })
    }

    /// Escalate to fatal after `limit` consecutive read failures
    pub fn with_failure_limit(mut self, limit: Option<u32>) -> Self {
        self.failure_limit = limit;
        self
    }

    /// Request the capture resolution
    pub fn configure(&mut self, width: u32, height: u32) -> Result<(), SensorError> {
        self.device.configure(width, height).map_err(|e| {
            let err = SensorError::fatal(&self.name, e.to_string());
            self.last_error = Some(e);
            err
        })
    }

    pub fn last_error(&self) -> Option<&CaptureError> {
        self.last_error.as_ref()
    }

    pub fn frames_captured(&self) -> u64 {
        self.frames_captured
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Sensor for FrameSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SensorKind {
        SensorKind::Frame
    }

    fn produce(&mut self) -> Result<Reading, SensorError> {
        match self.device.read() {
            Ok(frame) => {
                self.frames_captured += 1;
                self.consecutive_failures = 0;
                Ok(Reading::Frame(frame))
            }
            Err(e) => {
                let message = e.to_string();
                let transient = e.is_transient();
                self.last_error = Some(e);
                if !transient {
                    return Err(SensorError::fatal(&self.name, message));
                }

                self.consecutive_failures += 1;
                match self.failure_limit {
                    Some(limit) if self.consecutive_failures >= limit => {
                        let failures = self.consecutive_failures;
                        Err(SensorError::fatal(
                            &self.name,
                            format!("{failures} consecutive read failures, last: {message}"),
                        ))
                    }
                    _ => Err(SensorError::transient(&self.name, message)),
                }
            }
        }
    }

    fn release(&mut self) {
        if self.released {
            debug!(sensor = %self.name, "capture device already released");
            return;
        }
        self.device.release();
        self.released = true;
        info!(
            sensor = %self.name,
            frames = self.frames_captured,
            "capture device released"
        );
    }
}

impl Drop for FrameSensor {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::open_device;

    fn sensor(selector: &str) -> FrameSensor {
        let device = open_device(selector).unwrap_or_else(|e| panic!("{e}"));
        let mut sensor = FrameSensor::new("camera", device).unwrap();
        sensor.configure(8, 6).unwrap();
        sensor
    }

    #[test]
    fn test_produces_frames() {
        let mut sensor = sensor("stub://cam?fps=0");
        let reading = sensor.produce().unwrap();
        assert_eq!(reading.as_frame().unwrap().dimensions(), (8, 6));
        assert_eq!(sensor.frames_captured(), 1);
        assert_eq!(sensor.kind(), SensorKind::Frame);
    }

    #[test]
    fn test_read_failure_is_transient() {
        let mut sensor = sensor("stub://cam?fps=0&fail_every=2");
        assert!(sensor.produce().is_ok());
        let err = sensor.produce().unwrap_err();
        assert!(!err.is_fatal());
        assert!(matches!(sensor.last_error(), Some(CaptureError::Read { .. })));
        assert!(sensor.produce().is_ok());
    }

    #[test]
    fn test_disconnect_is_fatal() {
        let mut sensor = sensor("stub://cam?fps=0&disconnect_after=1");
        assert!(sensor.produce().is_ok());
        assert!(sensor.produce().unwrap_err().is_fatal());
    }

    #[test]
    fn test_failure_limit_escalates() {
        let mut sensor = sensor("stub://cam?fps=0&fail_every=1").with_failure_limit(Some(3));
        assert!(!sensor.produce().unwrap_err().is_fatal());
        assert!(!sensor.produce().unwrap_err().is_fatal());
        assert!(sensor.produce().unwrap_err().is_fatal());
    }

    #[test]
    fn test_release_once() {
        let mut sensor = sensor("stub://cam?fps=0");
        sensor.release();
        assert!(sensor.is_released());
        sensor.release();
        assert!(sensor.is_released());
    }
}
