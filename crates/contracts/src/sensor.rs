//! Reading - producer output
//!
//! Values published by sensors into their per-sensor queue.

use std::sync::Arc;

use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Captured camera frame
///
/// Shared by reference count so that holding a frame, buffering it and
/// rendering it never copies pixel data. The renderer draws onto its own copy.
pub type Frame = Arc<RgbImage>;

/// Sensor type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Fixed-delay counter
    Tick,
    /// Camera frame source
    Frame,
}

impl SensorKind {
    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Tick => "tick",
            SensorKind::Frame => "frame",
        }
    }
}

/// A single sensor reading
#[derive(Debug, Clone)]
pub enum Reading {
    /// Tick sensor counter value (1-indexed, strictly increasing)
    Tick(u64),

    /// Captured frame
    Frame(Frame),

    /// The sensor failed to produce this cycle (transient capture error)
    Gap,
}

impl Reading {
    /// Tick value, if this is a tick reading
    pub fn as_tick(&self) -> Option<u64> {
        match self {
            Reading::Tick(value) => Some(*value),
            _ => None,
        }
    }

    /// Frame, if this is a frame reading
    pub fn as_frame(&self) -> Option<&Frame> {
        match self {
            Reading::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    /// Whether this reading marks a missed capture
    pub fn is_gap(&self) -> bool {
        matches!(self, Reading::Gap)
    }
}

/// Blank frame of the given size, used before the first capture arrives
pub fn blank_frame(width: u32, height: u32) -> Frame {
    Arc::new(RgbImage::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_accessors() {
        assert_eq!(Reading::Tick(3).as_tick(), Some(3));
        assert!(Reading::Tick(3).as_frame().is_none());
        assert!(Reading::Gap.is_gap());

        let frame = blank_frame(4, 2);
        let reading = Reading::Frame(frame.clone());
        assert!(Arc::ptr_eq(reading.as_frame().unwrap(), &frame));
    }

    #[test]
    fn test_blank_frame_dimensions() {
        let frame = blank_frame(640, 480);
        assert_eq!(frame.dimensions(), (640, 480));
        assert!(frame.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn test_sensor_kind_serde() {
        let json = serde_json::to_string(&SensorKind::Frame).unwrap();
        assert_eq!(json, "\"frame\"");
    }
}
