//! Run statistics.

use std::time::Duration;

use contracts::CancelReason;
use ingestion::MetricsSnapshot;
use observability::HoldStats;

/// Statistics from a rig run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total duration of the run
    pub duration: Duration,

    /// Sensor names in queue order (ticks, then the camera)
    pub sensor_names: Vec<String>,

    /// Readings drained by the consumer per queue index
    pub readings_drained: Vec<u64>,

    /// Producer-side counters per queue index
    pub ingestion: MetricsSnapshot,

    /// Frames read from the capture device
    pub frames_captured: u64,

    /// Composed frames accepted by the display surface
    pub frames_shown: u64,

    /// Why the run stopped
    pub reason: Option<CancelReason>,

    /// Hold-advance statistics
    pub hold: HoldStats,
}

impl PipelineStats {
    /// Hold advances per second
    pub fn advance_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.hold.advances as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Whether the run stopped because something broke
    pub fn is_failure(&self) -> bool {
        matches!(
            self.reason,
            Some(CancelReason::DeviceFailure { .. }) | Some(CancelReason::RenderFailure(_))
        )
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Run Statistics ===\n");

        println!("Overview");
        println!("   Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   Frames captured: {}", self.frames_captured);
        println!("   Frames shown: {}", self.frames_shown);
        println!("   Hold advances/s: {:.2}", self.advance_rate());
        match &self.reason {
            Some(reason) => println!("   Stopped by: {reason}"),
            None => println!("   Stopped by: unknown"),
        }

        println!("\nSensors");
        for (index, name) in self.sensor_names.iter().enumerate() {
            let counters = self.ingestion.sensors.get(index).copied().unwrap_or_default();
            let drained = self.readings_drained.get(index).copied().unwrap_or(0);
            println!(
                "   {name}: produced={} drained={} transient_errors={} fatal_errors={}",
                counters.readings, drained, counters.transient_errors, counters.fatal_errors
            );
        }

        println!("\n{}", self.hold.summary());
    }
}
