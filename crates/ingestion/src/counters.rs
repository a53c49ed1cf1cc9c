//! Ingestion counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Per-sensor counters
#[derive(Debug, Default)]
pub struct SensorCounters {
    /// Readings published
    pub readings: AtomicU64,

    /// Transient failures (published as gaps)
    pub transient_errors: AtomicU64,

    /// Fatal failures (at most one per run)
    pub fatal_errors: AtomicU64,
}

/// Ingestion metrics, indexed like the queues
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    sensors: Vec<SensorCounters>,
}

impl IngestionMetrics {
    /// Create metrics for `count` sensors
    pub fn new(count: usize) -> Self {
        Self {
            sensors: (0..count).map(|_| SensorCounters::default()).collect(),
        }
    }

    /// Record a published reading
    pub fn record_reading(&self, index: usize) {
        if let Some(c) = self.sensors.get(index) {
            c.readings.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a transient failure
    pub fn record_transient(&self, index: usize) {
        if let Some(c) = self.sensors.get(index) {
            c.transient_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a fatal failure
    pub fn record_fatal(&self, index: usize) {
        if let Some(c) = self.sensors.get(index) {
            c.fatal_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sensors: self
                .sensors
                .iter()
                .map(|c| SensorSnapshot {
                    readings: c.readings.load(Ordering::Relaxed),
                    transient_errors: c.transient_errors.load(Ordering::Relaxed),
                    fatal_errors: c.fatal_errors.load(Ordering::Relaxed),
                })
                .collect(),
        }
    }
}

/// Snapshot of one sensor's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorSnapshot {
    pub readings: u64,
    pub transient_errors: u64,
    pub fatal_errors: u64,
}

/// Metrics snapshot
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub sensors: Vec<SensorSnapshot>,
}

impl MetricsSnapshot {
    /// Total readings across all sensors
    pub fn total_readings(&self) -> u64 {
        self.sensors.iter().map(|s| s.readings).sum()
    }

    /// Total transient failures across all sensors
    pub fn total_transient(&self) -> u64 {
        self.sensors.iter().map(|s| s.transient_errors).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let metrics = IngestionMetrics::new(2);
        metrics.record_reading(0);
        metrics.record_reading(0);
        metrics.record_transient(1);
        metrics.record_reading(7);

        let snap = metrics.snapshot();
        assert_eq!(snap.sensors[0].readings, 2);
        assert_eq!(snap.sensors[1].transient_errors, 1);
        assert_eq!(snap.total_readings(), 2);
        assert_eq!(snap.total_transient(), 1);
    }
}
