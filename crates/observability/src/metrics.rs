//! Hold-advance metrics
//!
//! `metrics` facade helpers plus in-memory run statistics.

use std::collections::BTreeMap;

use contracts::HoldAdvance;
use metrics::{counter, gauge, histogram};

/// Record a hold advance
pub fn record_hold_advance(hold_counter: u64, trigger_index: usize) {
    counter!(
        "rate_sync_hold_advances_total",
        "trigger" => trigger_index.to_string()
    )
    .increment(1);
    gauge!("rate_sync_hold_counter").set(hold_counter as f64);
}

/// Record one consumer iteration
pub fn record_consumer_iteration(drained: usize) {
    counter!("rate_sync_consumer_iterations_total").increment(1);
    histogram!("rate_sync_readings_per_iteration").record(drained as f64);
}

/// Record queue depth
pub fn record_queue_depth(sensor: &str, depth: usize) {
    gauge!(
        "rate_sync_queue_depth",
        "sensor" => sensor.to_string()
    )
    .set(depth as f64);
}

/// Record a frame gap seen by the consumer
pub fn record_frame_gap() {
    counter!("rate_sync_frame_gaps_total").increment(1);
}

/// Record a composed frame handed to a display surface
pub fn record_frame_shown(surface: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "rate_sync_frames_shown_total",
        "surface" => surface.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Hold statistics aggregator
///
/// Aggregates per-run statistics in memory for the end-of-run summary.
#[derive(Debug, Clone, Default)]
pub struct HoldStats {
    /// Consumer iterations
    pub iterations: u64,

    /// Hold advances
    pub advances: u64,

    /// Frame gaps drained
    pub gaps: u64,

    /// Iterations between consecutive advances
    pub iterations_between: RunningStats,

    /// Advances per trigger sensor index
    pub triggers: BTreeMap<usize, u64>,

    since_last_advance: u64,
}

impl HoldStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update with the outcome of one consumer iteration
    pub fn record_iteration(&mut self, advance: Option<&HoldAdvance>, gap: bool) {
        self.iterations += 1;
        self.since_last_advance += 1;
        if gap {
            self.gaps += 1;
        }
        if let Some(advance) = advance {
            self.advances += 1;
            self.iterations_between
                .push(self.since_last_advance as f64);
            self.since_last_advance = 0;
            *self.triggers.entry(advance.trigger_index).or_insert(0) += 1;
        }
    }

    /// Generate summary report
    pub fn summary(&self) -> HoldSummary {
        HoldSummary {
            iterations: self.iterations,
            advances: self.advances,
            gaps: self.gaps,
            advance_rate: if self.iterations > 0 {
                self.advances as f64 / self.iterations as f64 * 100.0
            } else {
                0.0
            },
            iterations_between: StatsSummary::from(&self.iterations_between),
            triggers: self.triggers.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Hold statistics summary
#[derive(Debug, Clone, Default)]
pub struct HoldSummary {
    pub iterations: u64,
    pub advances: u64,
    pub gaps: u64,
    /// Advances per iteration, in percent
    pub advance_rate: f64,
    pub iterations_between: StatsSummary,
    pub triggers: BTreeMap<usize, u64>,
}

impl std::fmt::Display for HoldSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Hold Summary ===")?;
        writeln!(f, "Consumer iterations: {}", self.iterations)?;
        writeln!(
            f,
            "Hold advances: {} ({:.2}% of iterations)",
            self.advances, self.advance_rate
        )?;
        writeln!(f, "Frame gaps: {}", self.gaps)?;
        writeln!(f, "Iterations between advances: {}", self.iterations_between)?;

        if !self.triggers.is_empty() {
            writeln!(f, "Advances by trigger sensor:")?;
            for (index, count) in &self.triggers {
                writeln!(f, "  tick_{}: {}", index, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
