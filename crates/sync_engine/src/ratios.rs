//! Frequency ratios and synthetic time
//!
//! Every tick delay is expressed in units of the fastest one, so
//! `ratio[i] * value[i]` is the elapsed time of sensor `i` measured in
//! fastest-sensor ticks. The target frequency is normalized the same way.

use crate::error::{Result, SyncError};

/// Derived constants of the hold-advance test
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyRatios {
    ratios: Vec<f64>,
    normalized_target: f64,
}

impl FrequencyRatios {
    /// Derive ratios from tick delays and the target frequency
    pub fn new(delays: &[f64], frequency: f64) -> Result<Self> {
        for (index, delay) in delays.iter().copied().enumerate() {
            if !delay.is_finite() || delay <= 0.0 {
                return Err(SyncError::InvalidDelay { index, delay });
            }
        }
        let min_delay = delays
            .iter()
            .copied()
            .reduce(f64::min)
            .ok_or(SyncError::NoTickSensors)?;
        if !frequency.is_finite() || frequency < min_delay {
            return Err(SyncError::FrequencyTooLow {
                frequency,
                min_delay,
            });
        }

        Ok(Self {
            ratios: delays.iter().map(|d| d / min_delay).collect(),
            normalized_target: frequency / min_delay,
        })
    }

    pub fn ratios(&self) -> &[f64] {
        &self.ratios
    }

    pub fn normalized_target(&self) -> f64 {
        self.normalized_target
    }

    pub fn len(&self) -> usize {
        self.ratios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }

    /// Synthetic time of sensor `index` at tick `value`, in hold units
    pub fn progress(&self, index: usize, value: u64) -> f64 {
        self.ratios
            .get(index)
            .map(|r| r * value as f64 / self.normalized_target)
            .unwrap_or(0.0)
    }

    /// First sensor, in index order, whose progress exceeds `hold + 1`
    pub fn first_crossing(&self, ticks: &[u64], hold: u64) -> Option<usize> {
        let threshold = (hold + 1) as f64;
        ticks
            .iter()
            .enumerate()
            .find(|(index, value)| self.progress(*index, **value) > threshold)
            .map(|(index, _)| index)
    }
}
