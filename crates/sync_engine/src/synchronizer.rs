//! Synchronizer - hold-advance decision engine
//!
//! Each step drains at most one reading per queue, then decides whether the
//! held frame advances to the buffered one.

use contracts::{
    blank_frame, Frame, HoldAdvance, Reading, RigConfig, ResultVector, StaleFramePolicy,
};
use ingestion::SensorQueues;
use tracing::{debug, instrument, trace, warn};

use crate::error::Result;
use crate::ratios::FrequencyRatios;

/// Outcome of one synchronizer step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Hold advance triggered this step, if any
    pub advance: Option<HoldAdvance>,

    /// Readings popped this step (all queues)
    pub drained: usize,

    /// A gap was popped from the frame queue
    pub gap: bool,
}

/// Running totals of drained readings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainCounters {
    /// Tick readings popped per tick sensor
    pub ticks: Vec<u64>,

    /// Frames popped from the frame queue
    pub frames: u64,

    /// Gaps popped from the frame queue
    pub gaps: u64,
}

/// Hold-advance engine
#[derive(Debug)]
pub struct Synchronizer {
    ratios: FrequencyRatios,
    result: ResultVector,
    frame_buffer: Frame,
    buffer_stale: bool,
    policy: StaleFramePolicy,
    drained: DrainCounters,
}

impl Synchronizer {
    /// Create with blank initial frames of the given size
    pub fn new(ratios: FrequencyRatios, width: u32, height: u32, policy: StaleFramePolicy) -> Self {
        let tick_count = ratios.len();
        let result = ResultVector::new(tick_count, width, height);
        Self {
            frame_buffer: result.held.clone(),
            result,
            ratios,
            buffer_stale: false,
            policy,
            drained: DrainCounters {
                ticks: vec![0; tick_count],
                ..Default::default()
            },
        }
    }

    /// Build from a validated run configuration
    pub fn from_config(config: &RigConfig) -> Result<Self> {
        let ratios = FrequencyRatios::new(&config.settings.tick_delays_s, config.frequency)?;
        Ok(Self::new(
            ratios,
            config.resolution.width,
            config.resolution.height,
            config.settings.stale_frame_policy,
        ))
    }

    /// Run one iteration against the queues
    ///
    /// Tick queues occupy indices `0..N`, the frame queue index `N`.
    #[instrument(level = "trace", name = "synchronizer_step", skip_all)]
    pub fn step(&mut self, queues: &SensorQueues) -> StepOutcome {
        let mut outcome = StepOutcome::default();

        for index in 0..self.tick_count() {
            match queues.try_pop(index) {
                Some(Reading::Tick(value)) => {
                    self.ingest_tick(index, value);
                    outcome.drained += 1;
                }
                Some(_) => {
                    warn!(index, "non-tick reading in tick queue ignored");
                    outcome.drained += 1;
                }
                None => {}
            }
        }

        if let Some(reading) = queues.try_pop(self.tick_count()) {
            outcome.gap = reading.is_gap();
            self.ingest_frame(reading);
            outcome.drained += 1;
        }

        outcome.advance = self.evaluate_hold();
        outcome
    }

    /// Record the latest value of tick sensor `index`
    ///
    /// Tick values never decrease; an older value is counted as drained but
    /// leaves the recorded value unchanged.
    pub fn ingest_tick(&mut self, index: usize, value: u64) {
        let Some(slot) = self.result.ticks.get_mut(index) else {
            warn!(index, "tick for unknown sensor ignored");
            return;
        };
        if value < *slot {
            warn!(index, value, latest = *slot, "tick went backwards, keeping latest");
        }
        *slot = (*slot).max(value);
        if let Some(count) = self.drained.ticks.get_mut(index) {
            *count += 1;
        }
        trace!(index, value, "tick ingested");
    }

    /// Update the frame buffer from a frame-queue reading
    pub fn ingest_frame(&mut self, reading: Reading) {
        match reading {
            Reading::Frame(frame) => {
                self.frame_buffer = frame;
                self.buffer_stale = false;
                self.drained.frames += 1;
            }
            Reading::Gap => {
                self.drained.gaps += 1;
                if self.policy == StaleFramePolicy::Mark {
                    self.buffer_stale = true;
                }
                debug!(policy = ?self.policy, "frame gap");
            }
            Reading::Tick(value) => {
                warn!(value, "tick reading in frame queue ignored");
            }
        }
    }

    /// Apply the hold-advance test once
    ///
    /// At most one advance per call, triggered by the first sensor in index
    /// order whose synthetic time exceeds `hold_counter + 1`.
    pub fn evaluate_hold(&mut self) -> Option<HoldAdvance> {
        let trigger_index = self
            .ratios
            .first_crossing(&self.result.ticks, self.result.hold_counter)?;

        self.result.held = self.frame_buffer.clone();
        self.result.held_stale = self.buffer_stale;
        self.result.hold_counter += 1;

        let advance = HoldAdvance {
            trigger_index,
            hold_counter: self.result.hold_counter,
        };
        observability::record_hold_advance(advance.hold_counter, trigger_index);
        debug!(
            hold = advance.hold_counter,
            trigger = trigger_index,
            stale = self.result.held_stale,
            "held frame advanced"
        );
        Some(advance)
    }

    pub fn result(&self) -> &ResultVector {
        &self.result
    }

    /// Most recently buffered, not necessarily held, frame
    pub fn frame_buffer(&self) -> &Frame {
        &self.frame_buffer
    }

    pub fn is_buffer_stale(&self) -> bool {
        self.buffer_stale
    }

    pub fn hold_counter(&self) -> u64 {
        self.result.hold_counter
    }

    pub fn tick_count(&self) -> usize {
        self.result.ticks.len()
    }

    pub fn ratios(&self) -> &FrequencyRatios {
        &self.ratios
    }

    pub fn drained(&self) -> &DrainCounters {
        &self.drained
    }

    /// Reset to the initial state, keeping ratios and policy
    pub fn reset(&mut self) {
        let (width, height) = self.result.held.dimensions();
        self.result = ResultVector::new(self.tick_count(), width, height);
        self.frame_buffer = blank_frame(width, height);
        self.buffer_stale = false;
        self.drained = DrainCounters {
            ticks: vec![0; self.tick_count()],
            ..Default::default()
        };
    }
}
