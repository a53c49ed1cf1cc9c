//! RigContext - shared run state
//!
//! Built once at startup and handed to every producer and to the consumer.

use std::sync::Arc;

use contracts::CancellationToken;

use crate::counters::IngestionMetrics;
use crate::queue::SensorQueues;

/// Shared state of one acquisition run
#[derive(Debug, Clone)]
pub struct RigContext {
    pub cancel: CancellationToken,
    pub queues: Arc<SensorQueues>,
    pub metrics: Arc<IngestionMetrics>,
}

impl RigContext {
    /// Context for `tick_count` tick sensors plus one frame sensor
    pub fn new(tick_count: usize) -> Self {
        let count = tick_count + 1;
        Self {
            cancel: CancellationToken::new(),
            queues: Arc::new(SensorQueues::new(count)),
            metrics: Arc::new(IngestionMetrics::new(count)),
        }
    }

    /// Queue index of the frame sensor
    pub fn frame_index(&self) -> usize {
        self.queues.len().saturating_sub(1)
    }

    /// Number of tick sensors
    pub fn tick_count(&self) -> usize {
        self.frame_index()
    }
}
