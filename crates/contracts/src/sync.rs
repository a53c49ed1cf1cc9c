//! ResultVector - Sync Engine output
//!
//! Latest tick value per sensor plus the held (displayed) frame.

use crate::{blank_frame, Frame};

/// Synchronized state handed to the renderer
#[derive(Debug, Clone)]
pub struct ResultVector {
    /// Latest tick value per tick sensor (0 until the first reading)
    pub ticks: Vec<u64>,

    /// Currently held frame
    pub held: Frame,

    /// Held frame was taken from a stale frame buffer
    pub held_stale: bool,

    /// Number of times the held frame has advanced
    pub hold_counter: u64,
}

impl ResultVector {
    /// Initial state: zero ticks and a blank held frame
    pub fn new(tick_count: usize, width: u32, height: u32) -> Self {
        Self {
            ticks: vec![0; tick_count],
            held: blank_frame(width, height),
            held_stale: false,
            hold_counter: 0,
        }
    }

    /// Number of tick sensors
    pub fn tick_count(&self) -> usize {
        self.ticks.len()
    }
}

/// A single hold advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldAdvance {
    /// Tick sensor whose synthetic time crossed the threshold first
    pub trigger_index: usize,

    /// Hold counter after the advance
    pub hold_counter: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_result_vector() {
        let rv = ResultVector::new(3, 8, 6);
        assert_eq!(rv.ticks, vec![0, 0, 0]);
        assert_eq!(rv.tick_count(), 3);
        assert_eq!(rv.held.dimensions(), (8, 6));
        assert_eq!(rv.hold_counter, 0);
        assert!(!rv.held_stale);
    }
}
