//! LogSurface - logs shown frames via tracing

use contracts::{ContractError, DisplaySurface};
use image::RgbImage;
use tracing::{info, instrument, trace};

/// Frames between two info-level summaries
const DEFAULT_SUMMARY_EVERY: u64 = 100;

/// Surface that logs frame summaries instead of drawing them
pub struct LogSurface {
    name: String,
    shown: u64,
    summary_every: u64,
}

impl LogSurface {
    /// Create a new LogSurface with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shown: 0,
            summary_every: DEFAULT_SUMMARY_EVERY,
        }
    }

    /// Emit an info summary every `every` frames (0 disables it)
    pub fn with_summary_every(mut self, every: u64) -> Self {
        self.summary_every = every;
        self
    }

    /// Frames shown so far
    pub fn shown(&self) -> u64 {
        self.shown
    }
}

impl DisplaySurface for LogSurface {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_surface_show",
        level = "trace",
        skip(self, image),
        fields(surface = %self.name)
    )]
    fn show(&mut self, window_name: &str, image: &RgbImage) -> Result<(), ContractError> {
        self.shown += 1;
        trace!(
            window = window_name,
            seq = self.shown,
            width = image.width(),
            height = image.height(),
            "Frame shown"
        );
        if self.summary_every > 0 && self.shown % self.summary_every == 0 {
            info!(surface = %self.name, window = window_name, shown = self.shown, "Display summary");
        }
        Ok(())
    }

    fn destroy(&mut self, window_name: &str) {
        info!(surface = %self.name, window = window_name, shown = self.shown, "LogSurface closed");
    }
}
