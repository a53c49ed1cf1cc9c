//! Renderer - composes the overlay and hands it to a display surface

use contracts::{DisplaySurface, OverlayStyle, ResultVector};
use tracing::{debug, info, instrument, warn};

use crate::error::RenderError;
use crate::overlay::compose_overlay;

/// Renderer owning one display surface
///
/// Closing is idempotent; a renderer dropped without `close` tears the
/// window down itself.
pub struct Renderer {
    surface: Box<dyn DisplaySurface>,
    window_name: String,
    style: OverlayStyle,
    frames_shown: u64,
    closed: bool,
}

impl Renderer {
    pub fn new(
        surface: Box<dyn DisplaySurface>,
        window_name: impl Into<String>,
        style: OverlayStyle,
    ) -> Self {
        let window_name = window_name.into();
        debug!(surface = surface.name(), window = %window_name, "Renderer created");
        Self {
            surface,
            window_name,
            style,
            frames_shown: 0,
            closed: false,
        }
    }

    pub fn window_name(&self) -> &str {
        &self.window_name
    }

    pub fn surface_name(&self) -> &str {
        self.surface.name()
    }

    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Compose the overlay for `result` and show it
    #[instrument(
        name = "render",
        level = "trace",
        skip(self, result),
        fields(window = %self.window_name, hold = result.hold_counter)
    )]
    pub fn render(&mut self, result: &ResultVector) -> Result<(), RenderError> {
        if self.closed {
            return Err(RenderError::Closed {
                window: self.window_name.clone(),
            });
        }

        let composed = compose_overlay(&result.held, &result.ticks, &self.style, result.held_stale);
        let shown = self.surface.show(&self.window_name, &composed);
        observability::record_frame_shown(self.surface.name(), shown.is_ok());
        shown?;

        self.frames_shown += 1;
        Ok(())
    }

    /// Destroy the window
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.surface.destroy(&self.window_name);
        info!(
            surface = self.surface.name(),
            window = %self.window_name,
            frames = self.frames_shown,
            "Renderer closed"
        );
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if !self.closed {
            warn!(window = %self.window_name, "Renderer dropped without close");
            self.close();
        }
    }
}
