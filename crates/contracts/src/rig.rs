//! RigConfig - Config Loader output
//!
//! Describes one acquisition run: tick sensors, capture device, target
//! frequency, overlay style and output surface.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Capture resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// What to do with the frame buffer when a capture fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleFramePolicy {
    /// Keep the last good frame, count the gap
    #[default]
    Hold,
    /// Keep the last good frame but flag it stale until a fresh one arrives
    Mark,
}

/// Output surface selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayKind {
    /// Log each composed frame
    #[default]
    Log,
    /// Write composed frames as PNG files
    File,
    /// On-screen window
    Window,
}

impl DisplayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayKind::Log => "log",
            DisplayKind::File => "file",
            DisplayKind::Window => "window",
        }
    }
}

/// Overlay text placement and color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayStyle {
    /// Left edge of every text row (pixels)
    #[serde(default = "default_origin_x")]
    pub origin_x: u32,

    /// Row i baseline sits at (i + 1) * row_height
    #[serde(default = "default_row_height")]
    pub row_height: u32,

    /// Glyph scale factor
    #[serde(default = "default_scale")]
    pub scale: u32,

    /// Text color (RGB)
    #[serde(default = "default_color")]
    pub color: [u8; 3],
}

fn default_origin_x() -> u32 {
    50
}

fn default_row_height() -> u32 {
    50
}

fn default_scale() -> u32 {
    3
}

fn default_color() -> [u8; 3] {
    [0, 255, 0]
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            origin_x: default_origin_x(),
            row_height: default_row_height(),
            scale: default_scale(),
            color: default_color(),
        }
    }
}

/// Rig settings (file-backed part of the configuration)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigSettings {
    /// Fixed delay of every tick sensor, in seconds
    #[serde(default = "default_tick_delays")]
    pub tick_delays_s: Vec<f64>,

    /// Upper bound on the consumer's wait between iterations
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Display window name
    #[serde(default = "default_window_name")]
    pub window_name: String,

    /// Behavior on transient capture failures
    #[serde(default)]
    pub stale_frame_policy: StaleFramePolicy,

    /// Consecutive transient capture failures tolerated before giving up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_failure_limit: Option<u32>,

    #[serde(default)]
    pub overlay: OverlayStyle,
}

fn default_tick_delays() -> Vec<f64> {
    vec![0.01, 0.1, 1.0]
}

fn default_poll_interval_ms() -> u64 {
    1
}

fn default_window_name() -> String {
    "cam".to_string()
}

impl Default for RigSettings {
    fn default() -> Self {
        Self {
            tick_delays_s: default_tick_delays(),
            poll_interval_ms: default_poll_interval_ms(),
            window_name: default_window_name(),
            stale_frame_policy: StaleFramePolicy::default(),
            frame_failure_limit: None,
            overlay: OverlayStyle::default(),
        }
    }
}

impl RigSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Delay of the fastest tick sensor
    pub fn min_delay(&self) -> Option<f64> {
        self.tick_delays_s.iter().copied().reduce(f64::min)
    }
}

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigConfig {
    /// Capture device selector
    pub camera: String,

    pub resolution: Resolution,

    /// Target frequency, in the same unit as the tick delays
    pub frequency: f64,

    #[serde(flatten)]
    pub settings: RigSettings,
}

impl RigConfig {
    /// Number of tick sensors (the frame sensor sits at this index)
    pub fn tick_count(&self) -> usize {
        self.settings.tick_delays_s.len()
    }

    /// Name of the tick sensor at `index`
    pub fn tick_name(index: usize) -> String {
        format!("tick_{index}")
    }
}
