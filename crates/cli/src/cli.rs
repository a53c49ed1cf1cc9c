//! CLI argument definitions using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Rate Sync - multi-rate sensor acquisition and synchronization rig
#[derive(Parser, Debug, Clone)]
#[command(
    name = "rate-sync",
    author,
    version,
    about = "Multi-rate sensor acquisition and synchronization rig",
    long_about = "Samples several fixed-rate tick sensors and a camera concurrently.\n\n\
                  The displayed frame advances at the target frequency, measured in \n\
                  the synthetic time of the tick sensors, and every tick value is \n\
                  drawn on top of it. Press 'q' (window or stdin) or Ctrl+C to stop.",
    after_help = "CAMERA is a device index (0 = /dev/video0), a device path, or \n\
                  stub://<label>[?fps=N&fail_every=K&disconnect_after=M] for the \n\
                  built-in synthetic camera."
)]
pub struct Cli {
    /// Capture device selector
    #[arg(value_name = "CAMERA")]
    pub camera: String,

    /// Capture resolution, e.g. 640x480
    #[arg(value_name = "RESOLUTION")]
    pub resolution: String,

    /// Target frequency of the displayed frame, in tick-delay units (seconds)
    #[arg(value_name = "FREQUENCY", allow_negative_numbers = true)]
    pub frequency: f64,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, env = "RATE_SYNC_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", env = "RATE_SYNC_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Also append logs to this file
    #[arg(long, env = "RATE_SYNC_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Rig settings file (TOML or JSON)
    #[arg(short, long, env = "RATE_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Where composed frames go
    #[arg(long, value_enum, default_value = "log", env = "RATE_SYNC_DISPLAY")]
    pub display: DisplayArg,

    /// Output directory for `--display file`
    #[arg(long, default_value = "./output", env = "RATE_SYNC_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Write every n-th frame for `--display file`
    #[arg(long, default_value = "1", env = "RATE_SYNC_DUMP_EVERY")]
    pub dump_every: u64,

    /// Override the stale-frame policy from the settings file
    #[arg(long, value_enum, env = "RATE_SYNC_STALE_FRAMES")]
    pub stale_frames: Option<StaleFramesArg>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "RATE_SYNC_METRICS_PORT")]
    pub metrics_port: u16,

    /// Stop after this many consumer iterations (0 = unlimited)
    #[arg(long, default_value = "0", env = "RATE_SYNC_MAX_ITERATIONS")]
    pub max_iterations: u64,

    /// Validate configuration and exit without opening any device
    #[arg(long)]
    pub dry_run: bool,

    /// Print the dry-run summary as JSON
    #[arg(long, requires = "dry_run")]
    pub json: bool,
}

impl Cli {
    pub fn metrics_port(&self) -> Option<u16> {
        (self.metrics_port != 0).then_some(self.metrics_port)
    }

    pub fn max_iterations(&self) -> Option<u64> {
        (self.max_iterations != 0).then_some(self.max_iterations)
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

/// Display surface selection
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayArg {
    /// Log frame summaries
    #[default]
    Log,
    /// Write PNG files
    File,
    /// On-screen window (needs the `window` feature)
    Window,
}

impl From<DisplayArg> for contracts::DisplayKind {
    fn from(arg: DisplayArg) -> Self {
        match arg {
            DisplayArg::Log => contracts::DisplayKind::Log,
            DisplayArg::File => contracts::DisplayKind::File,
            DisplayArg::Window => contracts::DisplayKind::Window,
        }
    }
}

/// Stale-frame policy override
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StaleFramesArg {
    /// Keep showing the last good frame
    Hold,
    /// Keep the last good frame and outline it in red
    Mark,
}

impl From<StaleFramesArg> for contracts::StaleFramePolicy {
    fn from(arg: StaleFramesArg) -> Self {
        match arg {
            StaleFramesArg::Hold => contracts::StaleFramePolicy::Hold,
            StaleFramesArg::Mark => contracts::StaleFramePolicy::Mark,
        }
    }
}
