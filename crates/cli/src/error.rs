//! Error types for CLI operations.

use contracts::CancelReason;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Capture device could not be opened or configured
    #[error("Failed to open camera '{camera}': {message}")]
    DeviceOpen { camera: String, message: String },

    /// Requested display surface is not available in this build
    #[error("Display '{display}' is not available: {message}")]
    DisplayUnavailable { display: String, message: String },

    /// Run ended because of a failure rather than a stop request
    #[error("Run aborted: {reason}")]
    RunAborted { reason: CancelReason },

    /// A producer thread did not shut down cleanly
    #[error("Error during shutdown: {message}")]
    Shutdown { message: String },
}

impl CliError {
    pub fn device_open(camera: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DeviceOpen {
            camera: camera.into(),
            message: message.into(),
        }
    }

    pub fn display_unavailable(display: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DisplayUnavailable {
            display: display.into(),
            message: message.into(),
        }
    }

    pub fn shutdown(message: impl Into<String>) -> Self {
        Self::Shutdown {
            message: message.into(),
        }
    }
}
