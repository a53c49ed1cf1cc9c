//! CaptureDevice trait - video capture collaborator

use thiserror::Error;

use crate::Frame;

/// Capture device errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    /// Device could not be opened (fatal)
    #[error("cannot open capture device '{identifier}': {message}")]
    Open { identifier: String, message: String },

    /// Device refused the requested format
    #[error("cannot configure capture device to {width}x{height}: {message}")]
    Configure {
        width: u32,
        height: u32,
        message: String,
    },

    /// A single read failed (transient)
    #[error("read failed: {message}")]
    Read { message: String },

    /// Device is gone (fatal)
    #[error("device disconnected: {message}")]
    Disconnected { message: String },

    /// No backend available for this identifier (fatal)
    #[error("no capture backend for '{identifier}'")]
    Unsupported { identifier: String },
}

impl CaptureError {
    /// Whether the device can keep producing after this error
    pub fn is_transient(&self) -> bool {
        matches!(self, CaptureError::Read { .. } | CaptureError::Configure { .. })
    }
}

/// Capture device
///
/// Opened by a backend-specific constructor; the frame sensor owns the
/// device and releases it exactly once during shutdown.
pub trait CaptureDevice: Send {
    /// Request capture resolution
    fn configure(&mut self, width: u32, height: u32) -> Result<(), CaptureError>;

    /// Read the next frame, blocking until one is available
    fn read(&mut self) -> Result<Frame, CaptureError>;

    /// Release the device
    fn release(&mut self);

    /// Whether the device is open and readable
    fn is_opened(&self) -> bool;
}
