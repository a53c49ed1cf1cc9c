//! Capture device backends
//!
//! - `stub://<label>[?fps=N&fail_every=K&disconnect_after=M]`: synthetic camera
//! - anything else: Video4Linux2 (feature `v4l`)

mod synthetic;
#[cfg(feature = "v4l")]
mod v4l2;

pub use synthetic::{SyntheticCamera, SyntheticConfig};
#[cfg(feature = "v4l")]
pub use v4l2::V4lCamera;

use contracts::{CaptureDevice, CaptureError};
use tracing::info;

/// Prefix selecting the synthetic backend
pub const STUB_SCHEME: &str = "stub://";

/// Open a capture device from its identifier
///
/// # Errors
/// `CaptureError::Open` when the device exists but cannot be opened,
/// `CaptureError::Unsupported` when no backend handles the identifier.
pub fn open_device(identifier: &str) -> Result<Box<dyn CaptureDevice>, CaptureError> {
    if let Some(rest) = identifier.strip_prefix(STUB_SCHEME) {
        let config = SyntheticConfig::parse(rest).map_err(|message| CaptureError::Open {
            identifier: identifier.to_string(),
            message,
        })?;
        info!(device = %identifier, "opened synthetic capture device");
        return Ok(Box::new(SyntheticCamera::new(config)));
    }

    open_native(identifier)
}

#[cfg(feature = "v4l")]
fn open_native(identifier: &str) -> Result<Box<dyn CaptureDevice>, CaptureError> {
    let path = match identifier.parse::<u32>() {
        Ok(index) => format!("/dev/video{index}"),
        Err(_) => identifier.to_string(),
    };
    let camera = V4lCamera::open(&path)?;
    info!(device = %path, "opened v4l2 capture device");
    Ok(Box::new(camera))
}

#[cfg(not(feature = "v4l"))]
fn open_native(identifier: &str) -> Result<Box<dyn CaptureDevice>, CaptureError> {
    Err(CaptureError::Unsupported {
        identifier: identifier.to_string(),
    })
}
