//! Video4Linux2 capture device

use std::io;
use std::sync::Arc;

use contracts::{CaptureDevice, CaptureError, Frame};
use image::RgbImage;
use ouroboros::self_referencing;
use tracing::{debug, warn};

/// errno reported once the device node disappears
const ENODEV: i32 = 19;

const BUFFER_COUNT: u32 = 4;

/// V4L2 camera
///
/// Streaming starts lazily on the first read so that `configure` can still
/// change the format on the bare device.
pub struct V4lCamera {
    path: String,
    device: Option<v4l::Device>,
    stream: Option<StreamState>,
    width: u32,
    height: u32,
}

#[self_referencing]
struct StreamState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4lCamera {
    pub fn open(path: &str) -> Result<Self, CaptureError> {
        use v4l::video::Capture;

        let device = v4l::Device::with_path(path).map_err(|e| CaptureError::Open {
            identifier: path.to_string(),
            message: e.to_string(),
        })?;
        let format = device.format().map_err(|e| CaptureError::Open {
            identifier: path.to_string(),
            message: format!("read format: {e}"),
        })?;

        Ok(Self {
            path: path.to_string(),
            width: format.width,
            height: format.height,
            device: Some(device),
            stream: None,
        })
    }

    fn start_stream(&mut self) -> Result<(), CaptureError> {
        use v4l::buffer::Type;

        let device = self.device.take().ok_or_else(|| CaptureError::Disconnected {
            message: format!("{} released", self.path),
        })?;
        let state = StreamStateTryBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, BUFFER_COUNT)
            },
        }
        .try_build()
        .map_err(|e| map_io_error(&self.path, e))?;
        self.stream = Some(state);
        debug!(device = %self.path, "v4l2 stream started");
        Ok(())
    }
}

fn map_io_error(path: &str, err: io::Error) -> CaptureError {
    if err.raw_os_error() == Some(ENODEV) {
        CaptureError::Disconnected {
            message: format!("{path}: {err}"),
        }
    } else {
        CaptureError::Read {
            message: format!("{path}: {err}"),
        }
    }
}

impl CaptureDevice for V4lCamera {
    fn configure(&mut self, width: u32, height: u32) -> Result<(), CaptureError> {
        use v4l::video::Capture;

        let device = self.device.as_mut().ok_or_else(|| CaptureError::Configure {
            width,
            height,
            message: "device is already streaming".into(),
        })?;
        let configure_err = |e: io::Error| CaptureError::Configure {
            width,
            height,
            message: e.to_string(),
        };

        let mut format = device.format().map_err(configure_err)?;
        format.width = width;
        format.height = height;
        format.fourcc = v4l::FourCC::new(b"RGB3");
        let applied = device.set_format(&format).map_err(configure_err)?;

        if applied.fourcc != v4l::FourCC::new(b"RGB3") {
            return Err(CaptureError::Configure {
                width,
                height,
                message: format!("device does not support RGB3 (got {})", applied.fourcc),
            });
        }
        if applied.width != width || applied.height != height {
            warn!(
                device = %self.path,
                requested = %format!("{width}x{height}"),
                applied = %format!("{}x{}", applied.width, applied.height),
                "device adjusted capture resolution"
            );
        }
        self.width = applied.width;
        self.height = applied.height;
        Ok(())
    }

    fn read(&mut self) -> Result<Frame, CaptureError> {
        use v4l::io::traits::CaptureStream;

        if self.stream.is_none() {
            self.start_stream()?;
        }
        let Some(state) = self.stream.as_mut() else {
            return Err(CaptureError::Disconnected {
                message: format!("{} released", self.path),
            });
        };

        let data = state
            .with_mut(|fields| fields.stream.next().map(|(buf, _meta)| buf.to_vec()))
            .map_err(|e| map_io_error(&self.path, e))?;

        let image = RgbImage::from_raw(self.width, self.height, data).ok_or_else(|| {
            CaptureError::Read {
                message: format!(
                    "{}: short buffer for {}x{} RGB frame",
                    self.path, self.width, self.height
                ),
            }
        })?;
        Ok(Arc::new(image))
    }

    fn release(&mut self) {
        self.stream = None;
        self.device = None;
        debug!(device = %self.path, "v4l2 device released");
    }

    fn is_opened(&self) -> bool {
        self.device.is_some() || self.stream.is_some()
    }
}
