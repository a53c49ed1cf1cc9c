//! Synthetic camera (`stub://`)
//!
//! Moving gradient frames with optional pacing and fault injection.

use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{CaptureDevice, CaptureError, Frame};
use image::{Rgb, RgbImage};

/// Synthetic camera parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyntheticConfig {
    pub label: String,
    /// Read pacing in frames per second (0 = as fast as asked)
    pub fps: u32,
    /// Every K-th read fails transiently (0 = never)
    pub fail_every: u64,
    /// Reads after which the device disconnects (None = never)
    pub disconnect_after: Option<u64>,
}

impl SyntheticConfig {
    /// Parse `<label>[?key=value&...]`
    pub fn parse(selector: &str) -> Result<Self, String> {
        let (label, query) = match selector.split_once('?') {
            Some((label, query)) => (label, Some(query)),
            None => (selector, None),
        };
        let mut config = Self {
            label: label.to_string(),
            fps: 30,
            ..Default::default()
        };

        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected key=value, got '{pair}'"))?;
            let parse_u64 = || {
                value
                    .parse::<u64>()
                    .map_err(|_| format!("'{key}' expects an unsigned integer, got '{value}'"))
            };
            match key {
                "fps" => {
                    config.fps = value
                        .parse()
                        .map_err(|_| format!("'fps' expects an unsigned integer, got '{value}'"))?
                }
                "fail_every" => config.fail_every = parse_u64()?,
                "disconnect_after" => config.disconnect_after = Some(parse_u64()?),
                other => return Err(format!("unknown parameter '{other}'")),
            }
        }
        Ok(config)
    }
}

/// Synthetic capture device
pub struct SyntheticCamera {
    config: SyntheticConfig,
    width: u32,
    height: u32,
    reads: u64,
    opened: bool,
    last_read_at: Option<Instant>,
}

impl SyntheticCamera {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            width: 640,
            height: 480,
            reads: 0,
            opened: true,
            last_read_at: None,
        }
    }

    /// Number of read attempts so far
    pub fn reads(&self) -> u64 {
        self.reads
    }

    fn pace(&mut self) {
        if self.config.fps == 0 {
            return;
        }
        let period = Duration::from_secs_f64(1.0 / f64::from(self.config.fps));
        if let Some(last) = self.last_read_at {
            let elapsed = last.elapsed();
            if elapsed < period {
                std::thread::sleep(period - elapsed);
            }
        }
        self.last_read_at = Some(Instant::now());
    }

    fn render(&self) -> RgbImage {
        let shift = self.reads;
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let v = ((u64::from(x) + u64::from(y) + shift) % 256) as u8;
            Rgb([v, v.wrapping_add(85), v.wrapping_add(170)])
        })
    }
}

impl CaptureDevice for SyntheticCamera {
    fn configure(&mut self, width: u32, height: u32) -> Result<(), CaptureError> {
        if width == 0 || height == 0 {
            return Err(CaptureError::Configure {
                width,
                height,
                message: "dimensions must be > 0".into(),
            });
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn read(&mut self) -> Result<Frame, CaptureError> {
        if !self.opened {
            return Err(CaptureError::Disconnected {
                message: format!("{} released", self.config.label),
            });
        }
        self.pace();
        self.reads += 1;

        if let Some(limit) = self.config.disconnect_after {
            if self.reads > limit {
                self.opened = false;
                return Err(CaptureError::Disconnected {
                    message: format!("{} disconnected after {limit} reads", self.config.label),
                });
            }
        }
        if self.config.fail_every > 0 && self.reads % self.config.fail_every == 0 {
            return Err(CaptureError::Read {
                message: format!("{} dropped read #{}", self.config.label, self.reads),
            });
        }
        Ok(Arc::new(self.render()))
    }

    fn release(&mut self) {
        self.opened = false;
    }

    fn is_opened(&self) -> bool {
        self.opened
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(selector: &str) -> SyntheticCamera {
        SyntheticCamera::new(SyntheticConfig::parse(selector).unwrap())
    }

    #[test]
    fn test_parse_defaults() {
        let config = SyntheticConfig::parse("front").unwrap();
        assert_eq!(config.label, "front");
        assert_eq!(config.fps, 30);
        assert_eq!(config.fail_every, 0);
        assert_eq!(config.disconnect_after, None);
    }

    #[test]
    fn test_parse_query() {
        let config = SyntheticConfig::parse("cam?fps=0&fail_every=3&disconnect_after=10").unwrap();
        assert_eq!(config.fps, 0);
        assert_eq!(config.fail_every, 3);
        assert_eq!(config.disconnect_after, Some(10));
    }

    #[test]
    fn test_parse_rejects_unknown_key() {
        assert!(SyntheticConfig::parse("cam?speed=2").is_err());
        assert!(SyntheticConfig::parse("cam?fps").is_err());
    }

    #[test]
    fn test_frames_move() {
        let mut cam = camera("cam?fps=0");
        cam.configure(4, 4).unwrap();
        let a = cam.read().unwrap();
        let b = cam.read().unwrap();
        assert_ne!(a.get_pixel(0, 0), b.get_pixel(0, 0));
    }

    #[test]
    fn test_fail_every() {
        let mut cam = camera("cam?fps=0&fail_every=3");
        cam.configure(2, 2).unwrap();
        assert!(cam.read().is_ok());
        assert!(cam.read().is_ok());
        assert!(matches!(cam.read(), Err(CaptureError::Read { .. })));
        assert!(cam.read().is_ok());
    }

    #[test]
    fn test_disconnect_after() {
        let mut cam = camera("cam?fps=0&disconnect_after=2");
        cam.configure(2, 2).unwrap();
        assert!(cam.read().is_ok());
        assert!(cam.read().is_ok());
        assert!(matches!(cam.read(), Err(CaptureError::Disconnected { .. })));
        assert!(!cam.is_opened());
    }

    #[test]
    fn test_configure_rejects_zero() {
        let mut cam = camera("cam");
        assert!(matches!(
            cam.configure(0, 10),
            Err(CaptureError::Configure { .. })
        ));
    }
}
