//! FileSurface - dumps shown frames as PNG files

use contracts::{ContractError, DisplaySurface};
use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument};

/// Configuration for FileSurface
#[derive(Debug, Clone)]
pub struct FileSurfaceConfig {
    /// Output directory
    pub output_dir: PathBuf,

    /// Write every n-th shown frame (1 = all)
    pub dump_every: u64,
}

impl Default for FileSurfaceConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            dump_every: 1,
        }
    }
}

/// Surface that writes composed frames to disk
pub struct FileSurface {
    name: String,
    config: FileSurfaceConfig,
    shown: u64,
    written: u64,
}

impl FileSurface {
    /// Create a new FileSurface, creating the output directory
    pub fn new(name: impl Into<String>, config: FileSurfaceConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.output_dir)?;

        Ok(Self {
            name: name.into(),
            config: FileSurfaceConfig {
                dump_every: config.dump_every.max(1),
                ..config
            },
            shown: 0,
            written: 0,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Files written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    fn frame_path(&self, window_name: &str, seq: u64) -> PathBuf {
        self.config
            .output_dir
            .join(format!("{window_name}_{seq:06}.png"))
    }

    fn save_frame(&self, path: &Path, image: &RgbImage) -> std::io::Result<()> {
        image::save_buffer(
            path,
            image.as_raw(),
            image.width(),
            image.height(),
            image::ColorType::Rgb8,
        )
        .map_err(std::io::Error::other)
    }
}

impl DisplaySurface for FileSurface {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_surface_show",
        level = "debug",
        skip(self, image),
        fields(surface = %self.name)
    )]
    fn show(&mut self, window_name: &str, image: &RgbImage) -> Result<(), ContractError> {
        self.shown += 1;
        if (self.shown - 1) % self.config.dump_every != 0 {
            return Ok(());
        }

        let path = self.frame_path(window_name, self.shown);
        self.save_frame(&path, image).map_err(|e| {
            error!(surface = %self.name, path = %path.display(), error = %e, "Write failed");
            ContractError::display(&self.name, e.to_string())
        })?;
        self.written += 1;
        debug!(path = %path.display(), "Frame written");
        Ok(())
    }

    fn destroy(&mut self, window_name: &str) {
        debug!(
            surface = %self.name,
            window = window_name,
            written = self.written,
            "FileSurface closed"
        );
    }
}
