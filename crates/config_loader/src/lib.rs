//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse rig settings files (TOML/JSON)
//! - Parse the resolution argument
//! - Validate configuration legality
//! - Generate `RigConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use contracts::RigSettings;
//!
//! let config = ConfigLoader::build("0", "640x480", 0.05, RigSettings::default()).unwrap();
//! println!("Resolution: {}", config.resolution);
//! ```

mod parser;
mod resolution;
mod validator;

pub use contracts::{RigConfig, RigSettings};
pub use parser::ConfigFormat;
pub use resolution::parse_resolution;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load settings from files or strings and to
/// assemble the final run configuration.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load rig settings from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<RigSettings, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load rig settings from string
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<RigSettings, ContractError> {
        let settings = parser::parse(content, format)?;
        validator::validate_settings(&settings)?;
        Ok(settings)
    }

    /// Assemble and validate the run configuration
    ///
    /// Nothing is opened or spawned here; a returned error means the run
    /// must stop before acquiring any resource.
    pub fn build(
        camera: &str,
        resolution: &str,
        frequency: f64,
        settings: RigSettings,
    ) -> Result<RigConfig, ContractError> {
        let config = RigConfig {
            camera: camera.to_string(),
            resolution: parse_resolution(resolution)?,
            frequency,
            settings,
        };
        validator::validate(&config)?;
        Ok(config)
    }

    /// Validate an already assembled configuration
    pub fn validate(config: &RigConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Serialize settings to TOML string
    pub fn to_toml(settings: &RigSettings) -> Result<String, ContractError> {
        toml::to_string_pretty(settings)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize settings to JSON string
    pub fn to_json(settings: &RigSettings) -> Result<String, ContractError> {
        serde_json::to_string_pretty(settings)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }
}
