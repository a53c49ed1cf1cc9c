//! Layered error definitions
//!
//! Categorized by source: config / device / display / io

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Device Errors =====
    /// Capture device could not be opened or failed irrecoverably
    #[error("capture device '{identifier}' failed: {message}")]
    Device { identifier: String, message: String },

    // ===== Display Errors =====
    /// Display surface rejected a frame
    #[error("display surface '{surface}' error: {message}")]
    Display { surface: String, message: String },

    /// Quit-key listener could not be polled
    #[error("quit listener error: {message}")]
    QuitListener { message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create capture device error
    pub fn device(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Device {
            identifier: identifier.into(),
            message: message.into(),
        }
    }

    /// Create display surface error
    pub fn display(surface: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Display {
            surface: surface.into(),
            message: message.into(),
        }
    }

    /// Create quit listener error
    pub fn quit_listener(message: impl Into<String>) -> Self {
        Self::QuitListener {
            message: message.into(),
        }
    }
}
