//! Renderer error types

use thiserror::Error;

/// Renderer-specific errors
#[derive(Debug, Error)]
pub enum RenderError {
    /// Surface creation error
    #[error("failed to create surface '{name}': {message}")]
    SurfaceCreation { name: String, message: String },

    /// Renderer was already closed
    #[error("renderer for window '{window}' is closed")]
    Closed { window: String },

    /// Surface rejected a frame (from contract)
    #[error("surface error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Create a surface creation error
    pub fn surface_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SurfaceCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
