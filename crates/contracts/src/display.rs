//! Output and input collaborators of the consumer context.

use image::RgbImage;

use crate::ContractError;

/// Display surface trait
///
/// All surface implementations must implement this trait.
pub trait DisplaySurface: Send {
    /// Surface name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Present a composed image in the named window
    ///
    /// # Errors
    /// Returns display error (should include context)
    fn show(&mut self, window_name: &str, image: &RgbImage) -> Result<(), ContractError>;

    /// Tear down the named window
    fn destroy(&mut self, window_name: &str);
}

/// Quit-key listener
///
/// Polled once per consumer iteration. Errors are non-fatal: the consumer
/// treats them as "not pressed".
pub trait QuitListener: Send {
    /// Whether the user asked to quit since the last poll
    fn is_quit_pressed(&mut self) -> Result<bool, ContractError>;
}

/// Listener that never requests quit
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverQuit;

impl QuitListener for NeverQuit {
    fn is_quit_pressed(&mut self) -> Result<bool, ContractError> {
        Ok(false)
    }
}
