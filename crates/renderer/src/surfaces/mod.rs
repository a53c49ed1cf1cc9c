//! Display surface implementations
//!
//! Contains LogSurface, FileSurface, and WindowSurface (feature `window`).

mod file;
mod log;
#[cfg(any(feature = "window", test))]
mod slot;
#[cfg(feature = "window")]
mod window;

pub use self::file::{FileSurface, FileSurfaceConfig};
pub use self::log::LogSurface;
#[cfg(feature = "window")]
pub use self::window::{WindowQuitListener, WindowSurface};
