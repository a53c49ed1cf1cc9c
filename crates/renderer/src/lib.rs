//! # Renderer
//!
//! Overlay composition and display surfaces.
//!
//! - `compose_overlay`: pure function drawing tick values onto a copy of the held frame
//! - `Renderer`: owns a display surface and the window name
//! - Surfaces: log (default), PNG dump, on-screen window (feature `window`)

pub mod error;
pub mod font;
pub mod overlay;
pub mod renderer;
pub mod surfaces;

pub use error::RenderError;
pub use overlay::compose_overlay;
pub use renderer::Renderer;
pub use surfaces::{FileSurface, FileSurfaceConfig, LogSurface};

#[cfg(feature = "window")]
pub use surfaces::{WindowQuitListener, WindowSurface};
