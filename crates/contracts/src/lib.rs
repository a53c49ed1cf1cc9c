//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the rig.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Index Model
//! - Tick sensors occupy queue indices `0..N`
//! - The frame sensor occupies index `N`
//! - `ResultVector` mirrors that layout: N tick values plus the held frame

mod capture;
mod display;
mod error;
mod rig;
mod runtime;
mod sensor;
mod sensor_source;
mod sync;

pub use capture::{CaptureDevice, CaptureError};
pub use display::{DisplaySurface, NeverQuit, QuitListener};
pub use error::*;
pub use rig::*;
pub use runtime::*;
pub use sensor::*;
pub use sensor_source::{Sensor, SensorError};
pub use sync::*;
