//! Command implementations.

mod run;

pub use run::run_rig;
