//! Rig configuration validation
//!
//! Rules:
//! - at least one tick sensor
//! - every tick delay finite, > 0 and representable as a `Duration`
//! - target frequency finite and >= the fastest tick delay
//! - width / height > 0
//! - poll interval > 0
//! - overlay scale and row height > 0

use std::time::Duration;

use contracts::{ContractError, RigConfig, RigSettings};

/// Validate settings on their own (file-backed part)
///
/// Returns the first error encountered, or Ok(()).
pub fn validate_settings(settings: &RigSettings) -> Result<(), ContractError> {
    validate_tick_delays(settings)?;
    validate_poll_interval(settings)?;
    validate_overlay(settings)?;
    Ok(())
}

/// Validate a complete run configuration
pub fn validate(config: &RigConfig) -> Result<(), ContractError> {
    validate_settings(&config.settings)?;
    validate_resolution(config)?;
    validate_frequency(config)?;
    Ok(())
}

fn validate_tick_delays(settings: &RigSettings) -> Result<(), ContractError> {
    if settings.tick_delays_s.is_empty() {
        return Err(ContractError::config_validation(
            "tick_delays_s",
            "at least one tick sensor is required",
        ));
    }
    for (idx, delay) in settings.tick_delays_s.iter().enumerate() {
        if !delay.is_finite() || *delay <= 0.0 {
            return Err(ContractError::config_validation(
                format!("tick_delays_s[{idx}]"),
                format!("delay must be finite and > 0, got {delay}"),
            ));
        }
        if let Err(e) = Duration::try_from_secs_f64(*delay) {
            return Err(ContractError::config_validation(
                format!("tick_delays_s[{idx}]"),
                format!("delay {delay}s is out of range: {e}"),
            ));
        }
    }
    Ok(())
}

fn validate_poll_interval(settings: &RigSettings) -> Result<(), ContractError> {
    if settings.poll_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "poll_interval_ms",
            "poll interval must be > 0",
        ));
    }
    Ok(())
}

fn validate_overlay(settings: &RigSettings) -> Result<(), ContractError> {
    if settings.overlay.scale == 0 {
        return Err(ContractError::config_validation(
            "overlay.scale",
            "scale must be > 0",
        ));
    }
    if settings.overlay.row_height == 0 {
        return Err(ContractError::config_validation(
            "overlay.row_height",
            "row height must be > 0",
        ));
    }
    Ok(())
}

fn validate_resolution(config: &RigConfig) -> Result<(), ContractError> {
    if config.resolution.width == 0 || config.resolution.height == 0 {
        return Err(ContractError::config_validation(
            "resolution",
            format!("width and height must be > 0, got {}", config.resolution),
        ));
    }
    Ok(())
}

fn validate_frequency(config: &RigConfig) -> Result<(), ContractError> {
    let frequency = config.frequency;
    if !frequency.is_finite() {
        return Err(ContractError::config_validation(
            "frequency",
            format!("frequency must be finite, got {frequency}"),
        ));
    }
    // Delays are already validated non-empty
    let min_delay = config.settings.min_delay().unwrap_or(f64::INFINITY);
    if frequency < min_delay {
        return Err(ContractError::config_validation(
            "frequency",
            format!("frequency {frequency} is below the fastest tick delay {min_delay}"),
        ));
    }
    Ok(())
}
