//! Resolution string parsing
//!
//! Accepted form: `<width><separator><height>` where the separator is the
//! first non-digit character, e.g. `640x480`, `1280*720`, `800,600`.

use contracts::{ContractError, Resolution};

const FIELD: &str = "resolution";

/// Parse a resolution string
///
/// # Errors
/// Returns `ConfigValidation` when there is no separator or either half is
/// empty, non-numeric or zero.
pub fn parse_resolution(input: &str) -> Result<Resolution, ContractError> {
    let (split_at, separator) = input
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .ok_or_else(|| {
            ContractError::config_validation(
                FIELD,
                format!("'{input}' has no separator between width and height"),
            )
        })?;

    let width = &input[..split_at];
    let height = &input[split_at + separator.len_utf8()..];

    let width = parse_dimension(input, "width", width)?;
    let height = parse_dimension(input, "height", height)?;
    Ok(Resolution::new(width, height))
}

fn parse_dimension(input: &str, name: &str, digits: &str) -> Result<u32, ContractError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ContractError::config_validation(
            FIELD,
            format!("'{input}': {name} must be a non-empty decimal number"),
        ));
    }
    let value: u32 = digits.parse().map_err(|_| {
        ContractError::config_validation(FIELD, format!("'{input}': {name} is out of range"))
    })?;
    if value == 0 {
        return Err(ContractError::config_validation(
            FIELD,
            format!("'{input}': {name} must be > 0"),
        ));
    }
    Ok(value)
}
