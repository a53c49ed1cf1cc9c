//! Rig settings parsing
//!
//! TOML (primary) and JSON formats.

use contracts::{ContractError, RigSettings};

/// Settings file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    Json,
}

impl ConfigFormat {
    /// Infer format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn parse_toml(content: &str) -> Result<RigSettings, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

pub fn parse_json(content: &str) -> Result<RigSettings, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

pub fn parse(content: &str, format: ConfigFormat) -> Result<RigSettings, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::StaleFramePolicy;

    #[test]
    fn test_parse_toml_full() {
        let content = r#"
tick_delays_s = [0.02, 0.2]
poll_interval_ms = 5
window_name = "rig"
stale_frame_policy = "mark"
frame_failure_limit = 3

[overlay]
origin_x = 10
row_height = 20
scale = 2
color = [255, 255, 0]
"#;
        let settings = parse_toml(content).unwrap();
        assert_eq!(settings.tick_delays_s, vec![0.02, 0.2]);
        assert_eq!(settings.poll_interval_ms, 5);
        assert_eq!(settings.window_name, "rig");
        assert_eq!(settings.stale_frame_policy, StaleFramePolicy::Mark);
        assert_eq!(settings.frame_failure_limit, Some(3));
        assert_eq!(settings.overlay.row_height, 20);
        assert_eq!(settings.overlay.color, [255, 255, 0]);
    }

    #[test]
    fn test_parse_toml_empty_uses_defaults() {
        let settings = parse_toml("").unwrap();
        assert_eq!(settings, RigSettings::default());
    }

    #[test]
    fn test_parse_json_partial_overlay() {
        let settings = parse_json(r#"{ "overlay": { "scale": 1 } }"#).unwrap();
        assert_eq!(settings.overlay.scale, 1);
        assert_eq!(settings.overlay.origin_x, 50);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let err = parse_toml("invalid toml [[[").unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_parse_unknown_policy() {
        let err = parse_toml(r#"stale_frame_policy = "drop""#).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
