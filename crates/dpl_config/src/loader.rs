//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::LegalizerConfig;
use std::path::Path;

/// Loads and validates a legalizer configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<LegalizerConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a legalizer configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<LegalizerConfig, ConfigError> {
    let config: LegalizerConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks that grid dimensions are positive and fractions are in range.
pub fn validate_config(config: &LegalizerConfig) -> Result<(), ConfigError> {
    let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

    if config.technology.site_width <= 0 {
        return invalid("technology.site_width must be positive");
    }
    if config.technology.row_height <= 0 {
        return invalid("technology.row_height must be positive");
    }
    if config.search.bin_width == 0 {
        return invalid("search.bin_width must be positive");
    }
    if config.search.window_rows == 0 || config.search.window_sites == 0 {
        return invalid("search window must be non-empty");
    }
    for (name, value) in [
        ("refine.percent", config.refine.percent),
        ("refine.group_percent", config.refine.group_percent),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::ValidationError(format!(
                "{name} must be within [0, 1], got {value}"
            )));
        }
    }
    if config.power.power_net == config.power.ground_net {
        return invalid("power.power_net and power.ground_net must differ");
    }
    Ok(())
}
