//! Configuration loading and validation.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::ColloquyConfig;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Load and validate a configuration from a YAML file.
pub fn load_config(path: &Path) -> Result<ColloquyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate a configuration from YAML text.
pub fn parse_config(content: &str) -> Result<ColloquyConfig, ConfigError> {
    let config: ColloquyConfig = serde_yaml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn validate_config(config: &ColloquyConfig) -> Result<(), ConfigError> {
    if config.version == 0 {
        return Err(ConfigError::Invalid(
            "version must be greater than 0".to_string(),
        ));
    }

    if config.app.name.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "app.name must not be empty".to_string(),
        ));
    }

    if config.localization.default_language.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "localization.default_language must not be empty".to_string(),
        ));
    }

    if config.ask.max_attempts == 0 {
        return Err(ConfigError::Invalid(
            "ask.max_attempts must be > 0".to_string(),
        ));
    }

    let level = config.observability.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(ConfigError::Invalid(format!(
            "observability.log_level '{}' is not one of {:?}",
            config.observability.log_level, LOG_LEVELS
        )));
    }

    Ok(())
}
