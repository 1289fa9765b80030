//! Configuration loading and validation.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::ResiduaConfig;

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

/// Load the full Residua configuration from a YAML file.
pub fn load_config(path: &Path) -> Result<ResiduaConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ResiduaConfig = serde_yaml::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &ResiduaConfig) -> Result<(), ConfigError> {
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

    if config.planner.model.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "planner.model must not be empty".to_string(),
        ));
    }

    if config.planner.timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "planner.timeout_secs must be > 0".to_string(),
        ));
    }

    if config.planner.api_key_env.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "planner.api_key_env must not be empty".to_string(),
        ));
    }

    for (label, path) in [
        ("data.crop_csv", &config.data.crop_csv),
        ("data.soil_csv", &config.data.soil_csv),
        ("data.policy_csv", &config.data.policy_csv),
        ("data.capacity_csv", &config.data.capacity_csv),
    ] {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(format!("{label} must not be empty")));
        }
    }

    Ok(())
}
