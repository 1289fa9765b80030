//! # Residua Config
//!
//! Unified single-file configuration management for Residua.
//! A single `residua.yaml` configures the app identity, the oracle
//! invocation, the fact-source locations, and observability settings.

mod loader;

pub use loader::{load_config, ConfigError};

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration schema for Residua.
#[derive(Debug, Clone, Deserialize)]
pub struct ResiduaConfig {
    /// Config schema version.
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for ResiduaConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            app: AppConfig::default(),
            planner: PlannerConfig::default(),
            data: DataConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            environment: default_env(),
        }
    }
}

fn default_app_name() -> String {
    "residua".to_string()
}

fn default_env() -> String {
    "development".to_string()
}

/// Oracle invocation settings shared by both generation stages.
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Environment variable holding the oracle API key. The key itself
    /// never lives in the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            api_key_env: default_api_key_env(),
            endpoint: default_endpoint(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

/// Locations of the four tabular fact sources.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_crop_csv")]
    pub crop_csv: PathBuf,
    #[serde(default = "default_soil_csv")]
    pub soil_csv: PathBuf,
    #[serde(default = "default_policy_csv")]
    pub policy_csv: PathBuf,
    #[serde(default = "default_capacity_csv")]
    pub capacity_csv: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            crop_csv: default_crop_csv(),
            soil_csv: default_soil_csv(),
            policy_csv: default_policy_csv(),
            capacity_csv: default_capacity_csv(),
        }
    }
}

fn default_crop_csv() -> PathBuf {
    PathBuf::from("data/crop_data.csv")
}

fn default_soil_csv() -> PathBuf {
    PathBuf::from("data/soil_data.csv")
}

fn default_policy_csv() -> PathBuf {
    PathBuf::from("data/policy_data.csv")
}

fn default_capacity_csv() -> PathBuf {
    PathBuf::from("data/capacity_data.csv")
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
