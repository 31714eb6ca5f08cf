//! # Colloquy Config
//!
//! Single-file YAML configuration for colloquy bots: app identity, session
//! behavior, localization, ask policy defaults, and observability settings.

mod loader;

pub use loader::{load_config, parse_config, ConfigError};

use serde::Deserialize;

/// Top-level configuration schema.
#[derive(Debug, Clone, Deserialize)]
pub struct ColloquyConfig {
    /// Config schema version.
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub localization: LocalizationConfig,
    #[serde(default)]
    pub ask: AskConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for ColloquyConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            app: AppConfig::default(),
            session: SessionConfig::default(),
            localization: LocalizationConfig::default(),
            ask: AskConfig::default(),
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
    "colloquy".to_string()
}

fn default_env() -> String {
    "development".to_string()
}

/// Console session behavior.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Prompt shown before each user input line.
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Inputs that end the session.
    #[serde(default = "default_exit_commands")]
    pub exit_commands: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            exit_commands: default_exit_commands(),
        }
    }
}

fn default_prompt() -> String {
    "> ".to_string()
}

fn default_exit_commands() -> Vec<String> {
    vec!["exit".to_string(), "quit".to_string()]
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalizationConfig {
    /// Language used for message-catalog lookups.
    #[serde(default = "default_language")]
    pub default_language: String,
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
        }
    }
}

fn default_language() -> String {
    "en_US".to_string()
}

/// Global ask policy defaults; agents and individual asks may override.
#[derive(Debug, Clone, Deserialize)]
pub struct AskConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub exception_on_max_attempts: bool,
}

impl Default for AskConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            exception_on_max_attempts: false,
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
