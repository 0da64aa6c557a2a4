//! Configuration management for the sales coaching engine
//!
//! Supports loading configuration from:
//! - YAML/JSON/TOML files under `config/`
//! - Environment variables (`SALES_COACH__` prefix, `__` between sections)
//!
//! ```text
//! SALES_COACH__LLM__PROVIDER=anthropic
//! SALES_COACH__DIALOGUE__MIN_TURNS_PER_PHASE=3
//! ```

pub mod constants;
pub mod dialogue;
pub mod settings;

pub use dialogue::DialogueConfig;
pub use settings::{
    load_settings, load_settings_from, KnowledgeConfig, LlmProvider, LlmSettings,
    ObservabilityConfig, RuntimeEnvironment, ServerConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
