//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{endpoints, generation, models, server};
use crate::{ConfigError, DialogueConfig};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Relaxed validation
    #[default]
    Development,
    Staging,
    /// All validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    /// Language model provider
    #[serde(default)]
    pub llm: LlmSettings,

    /// Phase transition rules
    #[serde(default)]
    pub dialogue: DialogueConfig,

    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Validate all sections
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_llm()?;
        self.validate_dialogue()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if server.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_sessions".to_string(),
                message: "Must allow at least 1 session".to_string(),
            });
        }

        if self.environment.is_strict()
            && server.cors_enabled
            && server.cors_origins.iter().any(|o| o == "*")
        {
            return Err(ConfigError::InvalidValue {
                field: "server.cors_origins".to_string(),
                message: "Wildcard origin not allowed outside development".to_string(),
            });
        }

        Ok(())
    }

    fn validate_llm(&self) -> Result<(), ConfigError> {
        let llm = &self.llm;

        if !(0.0..=2.0).contains(&llm.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "llm.temperature".to_string(),
                message: format!("Must be between 0.0 and 2.0, got {}", llm.temperature),
            });
        }

        if llm.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.max_tokens".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if llm.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        Ok(())
    }

    fn validate_dialogue(&self) -> Result<(), ConfigError> {
        let dialogue = &self.dialogue;

        if !(1..=10).contains(&dialogue.understanding_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "dialogue.understanding_threshold".to_string(),
                message: format!(
                    "Must be between 1 and 10, got {}",
                    dialogue.understanding_threshold
                ),
            });
        }

        for (field, value) in [
            ("dialogue.min_turns_per_phase", dialogue.min_turns_per_phase),
            (
                "dialogue.execution_support_min_turns",
                dialogue.execution_support_min_turns,
            ),
            ("dialogue.analysis_history_window", dialogue.analysis_history_window),
            ("dialogue.question_history_window", dialogue.question_history_window),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "Must be at least 1".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Upper bound on live dialogue sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed origins; empty means any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    server::DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    server::DEFAULT_PORT
}
fn default_timeout() -> u64 {
    server::DEFAULT_TIMEOUT_SECS
}
fn default_max_sessions() -> usize {
    server::DEFAULT_MAX_SESSIONS
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            max_sessions: default_max_sessions(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

/// Which gateway answers coaching requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Deterministic canned responses, no network
    #[default]
    Mock,
    /// OpenAI or any OpenAI-compatible chat completions server
    OpenAI,
    #[serde(alias = "claude")]
    Anthropic,
}

impl LlmProvider {
    /// Environment variable consulted when no key is configured
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            LlmProvider::Mock => None,
            LlmProvider::OpenAI => Some("OPENAI_API_KEY"),
            LlmProvider::Anthropic => Some("ANTHROPIC_API_KEY"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Mock => "mock",
            LlmProvider::OpenAI => "openai",
            LlmProvider::Anthropic => "anthropic",
        }
    }
}

/// LLM provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default)]
    pub provider: LlmProvider,

    /// Model id; provider default when unset
    #[serde(default)]
    pub model: Option<String>,

    /// Base URL; provider default when unset
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Falls back to the provider's environment variable
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,

    /// Retries on network and 5xx errors
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_temperature() -> f32 {
    generation::TEMPERATURE
}
fn default_max_tokens() -> usize {
    generation::MAX_TOKENS
}
fn default_llm_timeout() -> u64 {
    generation::TIMEOUT_SECS
}
fn default_max_retries() -> u32 {
    generation::MAX_RETRIES
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: None,
            endpoint: None,
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_llm_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl LlmSettings {
    pub fn resolved_model(&self) -> String {
        if let Some(model) = self.model.as_ref().filter(|m| !m.is_empty()) {
            return model.clone();
        }
        match self.provider {
            LlmProvider::Anthropic => models::ANTHROPIC_DEFAULT.to_string(),
            LlmProvider::OpenAI | LlmProvider::Mock => models::OPENAI_DEFAULT.to_string(),
        }
    }

    pub fn resolved_endpoint(&self) -> String {
        if let Some(endpoint) = self.endpoint.as_ref().filter(|e| !e.is_empty()) {
            return endpoint.clone();
        }
        match self.provider {
            LlmProvider::Anthropic => endpoints::ANTHROPIC_DEFAULT.to_string(),
            LlmProvider::OpenAI | LlmProvider::Mock => endpoints::OPENAI_DEFAULT.to_string(),
        }
    }

    /// Configured key, else the provider's environment variable
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| {
                self.provider
                    .api_key_env()
                    .and_then(|var| std::env::var(var).ok())
                    .filter(|k| !k.is_empty())
            })
    }
}

/// Knowledge store source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// YAML or JSON file, or a directory of them; built-in content when unset
    #[serde(default)]
    pub path: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,

    /// Install the Prometheus recorder
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from `config/default`, `config/{env}` and `SALES_COACH__*`
/// environment variables, in increasing precedence.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from("config", env)
}

/// Same as [`load_settings`] with an explicit config directory
pub fn load_settings_from(dir: &str, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name(&format!("{}/default", dir)).required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("{}/{}", dir, env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("SALES_COACH")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    tracing::debug!(
        environment = ?settings.environment,
        provider = settings.llm.provider.as_str(),
        "Settings loaded"
    );

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.llm.provider, LlmProvider::Mock);
        assert_eq!(settings.dialogue.min_turns_per_phase, 2);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_temperature_validation() {
        let mut settings = Settings::default();
        settings.llm.temperature = 2.5;
        assert!(settings.validate().is_err());

        settings.llm.temperature = 1.0;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_dialogue_validation() {
        let mut settings = Settings::default();
        settings.dialogue.understanding_threshold = 11;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "dialogue.understanding_threshold"
        ));

        settings.dialogue.understanding_threshold = 7;
        settings.dialogue.min_turns_per_phase = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_wildcard_cors_rejected_in_production() {
        let mut settings = Settings::default();
        settings.server.cors_origins = vec!["*".to_string()];
        assert!(settings.validate().is_ok());

        settings.environment = RuntimeEnvironment::Production;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_provider_defaults() {
        let llm = LlmSettings {
            provider: LlmProvider::Anthropic,
            ..Default::default()
        };
        assert_eq!(llm.resolved_model(), models::ANTHROPIC_DEFAULT);
        assert_eq!(llm.resolved_endpoint(), endpoints::ANTHROPIC_DEFAULT);

        let llm = LlmSettings {
            provider: LlmProvider::OpenAI,
            model: Some("gpt-4o-mini".to_string()),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        assert_eq!(llm.resolved_model(), "gpt-4o-mini");
        assert_eq!(llm.resolved_api_key().as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_load_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("default.yaml")).unwrap();
        writeln!(
            file,
            "server:\n  port: 9090\nllm:\n  provider: anthropic\ndialogue:\n  min_turns_per_phase: 3"
        )
        .unwrap();

        let settings = load_settings_from(dir.path().to_str().unwrap(), None).unwrap();
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.llm.provider, LlmProvider::Anthropic);
        assert_eq!(settings.dialogue.min_turns_per_phase, 3);
        assert_eq!(settings.dialogue.analysis_history_window, 5);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("default.yaml"), "server:\n  port: 0\n").unwrap();
        assert!(load_settings_from(dir.path().to_str().unwrap(), None).is_err());
    }
}
