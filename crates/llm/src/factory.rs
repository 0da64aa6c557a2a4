//! Gateway factory
//!
//! Chooses the mock or a model-backed gateway once, from configuration.
//! A real provider without an API key falls back to the mock with a warning.
//!
//! ```ignore
//! let settings = load_settings(None)?;
//! let gateway = create_gateway(&settings.llm, &settings.dialogue)?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use sales_coach_config::constants::generation;
use sales_coach_config::{DialogueConfig, LlmProvider, LlmSettings};
use sales_coach_core::CoachingGateway;

use crate::backend::{LlmBackend, OpenAIBackend, OpenAIConfig, RetryPolicy};
use crate::claude::{ClaudeBackend, ClaudeConfig};
use crate::gateway::LlmGateway;
use crate::mock::MockGateway;
use crate::LlmError;

/// Build the HTTP backend for a non-mock provider
pub fn create_backend(
    settings: &LlmSettings,
    api_key: String,
) -> Result<Arc<dyn LlmBackend>, LlmError> {
    let retry = RetryPolicy {
        max_retries: settings.max_retries,
        initial_backoff: Duration::from_millis(generation::INITIAL_BACKOFF_MS),
    };
    let timeout = Duration::from_secs(settings.timeout_seconds);

    match settings.provider {
        LlmProvider::OpenAI => {
            let config = OpenAIConfig {
                endpoint: settings.resolved_endpoint(),
                api_key,
                model: settings.resolved_model(),
                max_tokens: settings.max_tokens,
                temperature: settings.temperature,
                timeout,
                retry,
            };
            Ok(Arc::new(OpenAIBackend::new(config)?))
        },
        LlmProvider::Anthropic => {
            let config = ClaudeConfig {
                api_key,
                model: settings.resolved_model(),
                max_tokens: settings.max_tokens,
                temperature: settings.temperature,
                timeout,
                endpoint: settings.resolved_endpoint(),
                retry,
            }
            .with_temperature(settings.temperature);
            Ok(Arc::new(ClaudeBackend::new(config)?))
        },
        LlmProvider::Mock => Err(LlmError::Configuration(
            "mock provider has no HTTP backend".to_string(),
        )),
    }
}

/// Build the coaching gateway selected by `settings`
pub fn create_gateway(
    settings: &LlmSettings,
    dialogue: &DialogueConfig,
) -> Result<Arc<dyn CoachingGateway>, LlmError> {
    if settings.provider == LlmProvider::Mock {
        tracing::info!("Using mock coaching gateway");
        return Ok(Arc::new(MockGateway::new()));
    }

    let Some(api_key) = settings.resolved_api_key() else {
        tracing::warn!(
            provider = settings.provider.as_str(),
            "No API key configured, falling back to mock gateway"
        );
        return Ok(Arc::new(MockGateway::new()));
    };

    let backend = create_backend(settings, api_key)?;
    let gateway = LlmGateway::new(backend, settings.provider.as_str())
        .with_question_history_window(dialogue.question_history_window);

    tracing::info!(gateway = gateway.name(), "Using model-backed coaching gateway");
    Ok(Arc::new(gateway))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_provider() {
        let gateway = create_gateway(&LlmSettings::default(), &DialogueConfig::default()).unwrap();
        assert_eq!(gateway.name(), "mock");
    }

    #[test]
    fn test_openai_with_key() {
        let settings = LlmSettings {
            provider: LlmProvider::OpenAI,
            api_key: Some("sk-test".to_string()),
            model: Some("gpt-4o-mini".to_string()),
            ..Default::default()
        };
        let gateway = create_gateway(&settings, &DialogueConfig::default()).unwrap();
        assert_eq!(gateway.name(), "openai:gpt-4o-mini");
    }

    #[test]
    fn test_anthropic_with_key() {
        let settings = LlmSettings {
            provider: LlmProvider::Anthropic,
            api_key: Some("test-key".to_string()),
            ..Default::default()
        };
        let gateway = create_gateway(&settings, &DialogueConfig::default()).unwrap();
        assert_eq!(gateway.name(), "anthropic:claude-3-haiku-20240307");
    }

    #[test]
    fn test_mock_has_no_backend() {
        assert!(create_backend(&LlmSettings::default(), "k".to_string()).is_err());
    }
}
