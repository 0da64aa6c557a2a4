//! LLM Backend implementations
//!
//! Chat-style text generation over HTTP. `OpenAIBackend` speaks the chat
//! completions protocol (OpenAI, vLLM, local servers); the Anthropic
//! messages API lives in [`crate::claude`].
//!
//! Both retry network errors and 5xx responses with exponential backoff.
//! 4xx responses fail immediately.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use sales_coach_config::constants::{endpoints, generation, models};

use crate::prompt::Message;
use crate::LlmError;

/// Retry settings for transient failures
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Doubles after every failed attempt
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: generation::MAX_RETRIES,
            initial_backoff: Duration::from_millis(generation::INITIAL_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// retry budget is spent.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let mut last_error = None;
        let mut backoff = self.initial_backoff;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    "LLM request failed, retrying in {:?} (attempt {}/{})",
                    backoff,
                    attempt,
                    self.max_retries
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::Network("Max retries exceeded".to_string())))
    }
}

/// LLM generation result
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub text: String,
    /// Completion tokens, 0 when the provider does not report usage
    pub tokens: usize,
    pub total_time_ms: u64,
    pub finish_reason: FinishReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
}

impl FinishReason {
    fn from_provider(reason: Option<&str>) -> Self {
        match reason {
            Some("length") | Some("max_tokens") => FinishReason::Length,
            _ => FinishReason::Stop,
        }
    }
}

/// LLM Backend trait
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a response
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError>;

    /// Check if model is available
    async fn is_available(&self) -> bool;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Configuration for OpenAI-compatible backends
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API endpoint (OpenAI: https://api.openai.com/v1, or a local server)
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: usize,
    /// Temperature (0-2)
    pub temperature: f32,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoints::OPENAI_DEFAULT.to_string(),
            api_key: String::new(),
            model: models::OPENAI_DEFAULT.to_string(),
            max_tokens: generation::MAX_TOKENS,
            temperature: generation::TEMPERATURE,
            timeout: Duration::from_secs(generation::TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

/// OpenAI-compatible backend
pub struct OpenAIBackend {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIBackend {
    pub fn new(config: OpenAIConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() && !config.endpoint.starts_with("http://localhost") {
            return Err(LlmError::Configuration(
                "API key required for remote endpoints".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Full URL for chat completions
    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }

    fn build_headers(&self) -> reqwest::header::HeaderMap {
        use reqwest::header::HeaderValue;

        let mut headers = reqwest::header::HeaderMap::new();

        let auth_value = format!("Bearer {}", self.config.api_key);
        if let Ok(val) = HeaderValue::from_str(&auth_value) {
            headers.insert(reqwest::header::AUTHORIZATION, val);
        }

        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        headers
    }

    fn build_request(&self, messages: &[Message]) -> OpenAIChatRequest {
        OpenAIChatRequest {
            model: self.config.model.clone(),
            messages: messages
                .iter()
                .map(|m| OpenAIMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
            stream: Some(false),
        }
    }

    /// Execute a single request (used by retry logic)
    async fn execute_request(
        &self,
        request: &OpenAIChatRequest,
    ) -> Result<OpenAIChatResponse, LlmError> {
        let response = self
            .client
            .post(self.chat_url())
            .headers(self.build_headers())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            // 5xx errors are retryable, 4xx are not
            if status.is_server_error() {
                return Err(LlmError::Network(format!(
                    "Server error {}: {}",
                    status, error_text
                )));
            }
            return Err(LlmError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl LlmBackend for OpenAIBackend {
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError> {
        let start = Instant::now();
        let request = self.build_request(messages);

        let response = self
            .config
            .retry
            .run(|| self.execute_request(&request))
            .await?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

        Ok(GenerationResult {
            text: choice.message.content.clone(),
            tokens: response.usage.map(|u| u.completion_tokens).unwrap_or(0),
            total_time_ms: start.elapsed().as_millis() as u64,
            finish_reason: FinishReason::from_provider(choice.finish_reason.as_deref()),
        })
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/models", self.config.endpoint.trim_end_matches('/')))
            .headers(self.build_headers())
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    completion_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_openai_config_default() {
        let config = OpenAIConfig::default();
        assert_eq!(config.endpoint, "https://api.openai.com/v1");
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert!(config.api_key.is_empty());
    }

    fn hosted(model: &str) -> OpenAIConfig {
        OpenAIConfig {
            api_key: "sk-test".to_string(),
            model: model.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_remote_endpoint_requires_key() {
        assert!(OpenAIBackend::new(OpenAIConfig::default()).is_err());
        let local = OpenAIConfig {
            endpoint: "http://localhost:8000/v1".to_string(),
            ..Default::default()
        };
        assert!(OpenAIBackend::new(local).is_ok());
    }

    #[test]
    fn test_chat_url() {
        let backend = OpenAIBackend::new(hosted("gpt-4o-mini")).unwrap();
        assert_eq!(backend.chat_url(), "https://api.openai.com/v1/chat/completions");

        let trailing = OpenAIConfig {
            endpoint: "http://localhost:8000/v1/".to_string(),
            ..Default::default()
        };
        let backend = OpenAIBackend::new(trailing).unwrap();
        assert_eq!(backend.chat_url(), "http://localhost:8000/v1/chat/completions");
    }

    #[test]
    fn test_bearer_header() {
        let backend = OpenAIBackend::new(hosted("gpt-4o-mini")).unwrap();
        let headers = backend.build_headers();
        assert_eq!(headers[reqwest::header::AUTHORIZATION], "Bearer sk-test");
    }

    #[test]
    fn test_request_serialization() {
        let backend = OpenAIBackend::new(hosted("gpt-4o-mini")).unwrap();
        let request = backend.build_request(&[Message::system("Coach"), Message::user("Hi")]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Hi");
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_finish_reason_from_provider() {
        assert_eq!(FinishReason::from_provider(Some("length")), FinishReason::Length);
        assert_eq!(FinishReason::from_provider(Some("stop")), FinishReason::Stop);
        assert_eq!(FinishReason::from_provider(None), FinishReason::Stop);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_network_errors() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let policy = RetryPolicy {
            max_retries: 3,
            initial_backoff: Duration::from_millis(1),
        };

        let result = policy
            .run(move || async move {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(LlmError::Network("connection reset".to_string()))
                } else {
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_stops_on_api_error() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let policy = RetryPolicy {
            max_retries: 3,
            initial_backoff: Duration::from_millis(1),
        };

        let result: Result<(), _> = policy
            .run(move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(LlmError::Api("HTTP 401".to_string()))
            })
            .await;

        assert!(matches!(result, Err(LlmError::Api(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
