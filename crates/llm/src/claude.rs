//! Claude Backend
//!
//! Implements the Anthropic Messages API for plain text generation. System
//! messages are lifted into the top-level `system` field; consecutive turns of
//! the same role are merged because the API requires alternation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use sales_coach_config::constants::{endpoints, generation, models};

use crate::backend::{FinishReason, GenerationResult, LlmBackend, RetryPolicy};
use crate::prompt::{Message, Role};
use crate::LlmError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Configuration for Claude backend
#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    /// API key (from ANTHROPIC_API_KEY or direct)
    pub api_key: String,
    /// Model id, e.g. `claude-3-haiku-20240307`
    pub model: String,
    pub max_tokens: usize,
    /// Temperature (0.0 - 1.0)
    pub temperature: f32,
    pub timeout: Duration,
    /// API endpoint (for testing or proxy)
    pub endpoint: String,
    pub retry: RetryPolicy,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            model: models::ANTHROPIC_DEFAULT.to_string(),
            max_tokens: generation::MAX_TOKENS,
            temperature: generation::TEMPERATURE,
            timeout: Duration::from_secs(generation::TIMEOUT_SECS),
            endpoint: endpoints::ANTHROPIC_DEFAULT.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClaudeConfig {
    /// Anthropic accepts 0.0 - 1.0 only
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }
}

/// Claude backend
pub struct ClaudeBackend {
    config: ClaudeConfig,
    client: Client,
}

impl ClaudeBackend {
    pub fn new(config: ClaudeConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::Configuration(
                "ANTHROPIC_API_KEY not set. Set it via environment or config.".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn build_request(&self, messages: &[Message]) -> ClaudeRequest {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let mut claude_messages: Vec<ClaudeMessage> = Vec::new();
        for msg in messages.iter().filter(|m| m.role != Role::System) {
            let role = msg.role.to_string();
            match claude_messages.last_mut() {
                Some(last) if last.role == role => {
                    last.content.push_str("\n\n");
                    last.content.push_str(&msg.content);
                },
                _ => claude_messages.push(ClaudeMessage {
                    role,
                    content: msg.content.clone(),
                }),
            }
        }

        ClaudeRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            messages: claude_messages,
            system: if system.is_empty() {
                None
            } else {
                Some(system.join("\n\n"))
            },
            temperature: Some(self.config.temperature),
        }
    }

    async fn execute_request(&self, request: &ClaudeRequest) -> Result<ClaudeApiResponse, LlmError> {
        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.endpoint.trim_end_matches('/')))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            // 529 overloaded is a server error too
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
impl LlmBackend for ClaudeBackend {
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError> {
        let start = Instant::now();
        let request = self.build_request(messages);

        let response = self
            .config
            .retry
            .run(|| self.execute_request(&request))
            .await?;

        Ok(GenerationResult {
            text: response.text(),
            tokens: response.usage.output_tokens,
            total_time_ms: start.elapsed().as_millis() as u64,
            finish_reason: match response.stop_reason {
                Some(ClaudeStopReason::MaxTokens) => FinishReason::Length,
                _ => FinishReason::Stop,
            },
        })
    }

    async fn is_available(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// Anthropic API types
#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: usize,
    messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ClaudeApiResponse {
    content: Vec<ClaudeContentBlock>,
    stop_reason: Option<ClaudeStopReason>,
    usage: ClaudeUsage,
}

impl ClaudeApiResponse {
    fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ClaudeContentBlock::Text { text } => Some(text.as_str()),
                ClaudeContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ClaudeStopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
}

#[derive(Debug, Deserialize)]
struct ClaudeUsage {
    output_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed(api_key: &str) -> ClaudeConfig {
        ClaudeConfig {
            api_key: api_key.to_string(),
            ..Default::default()
        }
    }

    fn backend() -> ClaudeBackend {
        ClaudeBackend::new(keyed("test-key")).unwrap()
    }

    #[test]
    fn test_missing_key_rejected() {
        assert!(ClaudeBackend::new(keyed("")).is_err());
    }

    #[test]
    fn test_temperature_clamped() {
        let config = keyed("k").with_temperature(1.7);
        assert_eq!(config.temperature, 1.0);
    }

    #[test]
    fn test_system_lifted_and_roles_merged() {
        let request = backend().build_request(&[
            Message::system("You are a coach."),
            Message::system("Reply in JSON."),
            Message::user("First"),
            Message::user("Second"),
            Message::assistant("Ok"),
        ]);

        assert_eq!(request.system.as_deref(), Some("You are a coach.\n\nReply in JSON."));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "user");
        assert_eq!(request.messages[0].content, "First\n\nSecond");
        assert_eq!(request.messages[1].role, "assistant");
    }

    #[test]
    fn test_response_text_joins_text_blocks() {
        let json = r#"{
            "content": [
                {"type": "text", "text": "{\"question\": "},
                {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
                {"type": "text", "text": "\"Why?\"}"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 12, "output_tokens": 7}
        }"#;
        let response: ClaudeApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), r#"{"question": "Why?"}"#);
        assert_eq!(response.stop_reason, Some(ClaudeStopReason::EndTurn));
        assert_eq!(response.usage.output_tokens, 7);
    }
}
