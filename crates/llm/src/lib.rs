//! LLM integration for the coaching engine
//!
//! Features:
//! - HTTP backends (OpenAI-compatible, Anthropic) with retry and backoff
//! - Coaching prompts and structured output parsing
//! - Mock gateway with keyword heuristics
//! - Factory selecting the gateway from configuration

pub mod backend;
pub mod canned;
pub mod claude;
pub mod factory;
pub mod gateway;
pub mod heuristics;
pub mod mock;
pub mod parse;
pub mod prompt;

pub use backend::{FinishReason, GenerationResult, LlmBackend, OpenAIBackend, OpenAIConfig, RetryPolicy};
pub use claude::{ClaudeBackend, ClaudeConfig};
pub use factory::{create_backend, create_gateway};
pub use gateway::LlmGateway;
pub use mock::MockGateway;
pub use prompt::{Message, PromptBuilder, Role};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Reply did not contain the expected JSON object
    #[error("Malformed model output")]
    MalformedOutput { raw: String },
}

impl LlmError {
    /// Network failures and 5xx responses are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Network(_) | LlmError::Timeout)
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for sales_coach_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::MalformedOutput { raw } => sales_coach_core::Error::MalformedOutput { raw },
            other => sales_coach_core::Error::Llm(other.to_string()),
        }
    }
}
