//! Model-backed coaching gateway
//!
//! Bridges [`LlmBackend`] to the core `CoachingGateway` trait: builds the
//! prompt, calls the backend once, and parses the reply into the schema.
//! There is no retry on malformed output; the caller decides how to degrade.

use std::sync::Arc;

use async_trait::async_trait;

use sales_coach_config::constants::dialogue;
use sales_coach_core::{
    CoachingGateway, DialogueSession, Error, Phase, ResponseAnalysis, Result, SentimentAnalysis,
    SocraticQuestion, SummaryBundle, Turn, UserContext,
};

use crate::backend::{FinishReason, LlmBackend};
use crate::parse::{parse_score, parse_structured};
use crate::{heuristics, prompt, LlmError};

/// Gateway over an HTTP chat backend
pub struct LlmGateway {
    backend: Arc<dyn LlmBackend>,
    name: String,
    question_history_window: usize,
}

impl LlmGateway {
    pub fn new(backend: Arc<dyn LlmBackend>, provider: &str) -> Self {
        let name = format!("{}:{}", provider, backend.model_name());
        Self {
            backend,
            name,
            question_history_window: dialogue::QUESTION_HISTORY_WINDOW,
        }
    }

    /// History entries shown to the question generator
    pub fn with_question_history_window(mut self, window: usize) -> Self {
        self.question_history_window = window;
        self
    }

    async fn complete(&self, messages: Vec<prompt::Message>) -> std::result::Result<String, LlmError> {
        let result = self.backend.generate(&messages).await?;
        if result.finish_reason == FinishReason::Length {
            tracing::warn!(
                model = self.backend.model_name(),
                tokens = result.tokens,
                "LLM output hit the token limit, reply may be cut short"
            );
        }
        tracing::debug!(
            model = self.backend.model_name(),
            tokens = result.tokens,
            latency_ms = result.total_time_ms,
            "LLM call completed"
        );
        Ok(result.text)
    }
}

#[async_trait]
impl CoachingGateway for LlmGateway {
    async fn greet(&self, instruction: &str, user_context: &UserContext) -> Result<String> {
        let text = self
            .complete(prompt::greeting_prompt(instruction, user_context))
            .await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::MalformedOutput { raw: String::new() });
        }
        Ok(text.to_string())
    }

    async fn analyze_response(
        &self,
        text: &str,
        phase: Phase,
        recent_history: &[Turn],
    ) -> Result<ResponseAnalysis> {
        let raw = self
            .complete(prompt::analysis_prompt(text, phase, recent_history))
            .await?;
        let analysis: ResponseAnalysis = parse_structured(&raw)?;
        Ok(analysis.normalized())
    }

    async fn generate_question(
        &self,
        session: &DialogueSession,
        analysis: &ResponseAnalysis,
        next_phase: Phase,
    ) -> Result<SocraticQuestion> {
        let raw = self
            .complete(prompt::question_prompt(
                session,
                analysis,
                next_phase,
                self.question_history_window,
            ))
            .await?;
        let question: SocraticQuestion = parse_structured(&raw)?;
        if question.question.trim().is_empty() {
            return Err(Error::MalformedOutput { raw });
        }
        Ok(question)
    }

    async fn generate_summary(&self, session: &DialogueSession) -> Result<SummaryBundle> {
        let raw = self.complete(prompt::summary_prompt(session)).await?;
        Ok(parse_structured(&raw)?)
    }

    async fn evaluate_completeness(&self, history: &[Turn]) -> Result<u8> {
        let raw = self.complete(prompt::completeness_prompt(history)).await?;
        Ok(parse_score(&raw).unwrap_or_else(|| {
            tracing::debug!(raw = %raw, "Completeness score not numeric, using turn count");
            heuristics::fallback_completeness(history)
        }))
    }

    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentAnalysis> {
        Ok(heuristics::analyze_sentiment(text))
    }

    async fn is_available(&self) -> bool {
        self.backend.is_available().await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
