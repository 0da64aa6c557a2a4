//! Mock coaching gateway
//!
//! Deterministic, offline. Used when no provider is configured and in tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use sales_coach_core::{
    CoachingGateway, DialogueSession, Phase, ResponseAnalysis, Result, SentimentAnalysis,
    SocraticQuestion, SummaryBundle, Turn, UserContext,
};

use crate::{canned, heuristics};

/// Gateway answering from keyword heuristics and canned text
#[derive(Debug, Default)]
pub struct MockGateway {
    call_count: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of gateway operations served
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    fn record_call(&self) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl CoachingGateway for MockGateway {
    async fn greet(&self, instruction: &str, user_context: &UserContext) -> Result<String> {
        self.record_call();
        Ok(canned::greeting(instruction, user_context))
    }

    async fn analyze_response(
        &self,
        text: &str,
        _phase: Phase,
        _recent_history: &[Turn],
    ) -> Result<ResponseAnalysis> {
        self.record_call();
        Ok(heuristics::analyze_response(text))
    }

    async fn generate_question(
        &self,
        _session: &DialogueSession,
        _analysis: &ResponseAnalysis,
        next_phase: Phase,
    ) -> Result<SocraticQuestion> {
        self.record_call();
        Ok(canned::question(next_phase))
    }

    async fn generate_summary(&self, session: &DialogueSession) -> Result<SummaryBundle> {
        self.record_call();
        Ok(canned::summary(&session.abstract_instruction))
    }

    async fn evaluate_completeness(&self, history: &[Turn]) -> Result<u8> {
        self.record_call();
        Ok(heuristics::completeness_score(history))
    }

    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentAnalysis> {
        self.record_call();
        Ok(heuristics::analyze_sentiment(text))
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "mock"
    }
}
