//! Coaching gateway trait

use async_trait::async_trait;

use crate::analysis::{ResponseAnalysis, SentimentAnalysis, SocraticQuestion};
use crate::conversation::{Phase, Turn};
use crate::session::{DialogueSession, UserContext};
use crate::summary::SummaryBundle;
use crate::Result;

/// Everything the dialogue engine asks of a language model
///
/// Implementations:
/// - `MockGateway` - keyword heuristics and canned text, no network
/// - `LlmGateway` - prompt templates over an HTTP chat backend
///
/// Errors are `Error::Llm` for transport and API failures and
/// `Error::MalformedOutput` when the reply does not fit the schema.
#[async_trait]
pub trait CoachingGateway: Send + Sync + 'static {
    /// Opening message for a new session
    async fn greet(&self, instruction: &str, user_context: &UserContext) -> Result<String>;

    /// Analyze the rep's latest reply
    ///
    /// `recent_history` is the tail of the session history, oldest first,
    /// and already contains the reply being analyzed.
    async fn analyze_response(
        &self,
        text: &str,
        phase: Phase,
        recent_history: &[Turn],
    ) -> Result<ResponseAnalysis>;

    /// Question to ask once the session is in `next_phase`
    async fn generate_question(
        &self,
        session: &DialogueSession,
        analysis: &ResponseAnalysis,
        next_phase: Phase,
    ) -> Result<SocraticQuestion>;

    /// Closing message, action plan and insights
    async fn generate_summary(&self, session: &DialogueSession) -> Result<SummaryBundle>;

    /// How complete the collected information is, 0 to 100
    async fn evaluate_completeness(&self, history: &[Turn]) -> Result<u8>;

    /// Keyword-level sentiment of one message
    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentAnalysis>;

    /// Whether the backing model can be reached right now
    async fn is_available(&self) -> bool;

    /// Name for logging and health output
    fn name(&self) -> &str;
}
