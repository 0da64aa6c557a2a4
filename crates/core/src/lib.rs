//! Core traits and types for the sales coaching engine
//!
//! This crate provides the types every other crate speaks:
//! - Dialogue phases and history turns
//! - Session state and progress
//! - Analysis, question and summary schemas
//! - Error types
//! - Gateway and repository traits

pub mod analysis;
pub mod conversation;
pub mod error;
pub mod session;
pub mod summary;
pub mod traits;

pub use analysis::{
    EmotionalTone, Level, ResponseAnalysis, Sentiment, SentimentAnalysis, SocraticQuestion,
};
pub use conversation::{Phase, Turn, TurnRole, MEANINGFUL_PHASES};
pub use error::{Error, Result};
pub use session::{
    DialogueSession, DiscoveredPatterns, EmotionalSample, Progress, UserContext,
    SESSION_ID_PREFIX,
};
pub use summary::{ActionPlan, ChallengeSolution, Goal, Insights, ProgressCheck, SummaryBundle};
pub use traits::{CoachingGateway, SessionRepository};
