//! Core traits for the coaching engine
//!
//! ```text
//! CoachingGateway:   greeting, analysis, questions, summary (LLM or mock)
//! SessionRepository: where dialogue sessions live between turns
//! ```

mod gateway;
mod repository;

pub use gateway::CoachingGateway;
pub use repository::SessionRepository;
