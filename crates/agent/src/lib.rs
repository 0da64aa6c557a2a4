//! Coaching dialogue engine
//!
//! Features:
//! - Pure phase transition function over gateway analysis
//! - In-memory session repository
//! - `DialogueEngine` orchestrating greet, analyze, transition and ask/summarize
//! - Local fallbacks for every gateway operation
//! - Slack mrkdwn rendering of replies and knowledge results

pub mod engine;
pub mod fallback;
pub mod format;
pub mod reply;
pub mod store;
pub mod transition;

pub use engine::DialogueEngine;
pub use reply::DialogueReply;
pub use store::InMemorySessionRepository;
pub use transition::{decide, Transition, TransitionReason};
