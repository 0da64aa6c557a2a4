//! Sales knowledge base
//!
//! A category tree of company values, best practices, senior rep examples,
//! challenge playbooks and templates. Seeded from the built-in document and
//! optionally extended from YAML/JSON files on disk. Action plans and 1-on-1
//! analysis are built on top of it.

pub mod action_plan;
pub mod loader;
pub mod one_on_one;
pub mod store;

pub use action_plan::{
    parse_timeline, ActionItem, ActionPlan, ActionTemplate, ActionTemplateGenerator, PlanContext,
    Priority, TemplateListing,
};
pub use loader::KnowledgeLoader;
pub use one_on_one::{OneOnOneAnalysis, OneOnOneAnalyzer};
pub use store::{BestPractice, ChallengeMatch, KnowledgeEntry, KnowledgeStore, MatchType};

use thiserror::Error;

/// Knowledge base errors
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid knowledge document: {0}")]
    InvalidFormat(String),
}

impl From<std::io::Error> for KnowledgeError {
    fn from(err: std::io::Error) -> Self {
        KnowledgeError::Io(err.to_string())
    }
}
