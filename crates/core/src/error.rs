//! Error types shared across crates

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("LLM error: {0}")]
    Llm(String),

    /// Model output that could not be turned into the expected schema
    #[error("Malformed model output")]
    MalformedOutput { raw: String },

    #[error("Session store error: {0}")]
    Store(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session limit reached ({0})")]
    CapacityExceeded(usize),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::SessionNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
