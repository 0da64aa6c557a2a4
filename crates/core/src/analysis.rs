//! Structured results returned by the coaching gateway

use serde::{Deserialize, Serialize};

fn default_understanding() -> u8 {
    5
}

/// Per-turn analysis of the rep's reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseAnalysis {
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub emotional_state: String,
    /// 1 (lost) to 10 (fully clear)
    #[serde(default = "default_understanding")]
    pub understanding_level: u8,
    #[serde(default)]
    pub success_patterns: Vec<String>,
    #[serde(default)]
    pub challenges: Vec<String>,
    #[serde(default)]
    pub next_action_hint: String,
    /// Set by the analyzer when the current phase's goal has been met
    #[serde(default)]
    pub phase_complete: bool,
}

impl Default for ResponseAnalysis {
    fn default() -> Self {
        Self {
            key_points: Vec::new(),
            emotional_state: String::new(),
            understanding_level: default_understanding(),
            success_patterns: Vec::new(),
            challenges: Vec::new(),
            next_action_hint: String::new(),
            phase_complete: false,
        }
    }
}

impl ResponseAnalysis {
    /// Clamp `understanding_level` into 1..=10
    pub fn normalized(mut self) -> Self {
        self.understanding_level = self.understanding_level.clamp(1, 10);
        self
    }
}

/// A coaching question for the next phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocraticQuestion {
    pub question: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub expected_outcome: String,
    #[serde(default)]
    pub follow_up_options: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalTone {
    Frustrated,
    Confused,
    Motivated,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    High,
    Medium,
    Low,
}

/// Keyword-level read of a single message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub sentiment: Sentiment,
    pub emotional_state: EmotionalTone,
    pub urgency: Level,
    pub key_topics: Vec<String>,
    pub confidence_level: Level,
}
