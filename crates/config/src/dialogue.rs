//! Dialogue rules configuration
//!
//! Thresholds and keyword lists consulted by the phase transition function.
//! Keyword matching is case-insensitive substring search.

use serde::{Deserialize, Serialize};

use crate::constants::dialogue;

/// Phase transition and history window settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Understanding level that ends the current-situation phase early
    #[serde(default = "default_understanding_threshold")]
    pub understanding_threshold: u8,

    /// User turns after which any phase advances
    #[serde(default = "default_min_turns")]
    pub min_turns_per_phase: usize,

    /// User turns needed in execution support before the summary
    #[serde(default = "default_execution_support_turns")]
    pub execution_support_min_turns: usize,

    #[serde(default = "default_customer_keywords")]
    pub customer_keywords: Vec<String>,

    #[serde(default = "default_goal_keywords")]
    pub goal_keywords: Vec<String>,

    #[serde(default = "default_analysis_window")]
    pub analysis_history_window: usize,

    #[serde(default = "default_question_window")]
    pub question_history_window: usize,
}

fn default_understanding_threshold() -> u8 {
    dialogue::UNDERSTANDING_THRESHOLD
}
fn default_min_turns() -> usize {
    dialogue::MIN_TURNS_PER_PHASE
}
fn default_execution_support_turns() -> usize {
    dialogue::EXECUTION_SUPPORT_MIN_TURNS
}
fn default_customer_keywords() -> Vec<String> {
    dialogue::CUSTOMER_KEYWORDS.iter().map(|s| s.to_string()).collect()
}
fn default_goal_keywords() -> Vec<String> {
    dialogue::GOAL_KEYWORDS.iter().map(|s| s.to_string()).collect()
}
fn default_analysis_window() -> usize {
    dialogue::ANALYSIS_HISTORY_WINDOW
}
fn default_question_window() -> usize {
    dialogue::QUESTION_HISTORY_WINDOW
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            understanding_threshold: default_understanding_threshold(),
            min_turns_per_phase: default_min_turns(),
            execution_support_min_turns: default_execution_support_turns(),
            customer_keywords: default_customer_keywords(),
            goal_keywords: default_goal_keywords(),
            analysis_history_window: default_analysis_window(),
            question_history_window: default_question_window(),
        }
    }
}

impl DialogueConfig {
    /// Whether `text` contains any customer keyword
    pub fn mentions_customer(&self, text: &str) -> bool {
        contains_any(text, &self.customer_keywords)
    }

    /// Whether `text` contains any goal keyword
    pub fn mentions_goal(&self, text: &str) -> bool {
        contains_any(text, &self.goal_keywords)
    }
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    let haystack = text.to_lowercase();
    keywords
        .iter()
        .filter(|k| !k.is_empty())
        .any(|k| haystack.contains(&k.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_matching_is_case_insensitive() {
        let config = DialogueConfig::default();
        assert!(config.mentions_customer("Call the Customer on Monday"));
        assert!(config.mentions_customer("顧客訪問を増やす"));
        assert!(!config.mentions_customer("Review my notes"));
        assert!(config.mentions_goal("Raise close rate by 5%"));
        assert!(config.mentions_goal("Visit B twice a month"));
    }

    #[test]
    fn test_empty_keyword_never_matches() {
        let config = DialogueConfig {
            customer_keywords: vec![String::new()],
            ..Default::default()
        };
        assert!(!config.mentions_customer("anything"));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: DialogueConfig =
            serde_yaml::from_str("min_turns_per_phase: 3\n").unwrap();
        assert_eq!(config.min_turns_per_phase, 3);
        assert_eq!(config.understanding_threshold, dialogue::UNDERSTANDING_THRESHOLD);
        assert!(!config.goal_keywords.is_empty());
    }
}
