//! 1-on-1 meeting analysis
//!
//! Reads a manager's feedback from a 1-on-1, picks out the instructions,
//! names the concept behind each and turns them into concrete actions backed
//! by knowledge base entries. Deterministic; no model call.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use sales_coach_config::constants::one_on_one::{MAX_REFERENCES, SEARCH_TERMS};

use crate::store::{KnowledgeEntry, KnowledgeStore};

/// Phrases that mark a sentence as an instruction
const DIRECTIVE_CUES: &[&str] = &[
    "should",
    "need to",
    "needs to",
    "must",
    "make sure",
    "try to",
    "focus on",
    "want you to",
    "ください",
    "しよう",
    "べき",
];

/// Concepts in match order; the last one is the catch-all
const CONCEPTS: &[(&str, &[&str])] = &[
    ("Customer relationships", &["relationship", "trust", "rapport", "関係", "信頼"]),
    ("Discovery and listening", &["hearing", "listen", "question", "needs", "ヒアリング"]),
    ("Proposal quality", &["proposal", "propose", "value", "提案"]),
    ("Pipeline building", &["prospect", "new customer", "pipeline", "appointment", "開拓"]),
    ("Sales execution", &[]),
];

const STEPS_PER_ACTION: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct SupervisorInstruction {
    pub original_text: String,
    pub abstract_concept: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriorityAction {
    pub action: String,
    pub specific_steps: Vec<String>,
    pub frequency: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImplementationTimeline {
    pub immediately: String,
    pub this_week: String,
    pub this_month: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuccessMetric {
    pub metric: String,
    pub target: String,
    pub how_to_measure: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeetingSummary {
    pub title: String,
    pub priority_actions: Vec<PriorityAction>,
    pub implementation_timeline: ImplementationTimeline,
    pub success_metrics: Vec<SuccessMetric>,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OneOnOneAnalysis {
    pub original_content: String,
    pub analysis_timestamp: DateTime<Utc>,
    pub knowledge_used: bool,
    pub supervisor_instructions: Vec<SupervisorInstruction>,
    pub final_summary: MeetingSummary,
    pub knowledge_references: Vec<KnowledgeEntry>,
}

pub struct OneOnOneAnalyzer {
    knowledge: Arc<KnowledgeStore>,
}

impl OneOnOneAnalyzer {
    pub fn new(knowledge: Arc<KnowledgeStore>) -> Self {
        Self { knowledge }
    }

    pub fn analyze(&self, content: &str) -> OneOnOneAnalysis {
        let content = content.trim();
        let references = self.references();
        let instructions = instructions(content);

        let mut concepts: Vec<&str> = Vec::new();
        for instruction in &instructions {
            if !concepts.contains(&instruction.abstract_concept.as_str()) {
                concepts.push(&instruction.abstract_concept);
            }
        }

        let priority_actions: Vec<PriorityAction> = concepts
            .iter()
            .map(|concept| PriorityAction {
                action: format!("Practise {}", concept.to_lowercase()),
                specific_steps: steps_for(concept, &references),
                frequency: "Every customer meeting".to_string(),
            })
            .collect();

        let focus = concepts.first().copied().unwrap_or("Sales execution");
        let final_summary = MeetingSummary {
            title: "1-on-1 feedback analysis".to_string(),
            implementation_timeline: ImplementationTimeline {
                immediately: format!(
                    "Write down one thing to change about {} in your next meeting",
                    focus.to_lowercase()
                ),
                this_week: priority_actions
                    .first()
                    .and_then(|a| a.specific_steps.first())
                    .cloned()
                    .unwrap_or_else(|| "Apply the feedback in two customer meetings".to_string()),
                this_month: "Review progress with your manager in the next 1-on-1".to_string(),
            },
            success_metrics: concepts
                .iter()
                .map(|concept| SuccessMetric {
                    metric: format!("Meetings where {} was applied", concept.to_lowercase()),
                    target: "At least 3 a week".to_string(),
                    how_to_measure: "Tally in the weekly activity log".to_string(),
                })
                .collect(),
            next_steps: vec![
                "Share this plan with your manager".to_string(),
                "Book a follow-up 1-on-1 in two weeks".to_string(),
            ],
            priority_actions,
        };

        tracing::debug!(
            instructions = instructions.len(),
            references = references.len(),
            "Analyzed 1-on-1"
        );

        OneOnOneAnalysis {
            original_content: content.to_string(),
            analysis_timestamp: Utc::now(),
            knowledge_used: !references.is_empty(),
            supervisor_instructions: instructions,
            final_summary,
            knowledge_references: references,
        }
    }

    /// Distinct entries found for the fixed search terms
    fn references(&self) -> Vec<KnowledgeEntry> {
        let mut seen = HashSet::new();
        SEARCH_TERMS
            .iter()
            .flat_map(|term| self.knowledge.search(term, None))
            .filter(|entry| {
                let key = match &entry.entry_type {
                    Some(name) => format!("{}/{}", entry.category, name),
                    None => format!("{}/{}", entry.category, entry.content),
                };
                seen.insert(key)
            })
            .take(MAX_REFERENCES)
            .collect()
    }
}

/// Sentences carrying an instruction cue, or the whole text when none do
fn instructions(content: &str) -> Vec<SupervisorInstruction> {
    if content.is_empty() {
        return Vec::new();
    }

    let sentences: Vec<&str> = content
        .split(['.', '!', '?', '\n', '。', '！', '？'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let directives: Vec<&str> = sentences
        .iter()
        .copied()
        .filter(|s| {
            let lower = s.to_lowercase();
            DIRECTIVE_CUES.iter().any(|cue| lower.contains(cue))
        })
        .collect();

    let picked = if directives.is_empty() {
        vec![content]
    } else {
        directives
    };

    picked
        .into_iter()
        .map(|text| SupervisorInstruction {
            original_text: text.to_string(),
            abstract_concept: concept_of(text).to_string(),
        })
        .collect()
}

fn concept_of(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    CONCEPTS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(concept, _)| *concept)
        .unwrap_or("Sales execution")
}

/// Knowledge lines that fit the concept, else the first lines available
fn steps_for(concept: &str, references: &[KnowledgeEntry]) -> Vec<String> {
    let keywords: &[&str] = CONCEPTS
        .iter()
        .find(|(name, _)| *name == concept)
        .map(|(_, keywords)| *keywords)
        .unwrap_or(&[]);

    let mut lines = Vec::new();
    for entry in references {
        collect_lines(&entry.content, &mut lines);
    }

    let fitting: Vec<String> = lines
        .iter()
        .filter(|line| {
            let lower = line.to_lowercase();
            keywords.iter().any(|k| lower.contains(k))
        })
        .take(STEPS_PER_ACTION)
        .cloned()
        .collect();

    if fitting.is_empty() {
        lines.into_iter().take(STEPS_PER_ACTION).collect()
    } else {
        fitting
    }
}

/// String leaves without template placeholders
fn collect_lines(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) if !s.contains('{') && !s.trim().is_empty() => {
            out.push(s.trim().to_string())
        },
        Value::Array(items) => items.iter().for_each(|item| collect_lines(item, out)),
        Value::Object(map) => map.values().for_each(|item| collect_lines(item, out)),
        _ => {},
    }
}
