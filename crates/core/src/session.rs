//! Dialogue session state

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::ResponseAnalysis;
use crate::conversation::{Phase, Turn, TurnRole, MEANINGFUL_PHASES};
use crate::summary::SummaryBundle;

/// Prefix for generated session ids
pub const SESSION_ID_PREFIX: &str = "ideal_";

/// Descriptive information about the rep. Free-form, never validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserContext {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// Mood and clarity observed on one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalSample {
    pub phase: Phase,
    pub emotion: String,
    pub understanding_level: u8,
}

/// Everything learned about the rep so far. Append-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredPatterns {
    pub success_patterns: Vec<String>,
    pub challenges: Vec<String>,
    pub emotional_journey: Vec<EmotionalSample>,
}

impl DiscoveredPatterns {
    /// Record one turn's analysis, tagged with the phase it was made in
    pub fn fold(&mut self, phase: Phase, analysis: &ResponseAnalysis) {
        self.success_patterns
            .extend(analysis.success_patterns.iter().cloned());
        self.challenges.extend(analysis.challenges.iter().cloned());
        self.emotional_journey.push(EmotionalSample {
            phase,
            emotion: analysis.emotional_state.clone(),
            understanding_level: analysis.understanding_level,
        });
    }
}

/// Snapshot of how far a session has come
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub current_state: Phase,
    pub completed_states: usize,
    pub total_states: usize,
    pub percentage: u8,
    pub dialogue_count: usize,
}

/// One coaching conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueSession {
    pub id: String,
    pub phase: Phase,
    pub abstract_instruction: String,
    pub user_context: UserContext,
    pub history: Vec<Turn>,
    pub discovered_patterns: DiscoveredPatterns,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryBundle>,
    pub created_at: DateTime<Utc>,
}

impl DialogueSession {
    pub fn new(
        id: impl Into<String>,
        abstract_instruction: impl Into<String>,
        user_context: UserContext,
    ) -> Self {
        Self {
            id: id.into(),
            phase: Phase::Greeting,
            abstract_instruction: abstract_instruction.into(),
            user_context,
            history: Vec::new(),
            discovered_patterns: DiscoveredPatterns::default(),
            summary: None,
            created_at: Utc::now(),
        }
    }

    /// `ideal_` followed by eight hex characters
    pub fn generate_id() -> String {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        format!("{}{}", SESSION_ID_PREFIX, &uuid[..8])
    }

    /// Append a user turn tagged with the current phase
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.history.push(Turn::user(content, self.phase));
    }

    /// Append an assistant turn tagged with the current phase
    pub fn push_assistant(&mut self, content: impl Into<String>, purpose: Option<String>) {
        let turn = Turn::assistant(content, self.phase);
        self.history.push(match purpose {
            Some(purpose) => turn.with_purpose(purpose),
            None => turn,
        });
    }

    /// User turns recorded while the session was in `phase`
    pub fn turns_in_phase(&self, phase: Phase) -> usize {
        self.history
            .iter()
            .filter(|t| t.role == TurnRole::User && t.phase == phase)
            .count()
    }

    /// The last `n` history entries, oldest first
    pub fn recent_history(&self, n: usize) -> &[Turn] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }

    pub fn user_turn_count(&self) -> usize {
        self.history
            .iter()
            .filter(|t| t.role == TurnRole::User)
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn progress(&self) -> Progress {
        let visited: BTreeSet<Phase> = self
            .history
            .iter()
            .filter(|t| t.role == TurnRole::Assistant && t.phase.is_meaningful())
            .map(|t| t.phase)
            .collect();
        let completed = visited.len();
        let percentage = (completed * 100 / MEANINGFUL_PHASES) as u8;

        Progress {
            current_state: self.phase,
            completed_states: completed,
            total_states: MEANINGFUL_PHASES,
            percentage,
            dialogue_count: self.history.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEANINGFUL_PHASES_IN_ORDER: [Phase; 5] = [
        Phase::CurrentSituation,
        Phase::ProblemAnalysis,
        Phase::SolutionExploration,
        Phase::ActionPlan,
        Phase::ExecutionSupport,
    ];

    fn session() -> DialogueSession {
        DialogueSession::new("s1", "Grow customer relationships", UserContext::default())
    }

    #[test]
    fn test_generated_id_format() {
        let id = DialogueSession::generate_id();
        assert!(id.starts_with(SESSION_ID_PREFIX));
        assert_eq!(id.len(), SESSION_ID_PREFIX.len() + 8);
        assert!(id[SESSION_ID_PREFIX.len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_turns_in_phase_counts_user_turns_only() {
        let mut s = session();
        s.phase = Phase::CurrentSituation;
        s.push_assistant("How is it going?", None);
        s.push_user("Fine");
        s.push_user("Sales are at 85%");
        s.phase = Phase::ProblemAnalysis;
        s.push_user("Not sure why");

        assert_eq!(s.turns_in_phase(Phase::CurrentSituation), 2);
        assert_eq!(s.turns_in_phase(Phase::ProblemAnalysis), 1);
        assert_eq!(s.user_turn_count(), 3);
    }

    #[test]
    fn test_recent_history_window() {
        let mut s = session();
        for i in 0..7 {
            s.push_user(format!("turn {}", i));
        }
        let recent = s.recent_history(5);
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].content, "turn 2");
        assert_eq!(s.recent_history(50).len(), 7);
    }

    #[test]
    fn test_progress_counts_distinct_assistant_phases() {
        let mut s = session();
        assert_eq!(s.progress().percentage, 0);

        s.push_assistant("Welcome", None);
        s.phase = Phase::CurrentSituation;
        assert_eq!(s.progress().completed_states, 0);

        s.phase = Phase::ProblemAnalysis;
        s.push_assistant("Why?", Some("root cause".into()));
        s.push_assistant("And then?", None);
        let progress = s.progress();
        assert_eq!(progress.completed_states, 1);
        assert_eq!(progress.percentage, 20);
        assert_eq!(progress.total_states, MEANINGFUL_PHASES);
        assert_eq!(progress.dialogue_count, 3);
        assert_eq!(s.history[1].purpose.as_deref(), Some("root cause"));
        assert_eq!(s.history[2].purpose, None);
    }

    #[test]
    fn test_progress_ignores_summary_turn() {
        let mut s = session();
        s.push_assistant("Welcome", None);
        for phase in MEANINGFUL_PHASES_IN_ORDER {
            s.phase = phase;
            s.push_assistant("question", None);
            s.push_user("answer");
        }
        s.phase = Phase::Summary;
        s.push_assistant("Here is your plan", None);

        let progress = s.progress();
        assert_eq!(progress.current_state, Phase::Summary);
        assert_eq!(progress.completed_states, MEANINGFUL_PHASES);
        assert_eq!(progress.total_states, MEANINGFUL_PHASES);
        assert_eq!(progress.percentage, 100);
    }

    #[test]
    fn test_fold_appends_without_dedup() {
        let mut patterns = DiscoveredPatterns::default();
        let analysis = ResponseAnalysis {
            success_patterns: vec!["Client A trust".into()],
            challenges: vec!["Finding time".into()],
            emotional_state: "positive".into(),
            understanding_level: 8,
            ..Default::default()
        };
        patterns.fold(Phase::CurrentSituation, &analysis);
        patterns.fold(Phase::ProblemAnalysis, &analysis);

        assert_eq!(patterns.success_patterns.len(), 2);
        assert_eq!(patterns.challenges.len(), 2);
        assert_eq!(patterns.emotional_journey[1].phase, Phase::ProblemAnalysis);
    }

    #[test]
    fn test_user_context_keeps_extra_fields() {
        let json = r#"{"name": "Sato", "region": "Kansai"}"#;
        let ctx: UserContext = serde_json::from_str(json).unwrap();
        assert_eq!(ctx.name.as_deref(), Some("Sato"));
        assert_eq!(ctx.extra["region"], "Kansai");
    }
}
