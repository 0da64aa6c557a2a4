//! Conversation types including phases and turns

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coaching phases, declared in forward order.
///
/// `Ord` follows declaration order, so `a < b` means `a` comes earlier in the
/// dialogue.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Opening turn, left as soon as the greeting is sent
    #[default]
    Greeting,
    /// What the rep is doing today and what already works
    CurrentSituation,
    /// Why results fall short of the target
    ProblemAnalysis,
    /// Options the rep could try, built on past successes
    SolutionExploration,
    /// Concrete goals, deadlines and measures
    ActionPlan,
    /// Obstacles to execution and how to track progress
    ExecutionSupport,
    /// Terminal: action plan delivered
    Summary,
}

/// Number of phases that count toward progress (Greeting and Summary excluded).
pub const MEANINGFUL_PHASES: usize = 5;

impl Phase {
    /// All phases in forward order
    pub const ALL: [Phase; 7] = [
        Phase::Greeting,
        Phase::CurrentSituation,
        Phase::ProblemAnalysis,
        Phase::SolutionExploration,
        Phase::ActionPlan,
        Phase::ExecutionSupport,
        Phase::Summary,
    ];

    /// Position in the forward order
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The phase that follows this one, `None` for `Summary`
    pub fn next(&self) -> Option<Phase> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Summary)
    }

    /// Phases that count toward progress
    pub fn is_meaningful(&self) -> bool {
        !matches!(self, Phase::Greeting | Phase::Summary)
    }

    /// Wire name, identical to the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Greeting => "greeting",
            Phase::CurrentSituation => "current_situation",
            Phase::ProblemAnalysis => "problem_analysis",
            Phase::SolutionExploration => "solution_exploration",
            Phase::ActionPlan => "action_plan",
            Phase::ExecutionSupport => "execution_support",
            Phase::Summary => "summary",
        }
    }

    /// Human-readable label
    pub fn display_name(&self) -> &'static str {
        match self {
            Phase::Greeting => "Greeting",
            Phase::CurrentSituation => "Current Situation",
            Phase::ProblemAnalysis => "Problem Analysis",
            Phase::SolutionExploration => "Solution Exploration",
            Phase::ActionPlan => "Action Plan",
            Phase::ExecutionSupport => "Execution Support",
            Phase::Summary => "Summary",
        }
    }

    /// What the coach is trying to learn in this phase
    pub fn objective(&self) -> &'static str {
        match self {
            Phase::Greeting => "Welcome the rep and restate the instruction they received.",
            Phase::CurrentSituation => {
                "Understand the rep's current work, their view of the instruction, \
                 and any success they can build on."
            },
            Phase::ProblemAnalysis => {
                "Find the root causes of the gap between current results and the target, \
                 using past successes as a contrast."
            },
            Phase::SolutionExploration => {
                "Let the rep generate options, ideally by reapplying what already worked \
                 with other customers."
            },
            Phase::ActionPlan => {
                "Turn the chosen option into SMART goals: specific, measurable, \
                 achievable, relevant and time-bound."
            },
            Phase::ExecutionSupport => {
                "Anticipate obstacles and agree on how progress will be checked."
            },
            Phase::Summary => "Deliver the consolidated action plan and encouragement.",
        }
    }

    /// Questioning principles given to the model for this phase
    pub fn principles(&self) -> &'static [&'static str] {
        match self {
            Phase::CurrentSituation => &[
                "Ask open questions about what the rep is doing now",
                "Look for a recent success worth repeating",
                "Do not suggest solutions yet",
            ],
            Phase::ProblemAnalysis => &[
                "Ask why before asking what",
                "Compare struggling accounts with successful ones",
                "Separate causes the rep controls from those they do not",
            ],
            Phase::SolutionExploration => &[
                "Let the rep propose options first",
                "Connect options to the success patterns already found",
                "Ask which customers an option applies to",
            ],
            Phase::ActionPlan => &[
                "Ask for numbers, dates and named customers",
                "Check that each goal can be measured",
                "Keep the first step small enough to start this week",
            ],
            Phase::ExecutionSupport => &[
                "Ask what could get in the way",
                "Agree on weekly and monthly checkpoints",
                "Confirm who the rep will ask for help",
            ],
            Phase::Greeting | Phase::Summary => &[
                "Be warm and concise",
                "Ask one question at a time",
            ],
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

/// A single entry in a session's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    /// Phase the session was in when the turn was recorded
    pub phase: Phase,
    pub timestamp: DateTime<Utc>,
    /// Why the coach asked this, for assistant questions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>, phase: Phase) -> Self {
        Self {
            role,
            content: content.into(),
            phase,
            timestamp: Utc::now(),
            purpose: None,
        }
    }

    pub fn user(content: impl Into<String>, phase: Phase) -> Self {
        Self::new(TurnRole::User, content, phase)
    }

    pub fn assistant(content: impl Into<String>, phase: Phase) -> Self {
        Self::new(TurnRole::Assistant, content, phase)
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        assert_eq!(Phase::Greeting.next(), Some(Phase::CurrentSituation));
        assert_eq!(Phase::ExecutionSupport.next(), Some(Phase::Summary));
        assert_eq!(Phase::Summary.next(), None);
        assert!(Phase::CurrentSituation < Phase::ProblemAnalysis);
        assert!(Phase::Summary.is_terminal());
    }

    #[test]
    fn test_meaningful_phase_count() {
        let count = Phase::ALL.iter().filter(|p| p.is_meaningful()).count();
        assert_eq!(count, MEANINGFUL_PHASES);
    }

    #[test]
    fn test_phase_serde_matches_as_str() {
        for phase in Phase::ALL {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(json, format!("\"{}\"", phase.as_str()));
        }
    }

    #[test]
    fn test_turn_constructors() {
        let turn = Turn::assistant("What works today?", Phase::CurrentSituation)
            .with_purpose("baseline");
        assert_eq!(turn.role, TurnRole::Assistant);
        assert_eq!(turn.purpose.as_deref(), Some("baseline"));

        let json = serde_json::to_value(Turn::user("hi", Phase::ActionPlan)).unwrap();
        assert!(json.get("purpose").is_none());
        assert_eq!(json["role"], "user");
    }
}
