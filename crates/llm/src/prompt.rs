//! Prompt Building and Management
//!
//! Constructs the coaching prompts. Every structured request ends with a
//! format instruction describing the JSON object the model must return.

use std::fmt;

use serde::{Deserialize, Serialize};

use sales_coach_core::{DialogueSession, Phase, ResponseAnalysis, Turn, TurnRole, UserContext};

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

const COACH_PERSONA: &str = "You are an AI coach who helps junior sales reps grow. \
A manager has given the rep an abstract instruction. Your job is to turn it into a \
concrete, executable plan by asking Socratic questions, one at a time, so that the \
rep finds the answers themselves. Be warm, never judgmental, and build on what \
already works for them.";

const ANALYSIS_FORMAT: &str = r#"Respond with a single JSON object and nothing else:
{
  "key_points": ["important points in the reply"],
  "emotional_state": "one word, e.g. confident, anxious, motivated, confused",
  "understanding_level": 1-10,
  "success_patterns": ["successes or good examples the rep mentioned"],
  "challenges": ["obstacles the rep mentioned"],
  "next_action_hint": "what the next question should dig into",
  "phase_complete": true or false
}"#;

const QUESTION_FORMAT: &str = r#"Respond with a single JSON object and nothing else:
{
  "question": "the one question to ask next",
  "purpose": "why this question is asked",
  "expected_outcome": "what the answer should reveal",
  "follow_up_options": ["possible follow-up directions"]
}"#;

const SUMMARY_FORMAT: &str = r#"Respond with a single JSON object and nothing else:
{
  "message": "closing message to the rep: encouragement and recap",
  "interpretation": "concrete interpretation of the manager's instruction",
  "action_plan": {
    "short_term_goals": [
      {"goal": "goal", "actions": ["action 1", "action 2"], "deadline": "deadline", "metrics": "how it is measured"}
    ],
    "mid_term_goals": [
      {"goal": "goal", "actions": [], "deadline": "deadline", "metrics": "how it is measured"}
    ],
    "success_patterns": ["success patterns to reuse"],
    "challenges_and_solutions": [{"challenge": "challenge", "solution": "solution"}],
    "progress_check": {"weekly": "weekly check", "monthly": "monthly check"}
  },
  "insights": {
    "strengths": ["the rep's strengths"],
    "growth_areas": ["growth opportunities"],
    "confidence_level": "how the rep's confidence changed"
  }
}"#;

/// Builder for coaching prompts
pub struct PromptBuilder {
    messages: Vec<Message>,
}

impl PromptBuilder {
    /// Start with the coach persona as the system prompt
    pub fn new() -> Self {
        Self {
            messages: vec![Message::system(COACH_PERSONA)],
        }
    }

    /// Add a labelled block of context to the system side
    pub fn with_context(mut self, label: &str, body: &str) -> Self {
        self.messages
            .push(Message::system(format!("## {}\n{}", label, body)));
        self
    }

    /// Add objective and principles for a phase
    pub fn with_phase_guidance(mut self, phase: Phase) -> Self {
        let principles = phase
            .principles()
            .iter()
            .map(|p| format!("- {}", p))
            .collect::<Vec<_>>()
            .join("\n");
        self.messages.push(Message::system(format!(
            "## Current phase: {}\nObjective: {}\nPrinciples:\n{}",
            phase.display_name(),
            phase.objective(),
            principles
        )));
        self
    }

    /// Add the output format instruction
    pub fn with_format(mut self, format: &str) -> Self {
        self.messages.push(Message::system(format));
        self
    }

    pub fn user_message(mut self, message: &str) -> Self {
        self.messages.push(Message::user(message));
        self
    }

    pub fn build(self) -> Vec<Message> {
        self.messages
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Render history as `role [phase]: content` lines
pub fn render_history(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return "(no conversation yet)".to_string();
    }
    turns
        .iter()
        .map(|t| {
            let speaker = match t.role {
                TurnRole::User => "Rep",
                TurnRole::Assistant => "Coach",
            };
            format!("{} [{}]: {}", speaker, t.phase, t.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

/// Prompt for the opening message
pub fn greeting_prompt(instruction: &str, user_context: &UserContext) -> Vec<Message> {
    PromptBuilder::new()
        .with_context("Manager's instruction", instruction)
        .with_context("About the rep", &to_json(user_context))
        .with_context(
            "Greeting requirements",
            "- Friendly and low pressure\n\
             - Show that you know about the instruction\n\
             - Offer to build a concrete plan together\n\
             - Invite the rep to describe their current situation",
        )
        .user_message("Write the greeting and introduction for the rep. Plain text only.")
        .build()
}

/// Prompt for analyzing one reply
pub fn analysis_prompt(text: &str, phase: Phase, recent_history: &[Turn]) -> Vec<Message> {
    PromptBuilder::new()
        .with_phase_guidance(phase)
        .with_context("Recent conversation", &render_history(recent_history))
        .with_context(
            "Analysis",
            "Read the rep's reply for: key points, emotional state, understanding \
             on a 1-10 scale, successes mentioned, obstacles mentioned, and what the \
             next question should dig into. Set phase_complete only when the \
             objective of the current phase has clearly been met.",
        )
        .with_format(ANALYSIS_FORMAT)
        .user_message(&format!("Analyze this reply: {}", text))
        .build()
}

/// Prompt for the next Socratic question
pub fn question_prompt(
    session: &DialogueSession,
    analysis: &ResponseAnalysis,
    next_phase: Phase,
    history_window: usize,
) -> Vec<Message> {
    PromptBuilder::new()
        .with_phase_guidance(next_phase)
        .with_context("Manager's instruction", &session.abstract_instruction)
        .with_context(
            "Recent conversation",
            &render_history(session.recent_history(history_window)),
        )
        .with_context("Latest analysis", &to_json(analysis))
        .with_context("Discovered patterns", &to_json(&session.discovered_patterns))
        .with_format(QUESTION_FORMAT)
        .user_message(&format!(
            "Generate one effective question for the {} phase.",
            next_phase.display_name()
        ))
        .build()
}

/// Prompt for the closing summary and action plan
pub fn summary_prompt(session: &DialogueSession) -> Vec<Message> {
    PromptBuilder::new()
        .with_context("Manager's instruction", &session.abstract_instruction)
        .with_context("Full conversation", &render_history(&session.history))
        .with_context("Discovered patterns", &to_json(&session.discovered_patterns))
        .with_context(
            "Summary contents",
            "1. A concrete interpretation of the instruction\n\
             2. Success patterns and how to reuse them\n\
             3. SMART goals: short term (1 month) and mid term (3 months)\n\
             4. Actions and how they are measured\n\
             5. Expected obstacles with solutions\n\
             6. Encouragement",
        )
        .with_format(SUMMARY_FORMAT)
        .user_message("Create the session summary and action plan.")
        .build()
}

/// Prompt for the 0-100 completeness score
pub fn completeness_prompt(history: &[Turn]) -> Vec<Message> {
    let rep_text = history
        .iter()
        .filter(|t| t.role == TurnRole::User)
        .map(|t| format!("Rep: {}", t.content))
        .collect::<Vec<_>>()
        .join("\n");

    vec![
        Message::system(
            "Score from 0 to 100 how much of the information needed for a sales \
             improvement action plan has been collected.\n\
             - The current problem is specifically identified (20)\n\
             - Goals or expected outcomes are clear (20)\n\
             - The rep's skill level and experience are known (20)\n\
             - Concrete examples or situations were given (20)\n\
             - Constraints and resources are clear (20)\n\
             Reply with the number only, e.g. 75",
        ),
        Message::user(format!("Conversation:\n{}", rep_text)),
    ]
}
