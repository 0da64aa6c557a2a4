//! Replies returned by the dialogue engine

use serde::{Deserialize, Serialize};

use sales_coach_core::{ActionPlan, Insights, Phase, Progress, SocraticQuestion, SummaryBundle};

/// What the coach says back, tagged by `type` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DialogueReply {
    Greeting {
        message: String,
        session_id: String,
        next_state: Phase,
    },
    Question {
        message: String,
        purpose: String,
        expected_outcome: String,
        #[serde(default)]
        follow_up_options: Vec<String>,
        state: Phase,
        progress: Progress,
    },
    Summary {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        interpretation: Option<String>,
        action_plan: ActionPlan,
        insights: Insights,
    },
}

impl DialogueReply {
    pub fn question(question: SocraticQuestion, state: Phase, progress: Progress) -> Self {
        DialogueReply::Question {
            message: question.question,
            purpose: question.purpose,
            expected_outcome: question.expected_outcome,
            follow_up_options: question.follow_up_options,
            state,
            progress,
        }
    }

    pub fn summary(bundle: &SummaryBundle) -> Self {
        DialogueReply::Summary {
            message: bundle.message.clone(),
            interpretation: bundle.interpretation.clone(),
            action_plan: bundle.action_plan.clone(),
            insights: bundle.insights.clone(),
        }
    }

    /// Wire name of the reply type
    pub fn kind(&self) -> &'static str {
        match self {
            DialogueReply::Greeting { .. } => "greeting",
            DialogueReply::Question { .. } => "question",
            DialogueReply::Summary { .. } => "summary",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            DialogueReply::Greeting { message, .. }
            | DialogueReply::Question { message, .. }
            | DialogueReply::Summary { message, .. } => message,
        }
    }

    pub fn is_summary(&self) -> bool {
        matches!(self, DialogueReply::Summary { .. })
    }
}
