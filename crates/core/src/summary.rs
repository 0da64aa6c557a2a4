//! Closing summary and action plan schema
//!
//! Every field defaults so that partial model output still deserializes.

use serde::{Deserialize, Serialize};

/// One goal in the plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Goal {
    pub goal: String,
    pub actions: Vec<String>,
    pub deadline: String,
    pub metrics: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeSolution {
    pub challenge: String,
    pub solution: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressCheck {
    pub weekly: String,
    pub monthly: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionPlan {
    pub short_term_goals: Vec<Goal>,
    pub mid_term_goals: Vec<Goal>,
    pub success_patterns: Vec<String>,
    pub challenges_and_solutions: Vec<ChallengeSolution>,
    pub progress_check: ProgressCheck,
}

impl ActionPlan {
    pub fn is_empty(&self) -> bool {
        self == &ActionPlan::default()
    }

    /// Whether the plan already pairs `challenge` with a solution
    pub fn addresses(&self, challenge: &str) -> bool {
        self.challenges_and_solutions
            .iter()
            .any(|c| c.challenge.eq_ignore_ascii_case(challenge))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Insights {
    pub strengths: Vec<String>,
    pub growth_areas: Vec<String>,
    pub confidence_level: String,
}

/// Output of the summary step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryBundle {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
    pub action_plan: ActionPlan,
    pub insights: Insights,
}

impl SummaryBundle {
    /// Wrap free text that could not be parsed into a plan
    pub fn from_raw_text(raw: impl Into<String>) -> Self {
        Self {
            message: raw.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_bundle_deserializes() {
        let json = r#"{
            "message": "Great work",
            "action_plan": {
                "mid_term_goals": [{"goal": "Sales +10%", "deadline": "3 months"}]
            }
        }"#;
        let bundle: SummaryBundle = serde_json::from_str(json).unwrap();
        assert_eq!(bundle.message, "Great work");
        assert!(bundle.interpretation.is_none());
        assert_eq!(bundle.action_plan.mid_term_goals[0].goal, "Sales +10%");
        assert!(bundle.action_plan.mid_term_goals[0].actions.is_empty());
        assert!(bundle.insights.strengths.is_empty());
    }

    #[test]
    fn test_from_raw_text_has_empty_plan() {
        let bundle = SummaryBundle::from_raw_text("not json");
        assert_eq!(bundle.message, "not json");
        assert!(bundle.action_plan.is_empty());
    }

    #[test]
    fn test_addresses_is_case_insensitive() {
        let plan = ActionPlan {
            challenges_and_solutions: vec![ChallengeSolution {
                challenge: "Finding time".into(),
                solution: "Block Friday mornings".into(),
            }],
            ..Default::default()
        };
        assert!(plan.addresses("finding time"));
        assert!(!plan.addresses("Pricing"));
    }
}
