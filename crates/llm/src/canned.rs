//! Canned coaching content
//!
//! Fixed greeting, per-phase questions and closing summary. The mock gateway
//! answers with these, and the dialogue engine falls back to them when the
//! model fails.

use sales_coach_core::{
    ActionPlan, ChallengeSolution, Goal, Insights, Phase, ProgressCheck, SocraticQuestion,
    SummaryBundle, UserContext,
};

pub const FOLLOW_UP_OPTIONS: &[&str] = &["Ask for more detail", "Ask from a different angle"];

/// Opening message naming the rep when known
pub fn greeting(instruction: &str, user_context: &UserContext) -> String {
    let salutation = match user_context.name.as_deref() {
        Some(name) if !name.trim().is_empty() => format!("Hello {}, thanks for making the time.", name.trim()),
        _ => "Hello, thanks for making the time.".to_string(),
    };

    format!(
        "{}\n\n\
         I hear your manager asked you to \"{}\". I'm an AI coach here to help you \
         build your sales skills.\n\n\
         Let's turn that instruction into a concrete plan that fits your situation. \
         To start, could you tell me where things stand right now?\n\n\
         We'll work through it together, so feel free to share as it is.",
        salutation, instruction
    )
}

/// Fixed question for a phase
pub fn question(phase: Phase) -> SocraticQuestion {
    let (question, purpose, expected_outcome) = match phase {
        Phase::CurrentSituation => (
            "How are your sales tracking this month, and how do you split your time \
             between existing customers and new ones? How do you read your manager's \
             instruction?",
            "Get an accurate picture of the current situation",
            "Sales status, time allocation and understanding of the instruction",
        ),
        Phase::ProblemAnalysis => (
            "Which customer relationship is going especially well right now? What do \
             you think makes it work, and what has it led to?",
            "Discover a success story and extract its pattern",
            "A concrete success case and the reasons behind it",
        ),
        Phase::SolutionExploration => (
            "If you grouped your customers by sales volume and by depth of relationship, \
             what groups would you get? Which group would you approach first?",
            "Segment customers strategically and set priorities",
            "An efficient approach plan",
        ),
        Phase::ActionPlan => (
            "Can you set a goal that says by when, what, and how you'll measure it? \
             Let's think about one month and three months out.",
            "Set SMART goals with measurable indicators",
            "An actionable, measurable plan",
        ),
        Phase::ExecutionSupport => (
            "What could get in the way of this plan? How will you deal with it, and how \
             will you check your progress?",
            "Anticipate obstacles and build a routine to keep going",
            "A sustainable execution plan",
        ),
        Phase::Greeting | Phase::Summary => (
            "Tell me about your next step.",
            "Keep the dialogue going",
            "More information",
        ),
    };

    SocraticQuestion {
        question: question.to_string(),
        purpose: purpose.to_string(),
        expected_outcome: expected_outcome.to_string(),
        follow_up_options: FOLLOW_UP_OPTIONS.iter().map(|s| s.to_string()).collect(),
    }
}

/// Fixed closing summary
pub fn summary(instruction: &str) -> SummaryBundle {
    SummaryBundle {
        message: format!(
            "Great conversation! We turned your manager's instruction \"{}\" into a \
             concrete, executable action plan.\n\n\
             Building on what already works for you, we designed a strategic approach \
             and set measurable goals.\n\n\
             Follow this plan and the results will come. I'm rooting for you!",
            instruction
        ),
        interpretation: Some(
            "Build trust by strengthening customer relationships, then convert that \
             trust into higher sales"
                .to_string(),
        ),
        action_plan: ActionPlan {
            short_term_goals: vec![Goal {
                goal: "Strengthen relationships with priority customers".to_string(),
                actions: vec![
                    "Visit clients B and C twice a month".to_string(),
                    "Learn three concerns of each contact".to_string(),
                ],
                deadline: "End of next month".to_string(),
                metrics: "Number of visits, concerns identified".to_string(),
            }],
            mid_term_goals: vec![Goal {
                goal: "Grow sales by 10%".to_string(),
                actions: Vec::new(),
                deadline: "In 3 months".to_string(),
                metrics: "Monthly sales".to_string(),
            }],
            success_patterns: vec!["Reuse the relationship-building pattern from Client A".to_string()],
            challenges_and_solutions: vec![ChallengeSolution {
                challenge: "Finding time".to_string(),
                solution: "Move part of prospecting time to following up existing customers"
                    .to_string(),
            }],
            progress_check: ProgressCheck {
                weekly: "Review visits and relationship progress".to_string(),
                monthly: "Evaluate sales figures against the goal".to_string(),
            },
        },
        insights: Insights {
            strengths: vec![
                "Draws on past success".to_string(),
                "Sets realistic goals".to_string(),
            ],
            growth_areas: vec![
                "Strategic thinking".to_string(),
                "Time management".to_string(),
            ],
            confidence_level: "Confidence grew during the dialogue, along with motivation to act"
                .to_string(),
        },
    }
}
