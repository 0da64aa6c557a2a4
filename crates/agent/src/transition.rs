//! Phase transition function
//!
//! Given the current phase, this turn's analysis and how many user turns the
//! phase has seen (this one included), decide whether to stay or move one
//! phase forward. Phases never move backwards and `Summary` never moves.

use serde::Serialize;

use sales_coach_config::DialogueConfig;
use sales_coach_core::{Phase, ResponseAnalysis};

/// Why the phase did or did not change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    /// Greeting is always left on the first turn
    NaturalFlow,
    /// Minimum user turns for the phase reached
    MinTurnsReached,
    /// Rep showed enough understanding of the situation
    UnderstandingReached,
    /// A success pattern was discovered
    SuccessPatternFound,
    /// Next step focuses on a customer
    CustomerFocus,
    /// Key points state a goal
    GoalStated,
    /// Analyzer declared the phase complete
    PhaseComplete,
    /// No rule fired
    Stay,
    /// Session already finished
    Terminal,
}

impl TransitionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionReason::NaturalFlow => "natural_flow",
            TransitionReason::MinTurnsReached => "min_turns_reached",
            TransitionReason::UnderstandingReached => "understanding_reached",
            TransitionReason::SuccessPatternFound => "success_pattern_found",
            TransitionReason::CustomerFocus => "customer_focus",
            TransitionReason::GoalStated => "goal_stated",
            TransitionReason::PhaseComplete => "phase_complete",
            TransitionReason::Stay => "stay",
            TransitionReason::Terminal => "terminal",
        }
    }
}

/// Outcome of one transition decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
    pub reason: TransitionReason,
}

impl Transition {
    pub fn advanced(&self) -> bool {
        self.from != self.to
    }

    fn stay(phase: Phase, reason: TransitionReason) -> Self {
        Self {
            from: phase,
            to: phase,
            reason,
        }
    }
}

/// Decide the next phase
pub fn decide(
    phase: Phase,
    analysis: &ResponseAnalysis,
    turns_in_phase: usize,
    rules: &DialogueConfig,
) -> Transition {
    let Some(next) = phase.next() else {
        return Transition::stay(phase, TransitionReason::Terminal);
    };

    let min_turns = rules.min_turns_per_phase;
    let reason = match phase {
        Phase::Greeting => Some(TransitionReason::NaturalFlow),
        Phase::CurrentSituation => {
            if analysis.understanding_level >= rules.understanding_threshold {
                Some(TransitionReason::UnderstandingReached)
            } else if turns_in_phase >= min_turns {
                Some(TransitionReason::MinTurnsReached)
            } else {
                None
            }
        },
        Phase::ProblemAnalysis => {
            if !analysis.success_patterns.is_empty() {
                Some(TransitionReason::SuccessPatternFound)
            } else if turns_in_phase >= min_turns {
                Some(TransitionReason::MinTurnsReached)
            } else {
                None
            }
        },
        Phase::SolutionExploration => {
            if rules.mentions_customer(&analysis.next_action_hint) {
                Some(TransitionReason::CustomerFocus)
            } else if turns_in_phase >= min_turns {
                Some(TransitionReason::MinTurnsReached)
            } else {
                None
            }
        },
        Phase::ActionPlan => {
            if rules.mentions_goal(&analysis.key_points.join(" ")) {
                Some(TransitionReason::GoalStated)
            } else if turns_in_phase >= min_turns {
                Some(TransitionReason::MinTurnsReached)
            } else {
                None
            }
        },
        Phase::ExecutionSupport => {
            (turns_in_phase >= rules.execution_support_min_turns)
                .then_some(TransitionReason::MinTurnsReached)
        },
        Phase::Summary => None,
    };

    let reason = reason.or(analysis.phase_complete.then_some(TransitionReason::PhaseComplete));

    match reason {
        Some(reason) => Transition {
            from: phase,
            to: next,
            reason,
        },
        None => Transition::stay(phase, TransitionReason::Stay),
    }
}
