//! Local replacements for failed gateway calls
//!
//! One constructor per gateway schema. Each bumps the fallback counter so
//! degraded turns show up in `/metrics`.

use sales_coach_core::{
    ChallengeSolution, DialogueSession, Phase, ResponseAnalysis, SocraticQuestion, SummaryBundle,
    UserContext,
};
use sales_coach_llm::{canned, heuristics};

const GENERIC_SOLUTION: &str =
    "Pick one small step for this week and review it at the weekly check-in";

fn record(operation: &'static str) {
    metrics::counter!("sales_coach_gateway_fallbacks_total", "operation" => operation)
        .increment(1);
}

pub fn greeting(instruction: &str, user_context: &UserContext) -> String {
    record("greeting");
    canned::greeting(instruction, user_context)
}

pub fn analysis(text: &str) -> ResponseAnalysis {
    record("analysis");
    heuristics::analyze_response(text)
}

pub fn question(phase: Phase) -> SocraticQuestion {
    record("question");
    canned::question(phase)
}

/// Canned plan overlaid with what the session actually discovered.
///
/// Discovered challenges replace the canned ones. Those the canned plan does
/// not cover are left without a solution for the knowledge base to fill.
pub fn summary(session: &DialogueSession) -> SummaryBundle {
    record("summary");
    let mut bundle = canned::summary(&session.abstract_instruction);
    let patterns = &session.discovered_patterns;

    let success = unique(&patterns.success_patterns);
    if !success.is_empty() {
        bundle.action_plan.success_patterns = success;
    }

    let challenges = unique(&patterns.challenges);
    if !challenges.is_empty() {
        let canned_items = std::mem::take(&mut bundle.action_plan.challenges_and_solutions);
        bundle.action_plan.challenges_and_solutions = challenges
            .into_iter()
            .map(|challenge| {
                let solution = canned_items
                    .iter()
                    .find(|c| c.challenge.eq_ignore_ascii_case(&challenge))
                    .map(|c| c.solution.clone())
                    .unwrap_or_default();
                ChallengeSolution {
                    challenge,
                    solution,
                }
            })
            .collect();
    }

    bundle
}

/// Give every challenge still lacking a solution the generic next step
pub fn fill_open_solutions(bundle: &mut SummaryBundle) {
    for item in bundle
        .action_plan
        .challenges_and_solutions
        .iter_mut()
        .filter(|c| c.solution.trim().is_empty())
    {
        item.solution = GENERIC_SOLUTION.to_string();
    }
}

/// Summary from model text that held no usable JSON
pub fn summary_from_raw(raw: &str, session: &DialogueSession) -> SummaryBundle {
    if raw.trim().is_empty() {
        return summary(session);
    }
    record("summary_raw");
    SummaryBundle::from_raw_text(raw.trim())
}

/// Order-preserving dedup ignoring blanks
pub(crate) fn unique(items: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !seen.iter().any(|s| s == item) {
            seen.push(item.to_string());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(challenges: &[&str], patterns: &[&str]) -> DialogueSession {
        let mut session =
            DialogueSession::new("s", "Grow customer relationships", UserContext::default());
        session.discovered_patterns.challenges =
            challenges.iter().map(|s| s.to_string()).collect();
        session.discovered_patterns.success_patterns =
            patterns.iter().map(|s| s.to_string()).collect();
        session
    }

    #[test]
    fn test_summary_overlays_discoveries() {
        let session = session_with(
            &["Finding time", "Finding time", "Hitting the target"],
            &["Good relationship with Client A"],
        );
        let bundle = summary(&session);

        assert!(bundle.message.contains("Grow customer relationships"));
        assert_eq!(
            bundle.action_plan.success_patterns,
            vec!["Good relationship with Client A"]
        );
        let challenges: Vec<_> = bundle
            .action_plan
            .challenges_and_solutions
            .iter()
            .map(|c| c.challenge.as_str())
            .collect();
        assert_eq!(challenges, vec!["Finding time", "Hitting the target"]);
        assert!(!bundle.action_plan.challenges_and_solutions[0].solution.is_empty());
        assert!(bundle.action_plan.challenges_and_solutions[1].solution.is_empty());
    }

    #[test]
    fn test_fill_open_solutions() {
        let mut bundle = summary(&session_with(&["Cold calls"], &[]));
        fill_open_solutions(&mut bundle);
        assert_eq!(
            bundle.action_plan.challenges_and_solutions[0].solution,
            GENERIC_SOLUTION
        );
    }

    #[test]
    fn test_summary_keeps_canned_plan_without_discoveries() {
        let bundle = summary(&session_with(&[], &[]));
        assert_eq!(bundle, canned::summary("Grow customer relationships"));
    }

    #[test]
    fn test_summary_from_raw() {
        let session = session_with(&[], &[]);
        let bundle = summary_from_raw("  Keep visiting B and C.  ", &session);
        assert_eq!(bundle.message, "Keep visiting B and C.");
        assert!(bundle.action_plan.is_empty());

        let bundle = summary_from_raw("   ", &session);
        assert!(!bundle.action_plan.is_empty());
    }

    #[test]
    fn test_unique() {
        let items = vec!["a".to_string(), " ".to_string(), "a ".to_string(), "b".to_string()];
        assert_eq!(unique(&items), vec!["a", "b"]);
    }
}
