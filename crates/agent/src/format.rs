//! Slack mrkdwn rendering
//!
//! Output is capped at the Slack section limit, cut at a grapheme boundary.

use std::fmt::Write;

use unicode_segmentation::UnicodeSegmentation;

use sales_coach_config::constants::formatting::SLACK_MAX_CHARS;
use sales_coach_core::{ActionPlan, Goal, Insights, Progress};
use sales_coach_knowledge::KnowledgeEntry;

use crate::reply::DialogueReply;

const PROGRESS_BAR_WIDTH: usize = 10;
const ENTRY_PREVIEW_CHARS: usize = 200;

pub fn reply_text(reply: &DialogueReply) -> String {
    let text = match reply {
        DialogueReply::Greeting { message, .. } => message.clone(),
        DialogueReply::Question {
            message,
            purpose,
            state,
            progress,
            ..
        } => {
            let mut out = format!(
                "*{}*  {}\n\n{}",
                state.display_name(),
                progress_bar(progress.percentage),
                message
            );
            if !purpose.is_empty() {
                let _ = write!(out, "\n\n_Purpose: {}_", purpose);
            }
            out
        },
        DialogueReply::Summary {
            message,
            interpretation,
            action_plan,
            insights,
        } => summary_text(message, interpretation.as_deref(), action_plan, insights),
    };
    truncate(&text, SLACK_MAX_CHARS)
}

fn summary_text(
    message: &str,
    interpretation: Option<&str>,
    plan: &ActionPlan,
    insights: &Insights,
) -> String {
    let mut out = String::from(message);

    if let Some(interpretation) = interpretation.filter(|s| !s.is_empty()) {
        let _ = write!(out, "\n\n*What the instruction means*\n{}", interpretation);
    }

    goals_section(&mut out, "Short-term goals", &plan.short_term_goals);
    goals_section(&mut out, "Mid-term goals", &plan.mid_term_goals);
    list_section(&mut out, "Success patterns to reuse", &plan.success_patterns);

    if !plan.challenges_and_solutions.is_empty() {
        out.push_str("\n\n*Challenges and solutions*");
        for item in &plan.challenges_and_solutions {
            let _ = write!(out, "\n• *{}*: {}", item.challenge, item.solution);
        }
    }

    let check = &plan.progress_check;
    if !check.weekly.is_empty() || !check.monthly.is_empty() {
        out.push_str("\n\n*Progress check*");
        if !check.weekly.is_empty() {
            let _ = write!(out, "\n• Weekly: {}", check.weekly);
        }
        if !check.monthly.is_empty() {
            let _ = write!(out, "\n• Monthly: {}", check.monthly);
        }
    }

    list_section(&mut out, "Strengths", &insights.strengths);
    list_section(&mut out, "Growth areas", &insights.growth_areas);
    if !insights.confidence_level.is_empty() {
        let _ = write!(out, "\n\n_{}_", insights.confidence_level);
    }

    out
}

fn goals_section(out: &mut String, title: &str, goals: &[Goal]) {
    if goals.is_empty() {
        return;
    }
    let _ = write!(out, "\n\n*{}*", title);
    for goal in goals {
        let _ = write!(out, "\n• *{}*", goal.goal);
        if !goal.deadline.is_empty() {
            let _ = write!(out, " (by {})", goal.deadline);
        }
        for action in &goal.actions {
            let _ = write!(out, "\n    ◦ {}", action);
        }
        if !goal.metrics.is_empty() {
            let _ = write!(out, "\n    ◦ Measure: {}", goal.metrics);
        }
    }
}

fn list_section(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = write!(out, "\n\n*{}*", title);
    for item in items {
        let _ = write!(out, "\n• {}", item);
    }
}

pub fn progress_text(progress: &Progress) -> String {
    format!(
        "*Progress*: {} ({}/{} phases)\n{}\nMessages so far: {}",
        progress.current_state.display_name(),
        progress.completed_states,
        progress.total_states,
        progress_bar(progress.percentage),
        progress.dialogue_count
    )
}

pub fn knowledge_text(query: &str, entries: &[KnowledgeEntry]) -> String {
    if entries.is_empty() {
        return format!("No knowledge found for \"{}\".", query);
    }

    let mut out = format!("*Knowledge for \"{}\"*", query);
    for entry in entries {
        let label = match &entry.entry_type {
            Some(kind) => format!("{} / {}", entry.category, kind),
            None => entry.category.clone(),
        };
        let content = match &entry.content {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let _ = write!(
            out,
            "\n• *{}*: {}",
            label,
            truncate(&content, ENTRY_PREVIEW_CHARS)
        );
    }
    truncate(&out, SLACK_MAX_CHARS)
}

fn progress_bar(percentage: u8) -> String {
    let filled = (percentage.min(100) as usize * PROGRESS_BAR_WIDTH) / 100;
    format!(
        "{}{} {}%",
        "▓".repeat(filled),
        "░".repeat(PROGRESS_BAR_WIDTH - filled),
        percentage
    )
}

/// Cut to at most `max` graphemes, marking the cut with an ellipsis
pub fn truncate(text: &str, max: usize) -> String {
    if text.graphemes(true).count() <= max {
        return text.to_string();
    }
    let mut out: String = text.graphemes(true).take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
