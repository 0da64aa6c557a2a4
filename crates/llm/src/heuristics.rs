//! Keyword heuristics
//!
//! Deterministic scoring used by the mock gateway and as the degraded path
//! when the model is unreachable. English and Japanese keywords are both
//! recognised; matching is case-insensitive substring search.

use sales_coach_config::constants::completeness;
use sales_coach_core::{
    EmotionalTone, Level, ResponseAnalysis, Sentiment, SentimentAnalysis, Turn, TurnRole,
};

const KEY_POINT_CHARS: usize = 50;

const CAN_DO_PHRASES: &[&str] = &["i can", "i want to", "i will", "できる", "やりたい"];
const CLIENT_A_MARKERS: &[&str] = &["client a", "company a", "a社"];
const TIME_MARKERS: &[&str] = &["time", "時間"];

const POSITIVE_KEYWORDS: &[&str] = &[
    "success", "good", "can do", "learn", "improv", "satisf", "on track", "achiev",
    "成功", "良い", "できる", "学ぶ", "向上", "改善", "満足", "順調", "達成",
];
const NEGATIVE_KEYWORDS: &[&str] = &[
    "trouble", "difficult", "fail", "problem", "worr", "anxious", "struggl", "nervous",
    "mind went blank", "困る", "難しい", "失敗", "問題", "悩み", "不安", "苦手", "緊張",
    "頭が真っ白",
];
const FRUSTRATION_MARKERS: &[&str] = &["fail", "trouble", "失敗", "困"];
const URGENT_KEYWORDS: &[&str] = &[
    "urgent", "asap", "immediately", "right away", "tomorrow", "today",
    "緊急", "急", "すぐに", "至急", "明日", "今日",
];
const TOPICS: &[(&str, &[&str])] = &[
    ("Presentation", &["presentation", "pitch", "meeting", "プレゼン", "発表", "商談"]),
    ("Sales skills", &["sales", "revenue", "customer", "営業", "売上", "顧客"]),
    ("Communication", &["talk", "conversation", "explain", "話", "会話", "伝える"]),
    ("Nerves and anxiety", &["nervous", "anxious", "blank", "緊張", "不安", "真っ白"]),
];
const DEFAULT_TOPIC: &str = "General consultation";

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn count_matches(haystack: &str, needles: &[&str]) -> usize {
    needles.iter().filter(|n| haystack.contains(*n)).count()
}

/// Analyze a reply without a model
pub fn analyze_response(text: &str) -> ResponseAnalysis {
    let lower = text.to_lowercase();
    let char_count = text.chars().count();

    let key_point = if char_count > KEY_POINT_CHARS {
        format!("{}...", text.chars().take(KEY_POINT_CHARS).collect::<String>())
    } else {
        text.to_string()
    };

    let emotional_state = if contains_any(&lower, CAN_DO_PHRASES) {
        "positive"
    } else {
        "anxious"
    };

    let success_patterns = if contains_any(&lower, CLIENT_A_MARKERS) {
        vec!["Good relationship with Client A".to_string()]
    } else {
        Vec::new()
    };

    let challenge = if contains_any(&lower, TIME_MARKERS) {
        "Finding time"
    } else {
        "Hitting the target"
    };

    ResponseAnalysis {
        key_points: vec![key_point],
        emotional_state: emotional_state.to_string(),
        understanding_level: if char_count > KEY_POINT_CHARS { 8 } else { 5 },
        success_patterns,
        challenges: vec![challenge.to_string()],
        next_action_hint: "Move to the next step".to_string(),
        phase_complete: false,
    }
}

/// Keyword sentiment of one message
pub fn analyze_sentiment(text: &str) -> SentimentAnalysis {
    let lower = text.to_lowercase();
    let positive = count_matches(&lower, POSITIVE_KEYWORDS);
    let negative = count_matches(&lower, NEGATIVE_KEYWORDS);

    let (sentiment, emotional_state) = if negative > positive {
        let tone = if contains_any(&lower, FRUSTRATION_MARKERS) {
            EmotionalTone::Frustrated
        } else {
            EmotionalTone::Confused
        };
        (Sentiment::Negative, tone)
    } else if positive > negative {
        (Sentiment::Positive, EmotionalTone::Motivated)
    } else {
        (Sentiment::Neutral, EmotionalTone::Neutral)
    };

    let mut key_topics: Vec<String> = TOPICS
        .iter()
        .filter(|(_, keywords)| contains_any(&lower, keywords))
        .map(|(topic, _)| topic.to_string())
        .collect();
    if key_topics.is_empty() {
        key_topics.push(DEFAULT_TOPIC.to_string());
    }

    SentimentAnalysis {
        sentiment,
        emotional_state,
        urgency: if contains_any(&lower, URGENT_KEYWORDS) {
            Level::High
        } else {
            Level::Medium
        },
        key_topics,
        confidence_level: if positive.abs_diff(negative) > 1 {
            Level::High
        } else {
            Level::Medium
        },
    }
}

fn user_turns(history: &[Turn]) -> impl Iterator<Item = &Turn> {
    history.iter().filter(|t| t.role == TurnRole::User)
}

/// Turn count plus keyword bonus, capped at 100
pub fn completeness_score(history: &[Turn]) -> u8 {
    let turns = user_turns(history).count() as u32;
    let base = (turns * completeness::POINTS_PER_USER_TURN).min(completeness::MOCK_TURN_CAP);

    let text = user_turns(history)
        .map(|t| t.content.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    let bonus = count_matches(&text, completeness::BONUS_KEYWORDS) as u32
        * completeness::KEYWORD_BONUS;

    (base + bonus).min(100) as u8
}

/// Score used when the model's answer is not a number
pub fn fallback_completeness(history: &[Turn]) -> u8 {
    let turns = user_turns(history).count() as u32;
    (turns * completeness::POINTS_PER_USER_TURN).min(completeness::FALLBACK_TURN_CAP) as u8
}
