//! Structured output extraction
//!
//! Models wrap JSON in prose or code fences. The first `{` through the last
//! `}` is taken as the object and deserialized into the target schema.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

use crate::LlmError;

static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());
static LEADING_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+").unwrap());

/// The outermost `{...}` span in `text`, if any
pub fn extract_json_object(text: &str) -> Option<&str> {
    JSON_OBJECT.find(text).map(|m| m.as_str())
}

/// Deserialize the JSON object embedded in `raw`
///
/// Fails with `LlmError::MalformedOutput` carrying the raw text when there is
/// no object or it does not fit `T`.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T, LlmError> {
    let json = extract_json_object(raw).ok_or_else(|| LlmError::MalformedOutput {
        raw: raw.to_string(),
    })?;

    serde_json::from_str(json).map_err(|e| {
        tracing::debug!(error = %e, "Model output did not match schema");
        LlmError::MalformedOutput {
            raw: raw.to_string(),
        }
    })
}

/// Parse a bare score such as `75` or `Score: 75`, clamped to 0..=100
pub fn parse_score(raw: &str) -> Option<u8> {
    let value: i64 = LEADING_INTEGER.find(raw.trim())?.as_str().parse().ok()?;
    Some(value.clamp(0, 100) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sales_coach_core::{SocraticQuestion, SummaryBundle};

    #[test]
    fn test_extract_from_code_fence() {
        let raw = "Here you go:\n```json\n{\"question\": \"Why?\"}\n```\nGood luck";
        assert_eq!(extract_json_object(raw), Some("{\"question\": \"Why?\"}"));
        assert_eq!(extract_json_object("no braces here"), None);
    }

    #[test]
    fn test_parse_nested_object() {
        let raw = r#"Summary: {"message": "Well done", "action_plan": {"progress_check": {"weekly": "visits"}}}"#;
        let bundle: SummaryBundle = parse_structured(raw).unwrap();
        assert_eq!(bundle.message, "Well done");
        assert_eq!(bundle.action_plan.progress_check.weekly, "visits");
    }

    #[test]
    fn test_malformed_output_keeps_raw() {
        let raw = "I think you should ask about their customers.";
        match parse_structured::<SocraticQuestion>(raw) {
            Err(LlmError::MalformedOutput { raw: kept }) => assert_eq!(kept, raw),
            other => panic!("expected MalformedOutput, got {:?}", other),
        }

        // Object present but missing the required field
        let raw = r#"{"purpose": "x"}"#;
        assert!(matches!(
            parse_structured::<SocraticQuestion>(raw),
            Err(LlmError::MalformedOutput { .. })
        ));
    }

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score("75"), Some(75));
        assert_eq!(parse_score(" Score: 120 "), Some(100));
        assert_eq!(parse_score("-5"), Some(0));
        assert_eq!(parse_score("about half"), None);
    }
}
