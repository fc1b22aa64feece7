use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::domain::error::{AppError, Result};

static THINK_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<think>[\s\S]*?</think>|<think\s*/>").unwrap());

static REASONING_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<reasoning>[\s\S]*?</reasoning>").unwrap());

static JSON_OBJECT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Removes reasoning blocks some models emit ahead of the answer.
pub fn clean_llm_response(response: &str) -> String {
    let cleaned = THINK_TAG_PATTERN.replace_all(response, "");
    let cleaned = REASONING_TAG_PATTERN.replace_all(&cleaned, "");
    cleaned.trim().to_string()
}

fn strip_code_fence(value: &str) -> &str {
    let trimmed = value.trim();
    if let Some(stripped) = trimmed.strip_prefix("```json") {
        return stripped.trim().trim_end_matches("```").trim();
    }
    if let Some(stripped) = trimmed.strip_prefix("```") {
        return stripped.trim().trim_end_matches("```").trim();
    }
    trimmed
}

/// Reads a single string field from a structured model answer.
///
/// The answer is expected to be a JSON object such as `{"item_pred": "pump"}`, optionally
/// wrapped in a code fence or surrounded by prose. An answer with no JSON object at all is
/// taken verbatim as the field value.
pub fn extract_field(raw: &str, field: &str) -> Result<String> {
    let cleaned = clean_llm_response(raw);
    let body = strip_code_fence(&cleaned);

    let candidate = match serde_json::from_str::<Value>(body) {
        Ok(value) => Some(value),
        Err(_) => JSON_OBJECT_PATTERN
            .find(body)
            .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok()),
    };

    match candidate {
        Some(Value::Object(map)) => match map.get(field) {
            Some(Value::String(s)) => Ok(s.trim().to_string()),
            Some(Value::Null) => Ok(String::new()),
            Some(other) => Ok(other.to_string()),
            None => Err(AppError::ParseError(format!(
                "Model output is missing field '{}'",
                field
            ))),
        },
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        _ if !body.contains('{') => Ok(body.trim_matches('"').trim().to_string()),
        _ => Err(AppError::ParseError(format!(
            "Model output for '{}' is not valid JSON",
            field
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_think_tags() {
        let input = "<think>Some reasoning here</think>The actual response";
        assert_eq!(clean_llm_response(input), "The actual response");
    }

    #[test]
    fn test_clean_self_closing_think() {
        assert_eq!(clean_llm_response("<think />answer"), "answer");
    }

    #[test]
    fn test_clean_reasoning_tags() {
        let input = "<reasoning>Internal reasoning</reasoning>Final answer";
        assert_eq!(clean_llm_response(input), "Final answer");
    }

    #[test]
    fn test_extract_plain_json() {
        let raw = r#"{"item_pred": " water pump "}"#;
        assert_eq!(extract_field(raw, "item_pred").unwrap(), "water pump");
    }

    #[test]
    fn test_extract_fenced_json_after_think() {
        let raw = "<think>hmm</think>\n```json\n{\"category_fixed\": \"Pumps\"}\n```";
        assert_eq!(extract_field(raw, "category_fixed").unwrap(), "Pumps");
    }

    #[test]
    fn test_extract_json_embedded_in_prose() {
        let raw = "Here you go: {\"spec_pred_fixed\": \"brand abc|item pump\"} hope it helps";
        assert_eq!(
            extract_field(raw, "spec_pred_fixed").unwrap(),
            "brand abc|item pump"
        );
    }

    #[test]
    fn test_extract_plain_text_fallback() {
        assert_eq!(extract_field("\"pump\"", "item_pred").unwrap(), "pump");
    }

    #[test]
    fn test_extract_missing_field() {
        let err = extract_field(r#"{"other": "x"}"#, "item_pred").unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[test]
    fn test_extract_broken_json() {
        let err = extract_field("{\"item_pred\": ", "item_pred").unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }
}
