//! JSON extraction and repair for model output
//!
//! Models reliably wrap JSON in prose or markdown fences, and occasionally
//! drop a key's opening quote or leave a trailing comma. This module peels
//! the payload out of the surrounding text and applies exactly those two
//! syntactic repairs before giving up - no semantic guessing beyond that.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::AgentError;

/// Matches a key that lost its opening quote: `title": ...`
static MISSING_KEY_QUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(\s*)([A-Za-z_][A-Za-z0-9_]*)": "#).unwrap());

/// Matches a trailing comma immediately before a closing brace or bracket
static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*([}\]])").unwrap());

/// Pull the JSON payload out of free-form model text
///
/// Takes the first fenced code block if any (optionally tagged `json`),
/// otherwise slices from the first `{` to the last `}` to discard
/// surrounding prose.
pub fn extract_json(text: &str) -> String {
    let mut candidate = text.trim();

    if let Some(block) = fenced_block(candidate) {
        candidate = block.trim();
    }

    // Bare arrays are a valid day-block shape; only objects get the
    // prose-discarding brace slice
    if !candidate.starts_with('{')
        && !candidate.starts_with('[')
        && let (Some(start), Some(end)) = (candidate.find('{'), candidate.rfind('}'))
        && start < end
    {
        candidate = &candidate[start..=end];
    }

    candidate.to_string()
}

/// Contents of the first fenced code block, if the text has one
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let body = &text[start + 3..];
    let body = body.strip_prefix("json").unwrap_or(body);
    let end = body.find("```")?;
    Some(&body[..end])
}

/// Apply the two known-mechanical repairs to near-valid JSON
///
/// Per line, reinsert a key's missing opening quote; then strip trailing
/// commas before `}` or `]`.
pub fn repair_json(text: &str) -> String {
    let lines: Vec<String> = text
        .lines()
        .map(|line| {
            MISSING_KEY_QUOTE
                .replace(line, "${1}\"${2}\": ")
                .into_owned()
        })
        .collect();
    let joined = lines.join("\n");

    TRAILING_COMMA.replace_all(&joined, "$1").into_owned()
}

/// Extract, parse, and on failure repair-then-reparse
///
/// The returned error carries the offending text; there is no further
/// fallback past the single repair attempt.
pub fn parse_model_json(text: &str) -> Result<serde_json::Value, AgentError> {
    let candidate = extract_json(text);

    match serde_json::from_str(&candidate) {
        Ok(value) => Ok(value),
        Err(first_err) => {
            debug!(error = %first_err, "Strict parse failed, attempting repair");
            let repaired = repair_json(&candidate);
            serde_json::from_str(&repaired).map_err(|e| AgentError::MalformedResponse {
                message: e.to_string(),
                raw: text.to_string(),
            })
        }
    }
}

/// Pretty-print the embedded payload when it parses, else the verbatim text
///
/// Used for debug artifacts: readable when possible, faithful otherwise.
pub fn pretty_or_verbatim(text: &str) -> String {
    let candidate = extract_json(text);
    match serde_json::from_str::<serde_json::Value>(&candidate) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| text.to_string()),
        Err(_) => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain_json() {
        let text = r#"{"title": "Lisbon"}"#;
        assert_eq!(extract_json(text), text);
    }

    #[test]
    fn test_extract_fenced_block() {
        let text = "Here is your itinerary:\n```json\n{\"title\": \"Lisbon\"}\n```\nEnjoy!";
        assert_eq!(extract_json(text), r#"{"title": "Lisbon"}"#);
    }

    #[test]
    fn test_extract_untagged_fence() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json(text), r#"{"a": 1}"#);
    }

    #[test]
    fn test_extract_takes_first_fence() {
        let text = "```json\n{\"first\": 1}\n```\nand also\n```json\n{\"second\": 2}\n```";
        assert_eq!(extract_json(text), r#"{"first": 1}"#);
    }

    #[test]
    fn test_extract_slices_surrounding_prose() {
        let text = "Sure thing! {\"title\": \"Lisbon\"} Hope that helps.";
        assert_eq!(extract_json(text), r#"{"title": "Lisbon"}"#);
    }

    #[test]
    fn test_repair_missing_key_quote() {
        let broken = "{\n  title\": \"Lisbon\",\n  \"days\": 5\n}";
        let repaired = repair_json(broken);
        let value: serde_json::Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(value["title"], "Lisbon");
        assert_eq!(value["days"], 5);
    }

    #[test]
    fn test_repair_trailing_commas() {
        let broken = r#"{"items": ["a", "b",], "n": 2,}"#;
        let repaired = repair_json(broken);
        let value: serde_json::Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(value["items"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_fenced_trailing_comma_round_trips() {
        // Extraction + repair must yield the same structure as parsing the
        // comma-free equivalent directly
        let fenced = "```json\n{\"title\": \"Lisbon\", \"tags\": [\"sun\", \"food\",],}\n```";
        let clean = r#"{"title": "Lisbon", "tags": ["sun", "food"]}"#;

        let parsed = parse_model_json(fenced).unwrap();
        let expected: serde_json::Value = serde_json::from_str(clean).unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_parse_failure_carries_raw_text() {
        let garbage = "I could not produce an itinerary today, sorry.";
        let err = parse_model_json(garbage).unwrap_err();
        match err {
            AgentError::MalformedResponse { raw, .. } => {
                assert_eq!(raw, garbage);
            }
            other => panic!("Expected MalformedResponse, got: {other}"),
        }
    }

    #[test]
    fn test_extract_keeps_bare_arrays() {
        let text = "[{\"day_number\": 1}, {\"day_number\": 2}]";
        let parsed = parse_model_json(text).unwrap();
        assert!(parsed.is_array());
    }

    #[test]
    fn test_repair_does_not_touch_valid_strings() {
        let valid = r#"{"note": "arrive, then rest"}"#;
        let parsed = parse_model_json(valid).unwrap();
        assert_eq!(parsed["note"], "arrive, then rest");
    }

    #[test]
    fn test_pretty_or_verbatim_pretty_prints() {
        let text = "```json\n{\"a\":1}\n```";
        let pretty = pretty_or_verbatim(text);
        assert!(pretty.contains("\"a\": 1"));
    }

    #[test]
    fn test_pretty_or_verbatim_falls_back() {
        let text = "not json at all";
        assert_eq!(pretty_or_verbatim(text), text);
    }
}
