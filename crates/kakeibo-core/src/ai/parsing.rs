//! JSON parsing helpers for AI backend responses
//!
//! Models often wrap the JSON payload in prose or code fences, so the object
//! is cut out of the response before parsing.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::models::Category;

/// Truncate long responses for error messages
fn truncated(text: &str) -> String {
    match text.char_indices().nth(200) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Cut the outermost `{...}` out of a model response
pub fn extract_json_object(response: &str) -> Result<&str> {
    let response = response.trim();
    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => Err(Error::InvalidResponse(format!(
            "No JSON object found | Raw: {}",
            truncated(response)
        ))),
    }
}

/// Validate a numbered category response for a chunk of `expected` entries
///
/// Every key "1" through "N" must be present and hold a string; anything
/// else fails the whole chunk. A string that is not a known label is not a
/// failure: it comes back as `None` for the caller to default.
pub fn parse_category_response(response: &str, expected: usize) -> Result<Vec<Option<Category>>> {
    let json_str = extract_json_object(response)?;
    let value: Value = serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidResponse(format!("Invalid JSON from AI: {} | Raw: {}", e, truncated(json_str)))
    })?;

    let object: &Map<String, Value> = value
        .as_object()
        .ok_or_else(|| Error::InvalidResponse("Response is not a JSON object".into()))?;

    (1..=expected)
        .map(|number| {
            let key = number.to_string();
            match object.get(&key) {
                None => Err(Error::InvalidResponse(format!("Missing entry {}", key))),
                Some(Value::Null) => Err(Error::InvalidResponse(format!("Entry {} is null", key))),
                Some(Value::String(label)) => Ok(Category::from_label(label)),
                Some(other) => Err(Error::InvalidResponse(format!(
                    "Entry {} is not a string: {}",
                    key, other
                ))),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_object_with_text() {
        let response = "Here you go:\n```json\n{\"1\": \"Food\"}\n```";
        assert_eq!(extract_json_object(response).unwrap(), "{\"1\": \"Food\"}");
    }

    #[test]
    fn test_extract_json_object_missing() {
        let err = extract_json_object("I cannot help with that").unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_category_response() {
        let response = r#"{"1": "Food", "2": "transport", "3": "Groceries"}"#;
        let categories = parse_category_response(response, 3).unwrap();
        assert_eq!(
            categories,
            vec![Some(Category::Food), Some(Category::Transport), None]
        );
    }

    #[test]
    fn test_parse_category_response_ignores_extra_keys() {
        let response = r#"{"1": "Food", "2": "Other", "7": "Housing"}"#;
        let categories = parse_category_response(response, 2).unwrap();
        assert_eq!(categories.len(), 2);
    }

    #[test]
    fn test_parse_category_response_missing_key() {
        let err = parse_category_response(r#"{"1": "Food"}"#, 2).unwrap_err();
        assert!(err.to_string().contains("Missing entry 2"));
    }

    #[test]
    fn test_parse_category_response_null_and_non_string() {
        let err = parse_category_response(r#"{"1": null}"#, 1).unwrap_err();
        assert!(err.to_string().contains("Entry 1 is null"));

        let err = parse_category_response(r#"{"1": 3}"#, 1).unwrap_err();
        assert!(err.to_string().contains("Entry 1 is not a string"));
    }

    #[test]
    fn test_parse_category_response_not_object() {
        // No braces at all
        let err = parse_category_response(r#"["Food"]"#, 1).unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));

        let err = parse_category_response("{not json}", 1).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }
}
