//! Text matching helpers for the query engine

use serde_json::Value as JsonValue;

/// Check if haystack contains needle (case-insensitive, ASCII only).
/// Zero-allocation alternative to `haystack.to_lowercase().contains(needle)`.
#[inline]
pub fn contains_ascii_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    if haystack.len() < needle.len() {
        return false;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

/// Split free text into lower-cased alphanumeric tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Text form of a JSON value for substring/equality matching.
/// Strings are used raw; everything else uses its compact serialization.
pub fn value_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contains_ascii_ignore_case() {
        assert!(contains_ascii_ignore_case("Get_Weather", "weather"));
        assert!(contains_ascii_ignore_case("GET_WEATHER", "get_w"));
        assert!(!contains_ascii_ignore_case("get_time", "weather"));

        // Edge cases
        assert!(contains_ascii_ignore_case("anything", ""));
        assert!(!contains_ascii_ignore_case("", "weather"));
        assert!(!contains_ascii_ignore_case("wea", "weather"));
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Get Weather"), vec!["get", "weather"]);
        assert_eq!(tokenize("get_weather-v2"), vec!["get", "weather", "v2"]);
        assert_eq!(tokenize("  "), Vec::<String>::new());
        assert_eq!(tokenize("!!!"), Vec::<String>::new());
    }

    #[test]
    fn test_value_text_string_is_unquoted() {
        assert_eq!(value_text(&json!("hello")), "hello");
    }

    #[test]
    fn test_value_text_non_string_is_serialized() {
        assert_eq!(value_text(&json!(42)), "42");
        assert_eq!(value_text(&json!(true)), "true");
        assert_eq!(value_text(&json!(null)), "null");
        assert_eq!(value_text(&json!({"a": 1})), r#"{"a":1}"#);
    }
}
