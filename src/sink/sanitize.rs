//! Redaction of segment data before it is emitted.
//!
//! HTTP headers and SQL parameters routinely carry credentials; the emitted
//! copy of a segment's field set is scrubbed here when redaction is enabled.
//! The segment itself keeps its original values.
//!
//! Keys are matched word by word after splitting on `_`, `-`, `.` and
//! whitespace: `X-Session-Id` and `access_token` are redacted, `session_count`
//! and `max_tokens` are not.

use serde_json::{Map, Value};

use super::entry::Fields;

/// Word sequences whose values are redacted.
const SENSITIVE_KEYS: &[&[&str]] = &[
    &["password"],
    &["passwd"],
    &["secret"],
    &["token"],
    &["credential"],
    &["credentials"],
    &["private", "key"],
    &["api", "key"],
    &["apikey"],
    &["authorization"],
    &["cookie"],
    &["session", "id"],
    &["sessionid"],
];

/// Maximum length for string values before truncation.
const MAX_STRING_LENGTH: usize = 1024;

/// Words whose string values are truncated if too long.
const TRUNCATABLE_KEYS: &[&str] = &["body", "content", "payload", "data"];

/// Sanitize a field set for emission.
///
/// 1. Redacts values for sensitive keys (password, authorization, ...)
/// 2. Truncates long strings under body/content/payload/data keys
/// 3. Recursively processes nested objects and arrays
pub fn sanitize_fields(fields: &Fields) -> Fields {
    sanitize_map(fields)
}

fn key_words(key: &str) -> Vec<String> {
    key.split(|c: char| matches!(c, '_' | '-' | '.') || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn is_sensitive(words: &[String]) -> bool {
    SENSITIVE_KEYS.iter().any(|pattern| {
        words
            .windows(pattern.len())
            .any(|window| window.iter().zip(pattern.iter()).all(|(w, p)| w == p))
    })
}

fn sanitize_map(map: &Map<String, Value>) -> Map<String, Value> {
    let mut sanitized = Map::new();
    for (key, val) in map {
        let words = key_words(key);

        let redact = is_sensitive(&words);
        let should_truncate = words
            .iter()
            .any(|word| TRUNCATABLE_KEYS.contains(&word.as_str()));

        if redact {
            sanitized.insert(key.clone(), Value::String("[REDACTED]".to_string()));
        } else {
            sanitized.insert(key.clone(), sanitize(val, should_truncate));
        }
    }
    sanitized
}

fn sanitize(value: &Value, is_truncatable: bool) -> Value {
    match value {
        Value::Object(map) => Value::Object(sanitize_map(map)),
        Value::Array(arr) => Value::Array(
            arr.iter()
                .map(|v| sanitize(v, is_truncatable))
                .collect(),
        ),
        Value::String(s) if is_truncatable && s.len() > MAX_STRING_LENGTH => {
            Value::String(format!("[TRUNCATED - {} bytes]", s.len()))
        }
        _ => value.clone(),
    }
}
