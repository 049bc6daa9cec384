//! Output formatting for log entries.

use serde_json::{Map, Value};

use crate::error::AuditResult;

use super::entry::LogEntry;

/// Keys the formatters reserve for entry metadata.
const RESERVED_KEYS: &[&str] = &["time", "level"];

/// Turns an entry into one line of output (without the trailing newline).
pub trait Formatter: Send + Sync {
    fn format(&self, entry: &LogEntry) -> AuditResult<String>;
}

/// One JSON object per line, fields flattened next to `time` and `level`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, entry: &LogEntry) -> AuditResult<String> {
        let mut object = Map::with_capacity(entry.fields.len() + 2);
        for (key, value) in &entry.fields {
            object.insert(prefixed(key), value.clone());
        }
        object.insert("time".to_string(), Value::String(entry.timestamp.clone()));
        object.insert("level".to_string(), Value::String(entry.level.to_string()));

        Ok(serde_json::to_string(&Value::Object(object))?)
    }
}

/// logfmt-style `key=value` pairs, keys sorted.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format(&self, entry: &LogEntry) -> AuditResult<String> {
        let mut line = format!(
            "time={} level={}",
            quote(&entry.timestamp),
            entry.level
        );

        let mut keys: Vec<&String> = entry.fields.keys().collect();
        keys.sort();

        for key in keys {
            let rendered = match &entry.fields[key] {
                Value::String(s) => quote(s),
                other => quote(&serde_json::to_string(other)?),
            };
            line.push(' ');
            line.push_str(&prefixed(key));
            line.push('=');
            line.push_str(&rendered);
        }

        Ok(line)
    }
}

/// Move user keys out of the way of the reserved metadata keys.
fn prefixed(key: &str) -> String {
    if RESERVED_KEYS.contains(&key) {
        format!("fields.{}", key)
    } else {
        key.to_string()
    }
}

/// Quote a value only when it would otherwise be ambiguous.
fn quote(value: &str) -> String {
    let needs_quoting = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '=' || c.is_control());

    if needs_quoting {
        // JSON string escaping is a valid logfmt quoting.
        Value::String(value.to_string()).to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::entry::{Fields, Level};
    use serde_json::json;

    fn create_test_entry() -> LogEntry {
        let mut fields = Fields::new();
        fields.insert("audit".to_string(), json!(false));
        fields.insert("segment.type".to_string(), json!("http"));
        fields.insert("message".to_string(), json!("hello world"));
        fields.insert("level".to_string(), json!("custom"));
        LogEntry {
            timestamp: "2024-01-15T10:30:45.123Z".to_string(),
            level: Level::Error,
            fields,
        }
    }

    #[test]
    fn test_json_formatter() {
        let line = JsonFormatter.format(&create_test_entry()).unwrap();
        let parsed: Value = serde_json::from_str(&line).unwrap();

        assert_eq!(parsed["time"], "2024-01-15T10:30:45.123Z");
        assert_eq!(parsed["level"], "error");
        assert_eq!(parsed["segment.type"], "http");
        assert_eq!(parsed["audit"], false);
        assert_eq!(parsed["fields.level"], "custom");
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_text_formatter() {
        let line = TextFormatter.format(&create_test_entry()).unwrap();

        assert!(line.starts_with("time=2024-01-15T10:30:45.123Z level=error "));
        assert!(line.contains("audit=false"));
        assert!(line.contains("message=\"hello world\""));
        assert!(line.contains("segment.type=http"));
        assert!(line.contains("fields.level=custom"));

        // keys are sorted
        let audit = line.find("audit=").unwrap();
        let segment = line.find("segment.type=").unwrap();
        assert!(audit < segment);
    }

    #[test]
    fn test_text_formatter_nested_values() {
        let mut fields = Fields::new();
        fields.insert("segment.data".to_string(), json!({"method": "GET"}));
        let entry = LogEntry {
            timestamp: "t".to_string(),
            level: Level::Info,
            fields,
        };

        let line = TextFormatter.format(&entry).unwrap();
        assert!(line.contains(r#"segment.data="{\"method\":\"GET\"}""#));
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote(""), "\"\"");
        assert_eq!(quote("a b"), "\"a b\"");
        assert_eq!(quote("k=v"), "\"k=v\"");
    }
}
