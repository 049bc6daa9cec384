//! Views of a closed transaction.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::sink::{Fields, Level};

/// One segment as it appears in the consolidated entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentRecord {
    /// Classification tag of the segment.
    #[serde(rename = "type")]
    pub kind: String,
    /// Field set of the segment at flush time.
    pub data: Fields,
    /// Whether the segment was marked failed.
    pub failed: bool,
}

/// What a flush emitted, returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRecord {
    /// Caller-supplied transaction id.
    pub id: String,
    /// Unique per opened instance; differs when an id is reused.
    pub instance: Uuid,
    /// Severity of the consolidated entry.
    pub level: Level,
    /// Time between open and flush in milliseconds.
    pub elapsed_ms: u64,
    /// Segments in append order.
    pub segments: Vec<SegmentRecord>,
}

impl TransactionRecord {
    /// Number of segments marked failed.
    pub fn failed_segments(&self) -> usize {
        self.segments.iter().filter(|s| s.failed).count()
    }

    /// Segments as the JSON array placed under `transaction.segments`.
    pub(crate) fn segments_value(&self) -> Value {
        Value::Array(
            self.segments
                .iter()
                .map(|s| {
                    let mut object = Fields::new();
                    object.insert("type".to_string(), Value::String(s.kind.clone()));
                    object.insert("data".to_string(), Value::Object(s.data.clone()));
                    object.insert("failed".to_string(), Value::Bool(s.failed));
                    Value::Object(object)
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_record() -> TransactionRecord {
        TransactionRecord {
            id: "tx1".to_string(),
            instance: Uuid::nil(),
            level: Level::Error,
            elapsed_ms: 12,
            segments: vec![
                SegmentRecord {
                    kind: "http".to_string(),
                    data: Fields::new(),
                    failed: false,
                },
                SegmentRecord {
                    kind: "sql".to_string(),
                    data: Fields::new(),
                    failed: true,
                },
            ],
        }
    }

    #[test]
    fn test_failed_segments() {
        assert_eq!(create_test_record().failed_segments(), 1);
    }

    #[test]
    fn test_record_serialization() {
        let json = serde_json::to_value(create_test_record()).unwrap();
        assert_eq!(json["id"], "tx1");
        assert_eq!(json["level"], "error");
        assert_eq!(json["segments"][0]["type"], "http");
        assert_eq!(json["segments"][1]["failed"], true);
    }

    #[test]
    fn test_segments_value_matches_serialization() {
        let record = create_test_record();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(record.segments_value(), json["segments"]);
        assert_eq!(record.segments_value()[0]["data"], json!({}));
    }
}
