//! Log entry types.
//!
//! Defines the leveled event handed to the backend.

use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A set of named values attached to an entry.
pub type Fields = Map<String, Value>;

/// Severity of an emitted entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Normal completion.
    Info,
    /// Something in the unit of work failed.
    Error,
}

impl Level {
    /// Pick `Error` when `failed` is set, `Info` otherwise.
    pub fn from_failed(failed: bool) -> Self {
        if failed {
            Level::Error
        } else {
            Level::Info
        }
    }

    /// Lowercase name used in formatted output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry as it reaches the backend.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// RFC 3339 timestamp when the entry was emitted.
    pub timestamp: String,
    /// Severity of the entry.
    pub level: Level,
    /// Field set carried by the entry.
    pub fields: Fields,
}

impl LogEntry {
    /// Create an entry stamped with the current time.
    pub fn new(level: Level, fields: Fields) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level,
            fields,
        }
    }

    /// Look up a field by key.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Whether this is a transaction-level audit record.
    pub fn is_audit(&self) -> bool {
        self.field("audit").and_then(Value::as_bool) == Some(true)
    }
}
