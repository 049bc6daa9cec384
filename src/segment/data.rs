//! Shared state for segment implementations.

use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use serde_json::Value;

use crate::sink::Fields;

/// Key holding the failure detail.
pub const ERROR_KEY: &str = "error";

/// Key holding the measured duration.
pub const ELAPSED_KEY: &str = "elapsed_ms";

/// Start timestamp plus a mutex-guarded field set.
///
/// Concrete segments embed this and delegate the bookkeeping parts of the
/// [`Segment`](super::Segment) contract to it.
#[derive(Debug)]
pub struct SegmentData {
    start: Instant,
    fields: Mutex<Fields>,
}

impl SegmentData {
    /// Start measuring now with the given initial fields.
    pub fn new(fields: Fields) -> Self {
        Self {
            start: Instant::now(),
            fields: Mutex::new(fields),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Fields> {
        match self.fields.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(), // Recover from mutex poisoning
        }
    }

    /// Set a field, replacing any previous value.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        self.lock().insert(key.to_string(), value.into());
    }

    /// Set a field only if it is not present yet.
    pub fn set_if_absent(&self, key: &str, value: impl Into<Value>) {
        self.lock()
            .entry(key.to_string())
            .or_insert_with(|| value.into());
    }

    /// Apply several mutations under one lock hold.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Fields),
    {
        f(&mut self.lock());
    }

    /// Read a single field.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// Copy of the whole field set.
    pub fn snapshot(&self) -> Fields {
        self.lock().clone()
    }

    /// Store the failure detail under `error`.
    pub fn record_error(&self, err: &dyn fmt::Display) {
        self.set(ERROR_KEY, err.to_string());
    }

    /// Whether a non-null `error` field is present.
    pub fn has_failed(&self) -> bool {
        matches!(self.get(ERROR_KEY), Some(v) if !v.is_null())
    }

    /// Milliseconds since the segment started.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Store the elapsed time under `elapsed_ms`.
    pub fn stop(&self) {
        let elapsed = self.elapsed_ms();
        self.set(ELAPSED_KEY, elapsed);
    }
}

impl Default for SegmentData {
    fn default() -> Self {
        Self::new(Fields::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_set_and_snapshot() {
        let data = SegmentData::default();
        data.set("driver", "postgres");
        data.set("rows", 3);

        let fields = data.snapshot();
        assert_eq!(fields["driver"], "postgres");
        assert_eq!(fields["rows"], 3);
        assert_eq!(data.get("driver"), Some(json!("postgres")));
        assert_eq!(data.get("missing"), None);
    }

    #[test]
    fn test_set_if_absent_keeps_existing() {
        let data = SegmentData::default();
        data.set("status_code", 404);
        data.set_if_absent("status_code", 200);
        data.set_if_absent("other", 1);

        assert_eq!(data.get("status_code"), Some(json!(404)));
        assert_eq!(data.get("other"), Some(json!(1)));
    }

    #[test]
    fn test_record_error_overwrites() {
        let data = SegmentData::default();
        assert!(!data.has_failed());

        data.record_error(&"first");
        data.record_error(&"second");

        assert!(data.has_failed());
        assert_eq!(data.get(ERROR_KEY), Some(json!("second")));
    }

    #[test]
    fn test_null_error_is_not_failure() {
        let data = SegmentData::default();
        data.set(ERROR_KEY, Value::Null);
        assert!(!data.has_failed());
    }

    #[test]
    fn test_stop_measures_elapsed() {
        let data = SegmentData::default();
        std::thread::sleep(Duration::from_millis(5));
        data.stop();

        let elapsed = data.get(ELAPSED_KEY).and_then(|v| v.as_u64()).unwrap();
        assert!(elapsed >= 5);

        // a second stop recomputes from the same start
        data.stop();
        let again = data.get(ELAPSED_KEY).and_then(|v| v.as_u64()).unwrap();
        assert!(again >= elapsed);
    }

    #[test]
    fn test_concurrent_mutation() {
        let data = SegmentData::default();
        std::thread::scope(|s| {
            for i in 0..8 {
                let data = &data;
                s.spawn(move || data.set(&format!("k{}", i), i));
            }
        });
        assert_eq!(data.snapshot().len(), 8);
    }
}
