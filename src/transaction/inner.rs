//! A single open transaction.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use serde_json::Value;
use uuid::Uuid;

use crate::segment::{Segment, ERROR_KEY};
use crate::sink::{sanitize_fields, Fields, Level};

use super::record::{SegmentRecord, TransactionRecord};

/// Ordered, append-only collection of segments plus the entry context bound
/// when the transaction was opened.
///
/// Only reachable through the coordinator.
pub(crate) struct Transaction {
    id: String,
    instance: Uuid,
    opened_at: Instant,
    context: Mutex<Fields>,
    segments: Mutex<Vec<Arc<dyn Segment>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl Transaction {
    /// Open a transaction with the given context fields.
    pub(crate) fn new(id: &str, context: Fields) -> Self {
        Self {
            id: id.to_string(),
            instance: Uuid::new_v4(),
            opened_at: Instant::now(),
            context: Mutex::new(context),
            segments: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn instance(&self) -> Uuid {
        self.instance
    }

    /// Append a segment. Concurrent callers serialize on the segment lock.
    pub(crate) fn append(&self, segment: Arc<dyn Segment>) {
        lock(&self.segments).push(segment);
    }

    /// Record a transaction-level failure in the bound context.
    pub(crate) fn set_error(&self, err: &dyn fmt::Display) {
        lock(&self.context).insert(ERROR_KEY.to_string(), Value::String(err.to_string()));
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.segments).len()
    }

    /// Build the consolidated entry fields and the matching record.
    ///
    /// The entry is at error level when the context carries `error` or when
    /// any appended segment failed.
    pub(crate) fn close(&self, sanitize: bool) -> (Fields, TransactionRecord) {
        let segments: Vec<SegmentRecord> = lock(&self.segments)
            .iter()
            .map(|segment| {
                let data = segment.fields();
                SegmentRecord {
                    kind: segment.kind().to_string(),
                    data: if sanitize { sanitize_fields(&data) } else { data },
                    failed: segment.has_failed(),
                }
            })
            .collect();

        let mut fields = lock(&self.context).clone();
        let context_failed = matches!(fields.get(ERROR_KEY), Some(v) if !v.is_null());

        let record = TransactionRecord {
            id: self.id.clone(),
            instance: self.instance,
            level: Level::Info,
            elapsed_ms: u64::try_from(self.opened_at.elapsed().as_millis()).unwrap_or(u64::MAX),
            segments,
        };
        let failed_segments = record.failed_segments();
        let record = TransactionRecord {
            level: Level::from_failed(context_failed || failed_segments > 0),
            ..record
        };

        fields.insert("transaction.id".to_string(), Value::String(record.id.clone()));
        fields.insert(
            "transaction.instance".to_string(),
            Value::String(record.instance.to_string()),
        );
        fields.insert("transaction.elapsed_ms".to_string(), record.elapsed_ms.into());
        fields.insert("transaction.segments".to_string(), record.segments_value());
        fields.insert(
            "transaction.failed_segments".to_string(),
            failed_segments.into(),
        );

        (fields, record)
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("instance", &self.instance)
            .field("segments", &self.len())
            .finish()
    }
}
