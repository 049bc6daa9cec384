//! SQL segment.

use std::fmt;

use serde_json::Value;

use crate::sink::Fields;

use super::data::SegmentData;
use super::traits::Segment;

/// Segment for one SQL statement.
#[derive(Debug)]
pub struct SqlSegment {
    data: SegmentData,
}

impl SqlSegment {
    /// Start measuring a statement about to run on `driver`.
    pub fn new(driver: &str, statement: &str, params: Fields) -> Self {
        let mut fields = Fields::new();
        fields.insert("statement".to_string(), Value::String(statement.to_string()));
        fields.insert("params".to_string(), Value::Object(params));
        fields.insert("driver".to_string(), Value::String(driver.to_string()));

        Self {
            data: SegmentData::new(fields),
        }
    }

    /// Record the outcome of an exec-style call.
    ///
    /// Drivers that cannot report affected rows pass `None`, which leaves
    /// `rows_affected` unset.
    pub fn exec_response(&self, rows_affected: Option<u64>) {
        if let Some(rows) = rows_affected {
            self.data.set("rows_affected", rows);
        }
    }

    /// Record the columns of a query result set.
    pub fn query_response<S: AsRef<str>>(&self, columns: &[S]) {
        let columns: Vec<Value> = columns
            .iter()
            .map(|c| Value::String(c.as_ref().to_string()))
            .collect();
        self.data.set("columns", columns);
    }
}

impl Segment for SqlSegment {
    fn kind(&self) -> &str {
        "sql"
    }

    fn mark_failed(&self, err: &dyn fmt::Display) {
        self.data.record_error(err);
    }

    fn fields(&self) -> Fields {
        self.data.snapshot()
    }

    fn has_failed(&self) -> bool {
        self.data.has_failed()
    }

    fn finalize(&self) {
        self.data.stop();
    }
}
