//! txaudit
//!
//! Transaction-scoped audit logging. Related events ("segments") are grouped
//! under a named transaction: each segment is logged on its own as soon as it
//! is appended, and flushing the transaction emits one consolidated audit
//! entry.
//!
//! ```no_run
//! use std::sync::Arc;
//! use txaudit::{Coordinator, Fields, InitOption, JsonFormatter, Segment, SqlSegment};
//!
//! let coordinator = Coordinator::initialize(vec![
//!     InitOption::format(JsonFormatter),
//!     InitOption::default_fields([("environment", "production")]),
//! ]);
//!
//! coordinator.open_transaction("checkout-42")?;
//!
//! let query = SqlSegment::new("postgres", "SELECT 1", Fields::new());
//! query.finalize();
//! coordinator.append_segment("checkout-42", Arc::new(query))?;
//!
//! coordinator.flush_transaction("checkout-42")?;
//! # Ok::<(), txaudit::AuditError>(())
//! ```

pub mod config;
pub mod error;
pub mod segment;
pub mod sink;
pub mod transaction;

pub use config::Settings;
pub use error::{AuditError, AuditResult, TransactionErrorKind};
pub use segment::{HttpSegment, Segment, SegmentData, ServerSegment, SqlSegment};
pub use sink::{
    Backend, CaptureHook, Fields, Formatter, Hook, JsonFormatter, Level, LogEntry, TextFormatter,
    TracingHook,
};
pub use transaction::{Coordinator, InitOption, SegmentRecord, TransactionRecord};
