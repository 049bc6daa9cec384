//! Transaction lifecycle.
//!
//! A [`Coordinator`] maps caller-supplied ids to open transactions. Segments
//! appended to a transaction are logged individually right away; flushing the
//! transaction emits one consolidated audit entry and frees the id.

mod coordinator;
mod inner;
mod options;
mod record;

pub use coordinator::{Coordinator, AUDIT_KEY};
pub use options::InitOption;
pub use record::{SegmentRecord, TransactionRecord};
