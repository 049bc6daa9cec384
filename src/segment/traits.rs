//! Segment trait definition.

use std::fmt;

use crate::sink::Fields;

/// Capability set every event kind implements.
///
/// A segment is one measured unit of work (an outbound HTTP call, a SQL
/// statement, ...). It is mutated by its owner while the work runs, finalized
/// once, then handed to the coordinator where it becomes shared read-only
/// state, so every method takes `&self` and implementations guard their field
/// set internally.
///
/// # Example
///
/// ```ignore
/// pub struct CacheSegment {
///     data: SegmentData,
/// }
///
/// impl Segment for CacheSegment {
///     fn kind(&self) -> &str {
///         "cache"
///     }
///
///     fn mark_failed(&self, err: &dyn fmt::Display) {
///         self.data.record_error(err);
///     }
///
///     fn fields(&self) -> Fields {
///         self.data.snapshot()
///     }
///
///     fn has_failed(&self) -> bool {
///         self.data.has_failed()
///     }
///
///     fn finalize(&self) {
///         self.data.stop();
///     }
/// }
/// ```
pub trait Segment: Send + Sync {
    /// Stable tag identifying the event kind (e.g. "http", "sql").
    fn kind(&self) -> &str;

    /// Record that the unit of work failed.
    ///
    /// A second call overwrites the failure detail of the first.
    fn mark_failed(&self, err: &dyn fmt::Display);

    /// Snapshot of the current field set.
    fn fields(&self) -> Fields;

    /// Whether an error marker is present in the field set.
    fn has_failed(&self) -> bool;

    /// Stop measuring elapsed time and fill any default completion status.
    ///
    /// Calling it again recomputes elapsed time from the same start.
    fn finalize(&self);
}
