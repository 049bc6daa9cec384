//! Segments: measured units of work attached to a transaction.
//!
//! The coordinator only ever sees the [`Segment`] trait. The HTTP and SQL
//! kinds here are ready-made implementations; applications register their
//! own kinds by implementing the trait, usually on top of [`SegmentData`].

mod data;
mod http;
mod sql;
mod traits;

pub use self::data::{SegmentData, ELAPSED_KEY, ERROR_KEY};
pub use self::http::{HttpSegment, ServerSegment};
pub use self::sql::SqlSegment;
pub use self::traits::Segment;
