//! Error types for txaudit.
//!
//! Provides a unified error handling system using thiserror.

mod types;

pub use types::*;
