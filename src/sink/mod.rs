//! Logging backend.
//!
//! Accepts a leveled entry with a field set and writes it out. The
//! transaction engine treats it as opaque.
//!
//! ## Features
//!
//! - JSON lines or logfmt-style text output
//! - Hooks observing every entry (tracing bridge, in-memory capture)
//! - Redaction of sensitive segment data
//! - Thread-safe writing to any `Write` destination, including append-mode files

mod backend;
mod entry;
mod formatter;
mod hook;
mod sanitize;

pub use backend::{Backend, Writer};
pub(crate) use backend::open_append;
pub use entry::{Fields, Level, LogEntry};
pub use formatter::{Formatter, JsonFormatter, TextFormatter};
pub use hook::{CaptureHook, Hook, TracingHook};
pub use sanitize::sanitize_fields;
