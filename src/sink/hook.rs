//! Backend-side observers invoked on every emitted entry.

use std::sync::Mutex;

use tracing::{error, info};

use crate::error::AuditResult;

use super::entry::{Level, LogEntry};

/// Observer attached to the backend.
///
/// Hooks run synchronously on the emitting thread, before the entry is
/// written. The trait is object-safe for use behind `Arc<dyn Hook>`.
pub trait Hook: Send + Sync {
    /// Levels this hook wants to see.
    fn levels(&self) -> &[Level] {
        &[Level::Info, Level::Error]
    }

    /// Handle one entry. Errors are logged by the backend and otherwise ignored.
    fn fire(&self, entry: &LogEntry) -> AuditResult<()>;
}

/// Re-emits every entry as a `tracing` event under target `txaudit::entry`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHook;

impl Hook for TracingHook {
    fn fire(&self, entry: &LogEntry) -> AuditResult<()> {
        let fields = serde_json::to_string(&entry.fields)?;
        match entry.level {
            Level::Info => info!(
                target: "txaudit::entry",
                audit = entry.is_audit(),
                fields = %fields,
                "audit entry"
            ),
            Level::Error => error!(
                target: "txaudit::entry",
                audit = entry.is_audit(),
                fields = %fields,
                "audit entry"
            ),
        }
        Ok(())
    }
}

/// Keeps every entry in memory so tests can assert on what was emitted.
#[derive(Debug, Default)]
pub struct CaptureHook {
    entries: Mutex<Vec<LogEntry>>,
}

impl CaptureHook {
    /// Create an empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured entries, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// The most recent entry, if any.
    pub fn last(&self) -> Option<LogEntry> {
        match self.entries.lock() {
            Ok(guard) => guard.last().cloned(),
            Err(poisoned) => poisoned.into_inner().last().cloned(),
        }
    }

    /// Number of captured entries.
    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Check if nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all captured entries.
    pub fn reset(&self) {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.clear();
    }
}

impl Hook for CaptureHook {
    fn fire(&self, entry: &LogEntry) -> AuditResult<()> {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.push(entry.clone());
        Ok(())
    }
}
