//! The logging backend: formats entries, runs hooks and writes lines.
//!
//! Writes are synchronous and serialized through an internal mutex. A failing
//! hook or writer never surfaces to the caller; it is reported through
//! `tracing` and the entry is otherwise dropped.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::error::AuditResult;

use super::entry::{Fields, Level, LogEntry};
use super::formatter::{Formatter, TextFormatter};
use super::hook::Hook;

/// Destination of formatted lines.
pub type Writer = Box<dyn Write + Send>;

/// Backend that accepts leveled entries with a field set.
pub struct Backend {
    /// The output wrapped in a mutex for thread safety.
    writer: Mutex<Writer>,
    formatter: Box<dyn Formatter>,
    hooks: Vec<Arc<dyn Hook>>,
}

impl Backend {
    /// Create a backend writing text lines to stderr.
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stderr()))
    }

    /// Create a backend writing text lines to the given writer.
    pub fn with_writer(writer: Writer) -> Self {
        Self {
            writer: Mutex::new(writer),
            formatter: Box::new(TextFormatter),
            hooks: Vec::new(),
        }
    }

    /// Create a backend that appends to a file.
    ///
    /// Creates the parent directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory cannot be created
    /// - File cannot be opened for appending
    pub fn to_file(path: &Path) -> AuditResult<Self> {
        let file = open_append(path)?;
        Ok(Self::with_writer(Box::new(file)))
    }

    /// Create a backend that discards its output. Hooks still fire.
    pub fn null() -> Self {
        Self::with_writer(Box::new(io::sink()))
    }

    /// Replace the output formatter.
    pub fn set_formatter(&mut self, formatter: Box<dyn Formatter>) {
        self.formatter = formatter;
    }

    /// Replace the output destination.
    pub fn set_writer(&mut self, writer: Writer) {
        self.writer = Mutex::new(writer);
    }

    /// Register an observer for every future entry.
    pub fn add_hook(&mut self, hook: Arc<dyn Hook>) {
        self.hooks.push(hook);
    }

    /// Number of registered hooks.
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Emit one entry.
    ///
    /// Hooks subscribed to `level` fire first, then the formatted line is
    /// written. Failures are reported via `tracing` only.
    pub fn emit(&self, level: Level, fields: Fields) {
        let entry = LogEntry::new(level, fields);

        for hook in &self.hooks {
            if !hook.levels().contains(&entry.level) {
                continue;
            }
            if let Err(e) = hook.fire(&entry) {
                warn!(error = %e, "Audit hook failed");
            }
        }

        if let Err(e) = self.write(&entry) {
            warn!(error = %e, "Failed to write audit entry");
        }
    }

    fn write(&self, entry: &LogEntry) -> AuditResult<()> {
        let line = self.formatter.format(entry)?;

        let mut writer = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        writeln!(writer, "{}", line)?;
        writer.flush()?;

        Ok(())
    }
}

/// Open a file in append mode, creating its parent directory if needed.
pub(crate) fn open_append(path: &Path) -> AuditResult<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!(path = %parent.display(), "Creating audit log directory");
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;

    debug!(path = %path.display(), "Audit log file opened");

    Ok(file)
}

impl Default for Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuditError;
    use crate::sink::formatter::JsonFormatter;
    use crate::sink::hook::CaptureHook;
    use serde_json::json;
    use std::io::Read;
    use tempfile::TempDir;

    fn create_test_fields() -> Fields {
        let mut fields = Fields::new();
        fields.insert("audit".to_string(), json!(true));
        fields.insert("env".to_string(), json!("test"));
        fields
    }

    fn read_to_string(path: &Path) -> String {
        let mut content = String::new();
        File::open(path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }

    struct ErrorOnlyHook(CaptureHook);

    impl Hook for ErrorOnlyHook {
        fn levels(&self) -> &[Level] {
            &[Level::Error]
        }

        fn fire(&self, entry: &LogEntry) -> AuditResult<()> {
            self.0.fire(entry)
        }
    }

    /// Panics on its first write, then appends to a shared buffer.
    struct PanicOnceWriter {
        buffer: Arc<Mutex<Vec<u8>>>,
        armed: bool,
    }

    impl Write for PanicOnceWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.armed {
                self.armed = false;
                panic!("writer exploded");
            }
            self.buffer.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FailingHook;

    impl Hook for FailingHook {
        fn fire(&self, _entry: &LogEntry) -> AuditResult<()> {
            Err(AuditError::Sink {
                message: "boom".to_string(),
            })
        }
    }

    #[test]
    fn test_to_file_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("subdir/audit.log");

        let _backend = Backend::to_file(&log_path).unwrap();
        assert!(log_path.parent().unwrap().exists());
        assert!(log_path.exists());
    }

    #[test]
    fn test_writes_json_lines() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("audit.log");

        let mut backend = Backend::to_file(&log_path).unwrap();
        backend.set_formatter(Box::new(JsonFormatter));

        backend.emit(Level::Info, create_test_fields());
        backend.emit(Level::Error, Fields::new());

        let content = read_to_string(&log_path);
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed1: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed1["level"], "info");
        assert_eq!(parsed1["audit"], true);
        assert_eq!(parsed1["env"], "test");

        let parsed2: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed2["level"], "error");
    }

    #[test]
    fn test_appends_to_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("audit.log");

        {
            let backend = Backend::to_file(&log_path).unwrap();
            backend.emit(Level::Info, create_test_fields());
        }

        {
            let backend = Backend::to_file(&log_path).unwrap();
            backend.emit(Level::Info, create_test_fields());
        }

        assert_eq!(read_to_string(&log_path).lines().count(), 2);
    }

    #[test]
    fn test_hooks_respect_levels() {
        let all = Arc::new(CaptureHook::new());
        let errors_only = Arc::new(ErrorOnlyHook(CaptureHook::new()));

        let mut backend = Backend::null();
        backend.add_hook(all.clone());
        backend.add_hook(errors_only.clone());
        assert_eq!(backend.hook_count(), 2);

        backend.emit(Level::Info, Fields::new());
        backend.emit(Level::Error, Fields::new());

        assert_eq!(all.len(), 2);
        assert_eq!(errors_only.0.len(), 1);
        assert_eq!(errors_only.0.last().unwrap().level, Level::Error);
    }

    #[test]
    fn test_failing_hook_does_not_block_others() {
        let capture = Arc::new(CaptureHook::new());

        let mut backend = Backend::null();
        backend.add_hook(Arc::new(FailingHook));
        backend.add_hook(capture.clone());

        backend.emit(Level::Info, Fields::new());
        assert_eq!(capture.len(), 1);
    }

    #[test]
    fn test_writes_resume_after_writer_panic() {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let backend = Backend::with_writer(Box::new(PanicOnceWriter {
            buffer: buffer.clone(),
            armed: true,
        }));

        let first = std::thread::scope(|s| {
            s.spawn(|| backend.emit(Level::Info, Fields::new())).join()
        });
        assert!(first.is_err());

        backend.emit(Level::Info, create_test_fields());

        let content = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("env"));
    }
}
