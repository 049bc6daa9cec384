//! Initialization options for the coordinator.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::error::AuditResult;
use crate::sink::{open_append, Backend, Fields, Formatter, Hook, Writer};

/// One configuration step applied by [`Coordinator::initialize`].
///
/// [`Coordinator::initialize`]: super::Coordinator::initialize
pub enum InitOption {
    /// Replace the backend output formatting.
    Format(Box<dyn Formatter>),
    /// Register backend-side observers.
    Hooks(Vec<Arc<dyn Hook>>),
    /// Merge fields into every future entry. Cumulative across options.
    DefaultFields(Fields),
    /// Replace the backend output destination.
    Output(Writer),
    /// Enable or disable redaction of segment data (disabled by default).
    Sanitize(bool),
}

impl InitOption {
    /// Use the given formatter.
    pub fn format<F: Formatter + 'static>(formatter: F) -> Self {
        InitOption::Format(Box::new(formatter))
    }

    /// Register a single hook.
    pub fn hook(hook: Arc<dyn Hook>) -> Self {
        InitOption::Hooks(vec![hook])
    }

    /// Merge the given key/value pairs into the default fields.
    pub fn default_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        InitOption::DefaultFields(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Append entries to a file, creating it (and its directory) if needed.
    pub fn output_file(path: &Path) -> AuditResult<Self> {
        let file = open_append(path)?;
        Ok(InitOption::Output(Box::new(file)))
    }

    pub(crate) fn apply(self, backend: &mut Backend, defaults: &mut Fields, sanitize: &mut bool) {
        match self {
            InitOption::Format(formatter) => backend.set_formatter(formatter),
            InitOption::Hooks(hooks) => {
                for hook in hooks {
                    backend.add_hook(hook);
                }
            }
            InitOption::DefaultFields(fields) => defaults.extend(fields),
            InitOption::Output(writer) => backend.set_writer(writer),
            InitOption::Sanitize(enabled) => *sanitize = enabled,
        }
    }
}

impl fmt::Debug for InitOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitOption::Format(_) => f.write_str("Format(..)"),
            InitOption::Hooks(hooks) => write!(f, "Hooks({})", hooks.len()),
            InitOption::DefaultFields(fields) => f.debug_tuple("DefaultFields").field(fields).finish(),
            InitOption::Output(_) => f.write_str("Output(..)"),
            InitOption::Sanitize(enabled) => f.debug_tuple("Sanitize").field(enabled).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{CaptureHook, JsonFormatter};
    use tempfile::TempDir;

    #[test]
    fn test_default_fields_cumulative() {
        let mut backend = Backend::null();
        let mut defaults = Fields::new();
        let mut sanitize = true;

        InitOption::default_fields([("env", "prod"), ("region", "eu")])
            .apply(&mut backend, &mut defaults, &mut sanitize);
        InitOption::default_fields([("env", "staging")])
            .apply(&mut backend, &mut defaults, &mut sanitize);

        assert_eq!(defaults["env"], "staging");
        assert_eq!(defaults["region"], "eu");
    }

    #[test]
    fn test_hooks_and_sanitize() {
        let mut backend = Backend::null();
        let mut defaults = Fields::new();
        let mut sanitize = true;

        let hooks: Vec<Arc<dyn Hook>> =
            vec![Arc::new(CaptureHook::new()), Arc::new(CaptureHook::new())];
        InitOption::Hooks(hooks)
            .apply(&mut backend, &mut defaults, &mut sanitize);
        InitOption::format(JsonFormatter).apply(&mut backend, &mut defaults, &mut sanitize);
        InitOption::Sanitize(false).apply(&mut backend, &mut defaults, &mut sanitize);

        assert_eq!(backend.hook_count(), 2);
        assert!(!sanitize);
    }

    #[test]
    fn test_output_file_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/audit.log");

        let option = InitOption::output_file(&path).unwrap();
        assert!(matches!(option, InitOption::Output(_)));
        assert!(path.exists());
    }
}
