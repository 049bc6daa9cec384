//! Configuration settings for the coordinator.

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AuditError, AuditResult};
use crate::sink::{Fields, JsonFormatter, TextFormatter};
use crate::transaction::InitOption;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Fields merged into every entry (environment, app version, ...).
    #[serde(default)]
    pub default_fields: Fields,
}

/// Backend output configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Output format ("text" or "json").
    #[serde(default = "default_format")]
    pub format: String,
    /// "stderr", "stdout", "null" or a file path.
    #[serde(default = "default_output")]
    pub output: String,
    /// Whether segment data is redacted before emission.
    #[serde(default = "default_sanitize")]
    pub sanitize: bool,
}

/// Where formatted entries go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stderr,
    Stdout,
    Null,
    File(PathBuf),
}

// Default value functions
fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_sanitize() -> bool {
    false
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            output: default_output(),
            sanitize: default_sanitize(),
        }
    }
}

impl LoggingConfig {
    /// Parse the `output` setting.
    pub fn output(&self) -> Output {
        match self.output.to_lowercase().as_str() {
            "stderr" => Output::Stderr,
            "stdout" => Output::Stdout,
            "null" => Output::Null,
            _ => Output::File(PathBuf::from(&self.output)),
        }
    }
}

impl Settings {
    /// Load settings from a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> AuditResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| AuditError::Config {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        Self::from_toml_str(&content).map_err(|e| AuditError::Config {
            message: format!("Invalid config file '{}': {}", path.display(), e),
        })
    }

    /// Parse settings from TOML text.
    pub fn from_toml_str(content: &str) -> AuditResult<Self> {
        let settings: Settings = toml::from_str(content).map_err(|e| AuditError::Config {
            message: format!("Failed to parse config: {}", e),
        })?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate the settings.
    fn validate(&self) -> AuditResult<()> {
        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(AuditError::Config {
                message: format!(
                    "Invalid log format '{}'. Valid formats: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        if self.logging.output.trim().is_empty() {
            return Err(AuditError::Config {
                message: "Log output must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Translate into coordinator options.
    ///
    /// Opens the output file when one is configured.
    pub fn to_options(&self) -> AuditResult<Vec<InitOption>> {
        let format = match self.logging.format.to_lowercase().as_str() {
            "json" => InitOption::format(JsonFormatter),
            _ => InitOption::format(TextFormatter),
        };

        let output = match self.logging.output() {
            Output::Stderr => InitOption::Output(Box::new(io::stderr())),
            Output::Stdout => InitOption::Output(Box::new(io::stdout())),
            Output::Null => InitOption::Output(Box::new(io::sink())),
            Output::File(path) => InitOption::output_file(&path)?,
        };

        Ok(vec![
            format,
            output,
            InitOption::Sanitize(self.logging.sanitize),
            InitOption::DefaultFields(self.default_fields.clone()),
        ])
    }
}
