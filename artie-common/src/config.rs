//! TOML configuration loading and validation
//!
//! Config file location is resolved in priority order:
//! 1. Command-line argument
//! 2. `ARTIE_CONFIG` environment variable
//! 3. `<user config dir>/artie/config.toml`, then `/etc/artie/config.toml` on Linux
//!
//! A missing file is not fatal: callers fall back to [`TomlConfig::default`]
//! and validation reports what still has to be filled in.
//!
//! ```toml
//! [drive]
//! name = "Top Drive"
//! serial_number = "4815162342"
//!
//! [logging]
//! level = "debug"
//!
//! [session]
//! error_policy = "skip"
//! event_capacity = 256
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::{Error, Result};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "ARTIE_CONFIG";

/// Root of the TOML configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub drive: DriveConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

/// Identity of the drive this instance serves
///
/// The name is user assigned ("Top Drive") so a UI can tell drives apart
/// without showing serial numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub serial_number: String,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// What a session does with a line it cannot decode or apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop at the first bad line
    #[default]
    Abort,
    /// Log the line and keep going
    Skip,
}

/// Rip session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub error_policy: ErrorPolicy,

    /// Per-subscriber buffer of the progress event bus
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::default(),
            event_capacity: default_event_capacity(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_event_capacity() -> usize {
    256
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from `path`
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading config from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Config loaded: drive '{}' ({})", config.drive.name, config.drive.serial_number);
        Ok(config)
    }

    /// Problems that make this configuration unusable, one entry per issue
    pub fn validation_errors(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.drive.name.trim().is_empty() {
            problems.push("drive.name is required and cannot be empty".to_string());
        }

        if self.drive.serial_number.trim().is_empty() {
            problems.push("drive.serial_number is required and cannot be empty".to_string());
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            problems.push(format!(
                "logging.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.level
            ));
        }

        if self.session.event_capacity == 0 {
            problems.push("session.event_capacity must be a positive integer".to_string());
        }

        problems
    }

    /// Validate, logging every problem found
    pub fn validate(&self) -> Result<()> {
        let problems = self.validation_errors();
        if problems.is_empty() {
            return Ok(());
        }

        for problem in &problems {
            error!("{}", problem);
        }
        Err(Error::Config(problems.join("; ")))
    }
}

/// Locate the config file
///
/// Returns `None` when no candidate exists. An explicitly named file (CLI or
/// environment) is returned as-is so loading it reports a clear I/O error.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_candidates()
        .into_iter()
        .find(|candidate| candidate.exists())
}

fn default_config_candidates() -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = dirs::config_dir()
        .map(|d| d.join("artie").join("config.toml"))
        .into_iter()
        .collect();

    if cfg!(target_os = "linux") {
        candidates.push(PathBuf::from("/etc/artie/config.toml"));
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_none());
        assert_eq!(config.session.error_policy, ErrorPolicy::Abort);
        assert_eq!(config.session.event_capacity, 256);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
    }

    #[test]
    fn test_default_config_reports_missing_identity() {
        let problems = TomlConfig::default().validation_errors();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("drive.name"));
        assert!(problems[1].contains("drive.serial_number"));
    }
}
