//! Configuration types for treelint.

use crate::types::Severity;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Preset to use (e.g., "recommended", "strict", "minimal").
    #[serde(default)]
    pub preset: Option<String>,

    /// Severity threshold a check run fails at (default: "error").
    #[serde(default)]
    pub fail_on: Option<String>,

    /// Runner configuration.
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Reporter configuration.
    #[serde(default)]
    pub reporter: ReporterConfig,

    /// Per-rule configurations.
    #[serde(default)]
    pub rules: HashMap<String, RuleConfig>,
}

impl Config {
    /// Creates a default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Checks if a rule is enabled.
    #[must_use]
    pub fn is_rule_enabled(&self, rule_name: &str) -> bool {
        self.rules
            .get(rule_name)
            .map_or(true, |c| c.enabled.unwrap_or(true))
    }

    /// Gets the severity override for a rule.
    #[must_use]
    pub fn rule_severity(&self, rule_name: &str) -> Option<Severity> {
        self.rules.get(rule_name).and_then(|c| c.severity)
    }
}

/// Runner-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Root directory to analyze (default: current directory).
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Glob patterns to exclude from analysis.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            exclude: vec!["**/target/**".to_string(), "**/vendor/**".to_string()],
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

/// Reporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// Bounded buffer capacity per compilation unit.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    crate::reporter::DEFAULT_CAPACITY
}

/// Per-rule configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this rule is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for this rule.
    #[serde(default)]
    pub severity: Option<Severity>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading the config file.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in the config file.
    #[error("failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.preset.is_none());
        assert!(config.rules.is_empty());
        assert_eq!(config.reporter.capacity, 256);
        assert!(config.is_rule_enabled("anything"));
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
preset = "recommended"
fail_on = "warning"

[runner]
root = "./src"
exclude = ["**/generated/**"]

[reporter]
capacity = 64

[rules.unused-local]
enabled = true
severity = "error"

[rules.no-silent-ok]
enabled = false
"#;

        let config = Config::parse(toml).expect("parse");
        assert_eq!(config.preset.as_deref(), Some("recommended"));
        assert_eq!(config.runner.root, PathBuf::from("./src"));
        assert_eq!(config.reporter.capacity, 64);
        assert!(config.is_rule_enabled("unused-local"));
        assert!(!config.is_rule_enabled("no-silent-ok"));
        assert_eq!(config.rule_severity("unused-local"), Some(Severity::Error));
        assert_eq!(config.rule_severity("no-silent-ok"), None);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = Config::parse("preset = [").expect_err("must fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn unknown_severity_name_fails_to_parse() {
        let toml = r#"
[rules.unused-local]
severity = "info"
"#;
        assert!(Config::parse(toml).is_err());
    }
}
