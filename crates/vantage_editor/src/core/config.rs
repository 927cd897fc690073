//! Editor configuration.
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables: `VANTAGE_HISTORY_DEPTH`, `VANTAGE_CHANGE_EPSILON`, `VANTAGE_LOG`
//! 2. Config file passed to `EditorConfig::load`
//! 3. Built-in defaults
//!
//! # Example Config File
//!
//! ```toml
//! log_filter = "debug"
//!
//! [history]
//! max_depth = 250   # omit for unbounded
//!
//! [changes]
//! epsilon = 0.0001
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Undo history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum undo depth; oldest entries are dropped beyond it
    pub max_depth: Option<usize>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_depth: Some(100) }
    }
}

/// Change detector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeConfig {
    /// Absolute per-element matrix tolerance
    pub epsilon: f32,
}

impl Default for ChangeConfig {
    fn default() -> Self {
        Self { epsilon: 1e-4 }
    }
}

/// Complete editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub history: HistoryConfig,
    pub changes: ChangeConfig,
    /// `env_logger` filter used by the binary
    pub log_filter: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            changes: ChangeConfig::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl EditorConfig {
    /// Load from an optional file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let config = Self::load_from_file(path)?;
                log::info!("Loaded editor config from {}", path.display());
                config
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `VANTAGE_*` overrides read through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(depth) = lookup("VANTAGE_HISTORY_DEPTH") {
            let depth = depth.trim();
            self.history.max_depth = if depth.is_empty() || depth == "unbounded" {
                None
            } else {
                Some(depth.parse().map_err(|_| {
                    ConfigError::Invalid(format!("VANTAGE_HISTORY_DEPTH: not a number: {}", depth))
                })?)
            };
        }

        if let Some(epsilon) = lookup("VANTAGE_CHANGE_EPSILON") {
            self.changes.epsilon = epsilon.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("VANTAGE_CHANGE_EPSILON: not a number: {}", epsilon))
            })?;
        }

        if let Some(filter) = lookup("VANTAGE_LOG") {
            if !filter.is_empty() {
                self.log_filter = filter;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history.max_depth == Some(0) {
            return Err(ConfigError::Invalid("history.max_depth must be at least 1".to_string()));
        }
        if !self.changes.epsilon.is_finite() || self.changes.epsilon < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "changes.epsilon must be a finite non-negative number, got {}",
                self.changes.epsilon
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.history.max_depth, Some(100));
        assert_eq!(config.changes.epsilon, 1e-4);
        assert_eq!(config.log_filter, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EditorConfig::from_toml("[changes]\nepsilon = 0.01\n").unwrap();
        assert_eq!(config.changes.epsilon, 0.01);
        assert_eq!(config.history.max_depth, Some(100));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        assert!(matches!(
            EditorConfig::from_toml("history = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("VANTAGE_HISTORY_DEPTH", "unbounded"),
            ("VANTAGE_CHANGE_EPSILON", "0.5"),
            ("VANTAGE_LOG", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = EditorConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.history.max_depth, None);
        assert_eq!(config.changes.epsilon, 0.5);
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_validate_rejects_zero_depth_and_negative_epsilon() {
        let mut config = EditorConfig::default();
        config.history.max_depth = Some(0);
        assert!(config.validate().is_err());

        let mut config = EditorConfig::default();
        config.changes.epsilon = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
