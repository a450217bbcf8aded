//! Environment configuration
//!
//! Settings can be assembled in code with `with_*` methods, read from
//! prefixed environment variables, or loaded from YAML:
//!
//! ```yaml
//! query_log:
//!   level: debug
//!   formatting: indented
//! projection: strict
//! ```
//!
//! ```rust,ignore
//! use traversal_core::config::{ConfigSource, EnvironmentConfig};
//!
//! let config = EnvironmentConfig::from_env("TRAVERSAL_")?;
//! let config = EnvironmentConfig::from_yaml_file("traversal.yaml")?;
//! ```

mod env;

pub use env::{build_env_key, get_env, get_env_parse};

use crate::error::{Result, TraversalError};
use crate::executor::{QueryLogConfig, QueryLogFormatting, QueryLogLevel};
use crate::projector::ProjectionMode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Common loading paths for configuration structs
pub trait ConfigSource: Default + Clone + DeserializeOwned {
    /// Check field values; the default accepts everything
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Load from `{prefix}{FIELD}` variables, defaulting unset ones
    fn from_env(prefix: &str) -> Result<Self>;

    /// Parse and validate a YAML document
    fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| TraversalError::Configuration(format!("Invalid YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            TraversalError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&yaml)
    }
}

/// Settings of a graph environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Query log; disabled by default
    pub query_log: QueryLogConfig,
    /// Handling of label mismatches while decoding
    pub projection: ProjectionMode,
}

impl EnvironmentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the query log level
    pub fn with_query_log_level(mut self, level: QueryLogLevel) -> Self {
        self.query_log.level = level;
        self
    }

    /// Set the query log rendering
    pub fn with_query_log_formatting(mut self, formatting: QueryLogFormatting) -> Self {
        self.query_log.formatting = formatting;
        self
    }

    /// Set the projection mode
    pub fn with_projection(mut self, projection: ProjectionMode) -> Self {
        self.projection = projection;
        self
    }
}

impl ConfigSource for EnvironmentConfig {
    /// Reads `{prefix}QUERY_LOG_LEVEL`, `{prefix}QUERY_LOG_FORMAT` and
    /// `{prefix}PROJECTION`
    fn from_env(prefix: &str) -> Result<Self> {
        let mut config = Self::default();
        if let Some(level) = get_env_parse(&build_env_key(prefix, "query_log_level"))? {
            config.query_log.level = level;
        }
        if let Some(formatting) = get_env_parse(&build_env_key(prefix, "query_log_format"))? {
            config.query_log.formatting = formatting;
        }
        if let Some(projection) = get_env_parse(&build_env_key(prefix, "projection"))? {
            config.projection = projection;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EnvironmentConfig::default();
        assert_eq!(config.query_log.level, QueryLogLevel::None);
        assert_eq!(config.projection, ProjectionMode::Exclude);
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("CFGTEST_QUERY_LOG_LEVEL", "info");
        std::env::set_var("CFGTEST_PROJECTION", "strict");
        let config = EnvironmentConfig::from_env("CFGTEST_").unwrap();
        assert_eq!(config.query_log.level, QueryLogLevel::Info);
        assert_eq!(config.query_log.formatting, QueryLogFormatting::Compact);
        assert_eq!(config.projection, ProjectionMode::Strict);
        std::env::remove_var("CFGTEST_QUERY_LOG_LEVEL");
        std::env::remove_var("CFGTEST_PROJECTION");
    }

    #[test]
    fn test_from_env_rejects_bad_value() {
        std::env::set_var("CFGBAD_PROJECTION", "sometimes");
        assert!(matches!(
            EnvironmentConfig::from_env("CFGBAD_"),
            Err(TraversalError::Configuration(_))
        ));
        std::env::remove_var("CFGBAD_PROJECTION");
    }

    #[test]
    fn test_from_yaml() {
        let yaml = "query_log:\n  level: debug\n  formatting: indented\n";
        let config = EnvironmentConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.query_log.level, QueryLogLevel::Debug);
        assert_eq!(config.query_log.formatting, QueryLogFormatting::Indented);
        assert_eq!(config.projection, ProjectionMode::Exclude);

        assert!(EnvironmentConfig::from_yaml_str("projection: [").is_err());
        assert!(EnvironmentConfig::from_yaml_file("/nonexistent/traversal.yaml").is_err());
    }
}
