//! Client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use traversal_core::config::{build_env_key, get_env, get_env_parse, ConfigSource};
use traversal_core::{Result, TraversalError};

/// Port graph servers listen on by default
pub const DEFAULT_PORT: u16 = 8182;

/// WebSocket client settings
///
/// ```yaml
/// url: ws://graph.internal:8182/gremlin
/// request_timeout: 30
/// buffer_size: 64
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// Server URL, `ws://` or `wss://`
    pub url: String,

    /// Longest wait for the next response message, in seconds
    #[serde(with = "seconds")]
    pub request_timeout: Duration,

    /// Request frames queued for the writer before senders wait
    pub buffer_size: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self::at_localhost()
    }
}

impl WebSocketConfig {
    /// Server at `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request_timeout: Duration::from_secs(30),
            buffer_size: 64,
        }
    }

    /// Server on this machine at the default port
    pub fn at_localhost() -> Self {
        Self::new(format!("ws://localhost:{}/gremlin", DEFAULT_PORT))
    }

    /// Set the response timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the outbound queue size
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }
}

impl ConfigSource for WebSocketConfig {
    fn validate(&self) -> Result<()> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(TraversalError::Configuration(format!(
                "url must start with ws:// or wss://, got '{}'",
                self.url
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(TraversalError::Configuration(
                "request_timeout must be positive".to_string(),
            ));
        }
        if self.buffer_size == 0 {
            return Err(TraversalError::Configuration(
                "buffer_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Reads `{prefix}URL`, `{prefix}REQUEST_TIMEOUT` (seconds) and
    /// `{prefix}BUFFER_SIZE`
    fn from_env(prefix: &str) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = get_env(&build_env_key(prefix, "url"))? {
            config.url = url;
        }
        if let Some(secs) = get_env_parse::<u64>(&build_env_key(prefix, "request_timeout"))? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(size) = get_env_parse(&build_env_key(prefix, "buffer_size"))? {
            config.buffer_size = size;
        }
        config.validate()?;
        Ok(config)
    }
}

mod seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_localhost_default() {
        let config = WebSocketConfig::default();
        assert_eq!(config.url, "ws://localhost:8182/gremlin");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("WSCFG_URL", "ws://graph:9000");
        std::env::set_var("WSCFG_REQUEST_TIMEOUT", "5");
        let config = WebSocketConfig::from_env("WSCFG_").unwrap();
        assert_eq!(config.url, "ws://graph:9000");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.buffer_size, 64);
        std::env::remove_var("WSCFG_URL");
        std::env::remove_var("WSCFG_REQUEST_TIMEOUT");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(WebSocketConfig::new("http://graph").validate().is_err());
        assert!(WebSocketConfig::default().with_buffer_size(0).validate().is_err());
        assert!(WebSocketConfig::default()
            .with_request_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_from_yaml() {
        let config =
            WebSocketConfig::from_yaml_str("url: wss://graph.example:443\nrequest_timeout: 10\n")
                .unwrap();
        assert_eq!(config.url, "wss://graph.example:443");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(WebSocketConfig::from_yaml_str("url: tcp://nope\n").is_err());
    }
}
