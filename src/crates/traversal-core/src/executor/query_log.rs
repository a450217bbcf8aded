//! Query log
//!
//! When enabled, every finished execution is reported to a [`QueryLogSink`]
//! with its compiled traversal, start time, elapsed time and outcome. The
//! default sink, [`TracingQueryLog`], turns entries into `tracing` events at
//! the configured level. The log is disabled unless a level other than
//! [`QueryLogLevel::None`] is configured.

use crate::traversal::CompiledTraversal;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// Level query log entries are emitted at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryLogLevel {
    /// Query log disabled
    #[default]
    None,
    /// `tracing` TRACE events
    Trace,
    /// `tracing` DEBUG events
    Debug,
    /// `tracing` INFO events
    Info,
    /// `tracing` WARN events
    Warn,
}

impl fmt::Display for QueryLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
        };
        f.write_str(s)
    }
}

impl FromStr for QueryLogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            other => Err(format!("unknown query log level '{}'", other)),
        }
    }
}

/// How the traversal is rendered in a query log event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryLogFormatting {
    /// Single-line JSON
    #[default]
    Compact,
    /// Pretty-printed JSON
    Indented,
}

impl FromStr for QueryLogFormatting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" | "none" => Ok(Self::Compact),
            "indented" | "pretty" => Ok(Self::Indented),
            other => Err(format!("unknown query log formatting '{}'", other)),
        }
    }
}

/// Query log settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryLogConfig {
    /// Emission level; `None` disables the log
    pub level: QueryLogLevel,
    /// Traversal rendering
    pub formatting: QueryLogFormatting,
}

impl QueryLogConfig {
    /// Set the emission level
    pub fn with_level(mut self, level: QueryLogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the traversal rendering
    pub fn with_formatting(mut self, formatting: QueryLogFormatting) -> Self {
        self.formatting = formatting;
        self
    }

    /// Whether entries are recorded at all
    pub fn is_enabled(&self) -> bool {
        self.level != QueryLogLevel::None
    }
}

/// How an execution ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum QueryOutcome {
    /// Every result was received
    Completed {
        /// Number of decoded results surfaced to the caller
        results: usize,
    },
    /// The execution failed
    Failed {
        /// Rendered error
        error: String,
    },
    /// The caller cancelled the execution
    Cancelled,
}

/// One finished execution
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryLogEntry {
    pub request_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub traversal: CompiledTraversal,
    pub elapsed: Duration,
    pub outcome: QueryOutcome,
}

/// Receives query log entries
#[async_trait]
pub trait QueryLogSink: Send + Sync {
    /// Record one finished execution
    async fn record(&self, entry: QueryLogEntry);
}

/// Emits query log entries as `tracing` events
#[derive(Debug, Clone, Copy)]
pub struct TracingQueryLog {
    config: QueryLogConfig,
}

impl TracingQueryLog {
    /// Sink emitting at `config.level`
    pub fn new(config: QueryLogConfig) -> Self {
        Self { config }
    }

    fn render(&self, traversal: &CompiledTraversal) -> String {
        let rendered = match self.config.formatting {
            QueryLogFormatting::Compact => traversal.to_json(),
            QueryLogFormatting::Indented => traversal.to_json_pretty(),
        };
        rendered.unwrap_or_else(|e| format!("<unrenderable traversal: {}>", e))
    }
}

#[async_trait]
impl QueryLogSink for TracingQueryLog {
    async fn record(&self, entry: QueryLogEntry) {
        if !self.config.is_enabled() {
            return;
        }
        let traversal = self.render(&entry.traversal);
        let request_id = entry.request_id;
        let elapsed_ms = entry.elapsed.as_secs_f64() * 1000.0;
        let outcome = &entry.outcome;

        match self.config.level {
            QueryLogLevel::None => {}
            QueryLogLevel::Trace => {
                trace!(%request_id, elapsed_ms, ?outcome, %traversal, "Executed traversal")
            }
            QueryLogLevel::Debug => {
                debug!(%request_id, elapsed_ms, ?outcome, %traversal, "Executed traversal")
            }
            QueryLogLevel::Info => {
                info!(%request_id, elapsed_ms, ?outcome, %traversal, "Executed traversal")
            }
            QueryLogLevel::Warn => {
                warn!(%request_id, elapsed_ms, ?outcome, %traversal, "Executed traversal")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!("Debug".parse::<QueryLogLevel>(), Ok(QueryLogLevel::Debug));
        assert_eq!("off".parse::<QueryLogLevel>(), Ok(QueryLogLevel::None));
        assert!("loud".parse::<QueryLogLevel>().is_err());
        assert_eq!(QueryLogLevel::default(), QueryLogLevel::None);
    }

    #[test]
    fn test_config_builder() {
        let config = QueryLogConfig::default()
            .with_level(QueryLogLevel::Info)
            .with_formatting(QueryLogFormatting::Indented);
        assert!(config.is_enabled());
        assert!(!QueryLogConfig::default().is_enabled());
    }

    #[test]
    fn test_outcome_wire_form() {
        let json = serde_json::to_value(QueryOutcome::Completed { results: 2 }).unwrap();
        assert_eq!(json, serde_json::json!({"status": "completed", "results": 2}));
    }
}
