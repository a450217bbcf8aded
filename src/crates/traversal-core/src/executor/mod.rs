//! Traversal execution
//!
//! The executor hands a [`CompiledTraversal`] to a [`GraphChannel`] and turns
//! the raw response stream into a typed [`Execution`]. The channel is an
//! injected dependency: this crate does not pool connections, retry or
//! reconnect. Results are surfaced in the order the engine emits them.
//!
//! # Lifecycle
//!
//! ```text
//! Building ──compile()──> Compiled ──execute()──> Executing ──┬──> Completed
//!                                                              └──> Failed
//! ```
//!
//! A finished traversal's step sequence can be executed again; every call to
//! `execute` starts a fresh execution.

mod cancel;
mod execution;
mod query_log;

pub use cancel::CancelSignal;
pub use execution::{Execution, ExecutionHandle};
pub use query_log::{
    QueryLogConfig, QueryLogEntry, QueryLogFormatting, QueryLogLevel, QueryLogSink,
    QueryOutcome, TracingQueryLog,
};

use crate::error::Result;
use crate::projector::{Projector, RawResult};
use crate::shape::Shape;
use crate::traversal::CompiledTraversal;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use uuid::Uuid;

/// Ordered stream of raw results for one request
pub type RawResultStream = Pin<Box<dyn Stream<Item = Result<RawResult>> + Send>>;

/// One traversal sent to an engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalRequest {
    /// Correlates responses with this request
    pub request_id: Uuid,
    /// Steps to evaluate
    pub traversal: CompiledTraversal,
}

/// Connection to a graph engine
///
/// Implementations return an error only when the request cannot be
/// submitted; failures reported by the engine travel inside the stream.
/// Dropping the returned stream must release the request.
#[async_trait]
pub trait GraphChannel: Send + Sync {
    /// Submit a traversal and stream its results
    async fn send(&self, request: TraversalRequest) -> Result<RawResultStream>;
}

#[async_trait]
impl<C: GraphChannel + ?Sized> GraphChannel for Arc<C> {
    async fn send(&self, request: TraversalRequest) -> Result<RawResultStream> {
        (**self).send(request).await
    }
}

/// Where a traversal is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalState {
    /// Steps are still being appended
    Building,
    /// Validated and frozen
    Compiled,
    /// Submitted; results may still arrive
    Executing,
    /// Every result was received
    Completed,
    /// Ended with an error or was cancelled
    Failed,
}

impl TraversalState {
    /// Whether no further transition can happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for TraversalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Building => f.write_str("building"),
            Self::Compiled => f.write_str("compiled"),
            Self::Executing => f.write_str("executing"),
            Self::Completed => f.write_str("completed"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Sends compiled traversals over a channel and tracks their executions
#[derive(Clone)]
pub struct Executor {
    channel: Arc<dyn GraphChannel>,
    query_log: Option<Arc<dyn QueryLogSink>>,
}

impl Executor {
    /// Executor over `channel` with the query log disabled
    pub fn new(channel: Arc<dyn GraphChannel>) -> Self {
        Self {
            channel,
            query_log: None,
        }
    }

    /// Copy every finished execution to `sink`
    pub fn with_query_log(mut self, sink: Arc<dyn QueryLogSink>) -> Self {
        self.query_log = Some(sink);
        self
    }

    /// Whether a query log sink is attached
    pub fn query_log_enabled(&self) -> bool {
        self.query_log.is_some()
    }

    /// Start executing `traversal`, decoding results as `S`
    pub fn execute<S: Shape>(&self, traversal: CompiledTraversal, projector: Projector) -> Execution<S> {
        execution::start(
            self.channel.clone(),
            self.query_log.clone(),
            traversal,
            projector,
        )
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("query_log", &self.query_log.is_some())
            .finish()
    }
}
