//! Graph environment: model, channel and settings bundled together
//!
//! ```rust,ignore
//! let env = GraphEnvironment::builder(model)
//!     .with_channel(InMemoryGraph::new())
//!     .with_query_log_level(QueryLogLevel::Debug)
//!     .build()?;
//!
//! let g = env.g();
//! ```

use crate::config::EnvironmentConfig;
use crate::error::{Result, TraversalError};
use crate::executor::{
    Execution, Executor, GraphChannel, QueryLogLevel, QueryLogSink, TracingQueryLog,
};
use crate::projector::{ProjectionMode, Projector};
use crate::schema::GraphModel;
use crate::shape::Shape;
use crate::traversal::{CompiledTraversal, GraphSource};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

struct Inner {
    model: Arc<GraphModel>,
    executor: Executor,
    projector: Projector,
    config: EnvironmentConfig,
}

/// Shared handle to a configured graph
///
/// Cheap to clone. Every traversal carries one.
#[derive(Clone)]
pub struct GraphEnvironment {
    inner: Arc<Inner>,
}

impl GraphEnvironment {
    /// Start configuring an environment over `model`
    pub fn builder(model: GraphModel) -> GraphEnvironmentBuilder {
        GraphEnvironmentBuilder::new(model)
    }

    /// Traversal source
    pub fn g(&self) -> GraphSource {
        GraphSource::source(self.clone())
    }

    /// The graph model
    pub fn model(&self) -> &GraphModel {
        &self.inner.model
    }

    /// Active settings
    pub fn config(&self) -> &EnvironmentConfig {
        &self.inner.config
    }

    /// The executor traversals are sent through
    pub fn executor(&self) -> &Executor {
        &self.inner.executor
    }

    pub(crate) fn execute<S: Shape>(&self, traversal: CompiledTraversal) -> Execution<S> {
        self.inner
            .executor
            .execute(traversal, self.inner.projector.clone())
    }
}

impl fmt::Debug for GraphEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphEnvironment")
            .field("types", &self.inner.model.len())
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Builder for [`GraphEnvironment`]
pub struct GraphEnvironmentBuilder {
    model: GraphModel,
    channel: Option<Arc<dyn GraphChannel>>,
    query_log_sink: Option<Arc<dyn QueryLogSink>>,
    config: EnvironmentConfig,
}

impl GraphEnvironmentBuilder {
    fn new(model: GraphModel) -> Self {
        Self {
            model,
            channel: None,
            query_log_sink: None,
            config: EnvironmentConfig::default(),
        }
    }

    /// Channel to the engine; required
    pub fn with_channel(mut self, channel: impl GraphChannel + 'static) -> Self {
        self.channel = Some(Arc::new(channel));
        self
    }

    /// Channel to the engine, already shared
    pub fn with_shared_channel(mut self, channel: Arc<dyn GraphChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Replace every setting
    pub fn with_config(mut self, config: EnvironmentConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable the query log at `level`
    pub fn with_query_log_level(mut self, level: QueryLogLevel) -> Self {
        self.config.query_log.level = level;
        self
    }

    /// Send query log entries to `sink` instead of `tracing`
    ///
    /// Entries are only produced when a query log level is set.
    pub fn with_query_log_sink(mut self, sink: Arc<dyn QueryLogSink>) -> Self {
        self.query_log_sink = Some(sink);
        self
    }

    /// Handling of label mismatches while decoding
    pub fn with_projection(mut self, projection: ProjectionMode) -> Self {
        self.config.projection = projection;
        self
    }

    /// Finish the environment
    pub fn build(self) -> Result<GraphEnvironment> {
        let channel = self.channel.ok_or_else(|| {
            TraversalError::Configuration("a graph channel is required".to_string())
        })?;

        let mut executor = Executor::new(channel);
        if self.config.query_log.is_enabled() {
            let sink = self
                .query_log_sink
                .unwrap_or_else(|| {
                    Arc::new(TracingQueryLog::new(self.config.query_log)) as Arc<dyn QueryLogSink>
                });
            executor = executor.with_query_log(sink);
        }

        let model = Arc::new(self.model);
        debug!(
            types = model.len(),
            query_log = %self.config.query_log.level,
            projection = %self.config.projection,
            "Graph environment ready"
        );

        Ok(GraphEnvironment {
            inner: Arc::new(Inner {
                projector: Projector::new(model.clone(), self.config.projection),
                model,
                executor,
                config: self.config,
            }),
        })
    }
}
