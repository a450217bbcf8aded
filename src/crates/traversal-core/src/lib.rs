//! # traversal-core - Typed Graph Traversals
//!
//! Compose graph traversals against compile-time-known vertex and edge types,
//! compile them into a backend-agnostic step sequence, execute them
//! asynchronously against a graph engine and decode the results back into
//! domain values.
//!
//! ## Overview
//!
//! - **Schema model** ([`schema`]) - maps domain types to labels and ordered
//!   property descriptors
//! - **Steps** ([`step`], [`sequence`]) - immutable, structurally shared
//!   step sequences with a JSON wire form
//! - **Builder** ([`traversal`]) - the fluent API; shapes tracked as type
//!   parameters gate which steps are valid next
//! - **Correlation binding** - `bind` threads a folded or injected value
//!   into a later predicate without materialising it client-side
//! - **Executor** ([`executor`]) - sends compiled traversals over an injected
//!   [`GraphChannel`] and streams typed results, with cancellation and an
//!   optional query log
//! - **Projector** ([`projector`]) - decodes raw results, filtering by label
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use traversal_core::prelude::*;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Person {
//!     #[serde(default, skip_serializing_if = "Option::is_none")]
//!     id: Option<ElementId>,
//!     name: String,
//!     zip_code: String,
//! }
//!
//! impl Element for Person {
//!     type Kind = VertexKind;
//!     const LABEL: &'static str = "Person";
//!     const PROPERTIES: &'static [&'static str] = &["name", "zip_code"];
//! }
//!
//! let mut model = GraphModel::builder();
//! model.register_vertex::<Person>()?;
//!
//! let env = GraphEnvironment::builder(model.build()?)
//!     .with_channel(channel)
//!     .build()?;
//!
//! let nearby: Vec<Person> = env
//!     .g()
//!     .v::<Person>()?
//!     .where_(Predicate::has("zip_code", Test::within(["10001", "10122"])))?
//!     .to_list()
//!     .await?;
//! ```
//!
//! ## Errors
//!
//! Construction errors are returned by the builder call that caused them and
//! nothing is sent. Transport and server errors surface from the execution
//! stream and are never retried. See [`error`].

pub mod config;
pub mod environment;
pub mod error;
pub mod executor;
pub mod predicate;
pub mod projector;
pub mod schema;
pub mod sequence;
pub mod shape;
pub mod step;
pub mod traversal;

pub use config::{ConfigSource, EnvironmentConfig};
pub use environment::{GraphEnvironment, GraphEnvironmentBuilder};
pub use error::{Result, SchemaError, TraversalError};
pub use executor::{
    CancelSignal, Execution, ExecutionHandle, Executor, GraphChannel, QueryLogConfig,
    QueryLogEntry, QueryLogFormatting, QueryLogLevel, QueryLogSink, QueryOutcome,
    RawResultStream, TracingQueryLog, TraversalRequest, TraversalState,
};
pub use predicate::{BoundRef, Operand, Predicate, Test};
pub use projector::{ProjectionMode, Projector, RawElement, RawResult};
pub use schema::{
    Edge, EdgeKind, Element, ElementDescriptor, ElementId, ElementKind, GraphModel,
    GraphModelBuilder, LabelDescriptor, Property, PropertyDescriptor, Vertex, VertexKind,
};
pub use sequence::StepSequence;
pub use shape::{AnyEdge, AnyVertex, Folded, Shape, Start, Val};
pub use step::{Direction, Projection, Step, WalkTarget};
pub use traversal::{Bound, CompiledTraversal, EdgeBuilder, GraphSource, Traversal};

/// Everything needed to declare a model and write traversals
pub mod prelude {
    pub use crate::config::{ConfigSource, EnvironmentConfig};
    pub use crate::environment::GraphEnvironment;
    pub use crate::error::{Result, TraversalError};
    pub use crate::executor::{GraphChannel, QueryLogLevel};
    pub use crate::predicate::{Predicate, Test};
    pub use crate::projector::ProjectionMode;
    pub use crate::schema::{EdgeKind, Element, ElementId, GraphModel, VertexKind};
    pub use crate::shape::{AnyEdge, AnyVertex, Folded, Val};
    pub use crate::traversal::{Bound, Traversal};
    pub use futures::StreamExt;
    pub use serde::{Deserialize, Serialize};
}
