//! # traversal-memory - In-Memory Graph Engine
//!
//! A [`GraphChannel`](traversal_core::GraphChannel) that evaluates compiled
//! traversals against a graph held in process memory. Useful for tests,
//! demos and as the backing store of the WebSocket server.
//!
//! ```rust,ignore
//! use traversal_core::prelude::*;
//! use traversal_memory::InMemoryGraph;
//!
//! let env = GraphEnvironment::builder(model)
//!     .with_channel(InMemoryGraph::new())
//!     .build()?;
//! ```
//!
//! Identifiers are positive integers allocated in creation order. Results
//! of one traversal are produced in full before the first one is streamed.
//! Evaluation failures arrive in the result stream as server errors with
//! code [`EVALUATION_FAILED`] or [`INVALID_REQUEST`].

mod error;
mod eval;
mod graph;
mod store;

pub use error::{EngineError, Result, EVALUATION_FAILED, INVALID_REQUEST};
pub use graph::InMemoryGraph;
