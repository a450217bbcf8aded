use crate::error::EngineError;
use crate::eval::{mutates, Access, Evaluator};
use crate::store::GraphData;
use async_trait::async_trait;
use futures::stream;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};
use traversal_core::{
    CompiledTraversal, GraphChannel, RawResult, RawResultStream, Result, TraversalRequest,
};

/// Graph held in process memory
///
/// Cloning shares the same graph. Read-only traversals run concurrently;
/// traversals that add, update or drop elements take the graph exclusively
/// for their whole evaluation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraph {
    data: Arc<RwLock<GraphData>>,
}

impl InMemoryGraph {
    /// An empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.data.read().vertex_count()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.data.read().edge_count()
    }

    /// Remove every element
    pub fn clear(&self) {
        self.data.write().clear();
    }

    /// Evaluate a traversal to completion
    pub fn evaluate(
        &self,
        traversal: &CompiledTraversal,
    ) -> std::result::Result<Vec<RawResult>, EngineError> {
        let steps = traversal.steps();
        if mutates(steps) {
            let mut data = self.data.write();
            let mut evaluator = Evaluator::new(Access::Write(&mut data));
            evaluator.run(steps)
        } else {
            let data = self.data.read();
            let mut evaluator = Evaluator::new(Access::Read(&data));
            evaluator.run(steps)
        }
    }
}

#[async_trait]
impl GraphChannel for InMemoryGraph {
    async fn send(&self, request: TraversalRequest) -> Result<RawResultStream> {
        let request_id = request.request_id;
        let results = match self.evaluate(&request.traversal) {
            Ok(results) => {
                debug!(%request_id, results = results.len(), "Evaluated traversal");
                results.into_iter().map(Ok).collect::<Vec<_>>()
            }
            Err(err) => {
                warn!(%request_id, code = err.code(), error = %err, "Traversal evaluation failed");
                vec![Err(err.into())]
            }
        };
        Ok(Box::pin(stream::iter(results)))
    }
}
