use super::cancel::CancelSignal;
use super::query_log::{QueryLogEntry, QueryLogSink, QueryOutcome};
use super::{GraphChannel, TraversalRequest, TraversalState};
use crate::error::{Result, TraversalError};
use crate::projector::Projector;
use crate::shape::Shape;
use crate::traversal::CompiledTraversal;
use chrono::Utc;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

const EXECUTING: u8 = 0;
const COMPLETED: u8 = 1;
const FAILED: u8 = 2;

/// Cloneable handle to observe or cancel an execution
#[derive(Debug, Clone)]
pub struct ExecutionHandle {
    state: Arc<AtomicU8>,
    cancel: Arc<CancelSignal>,
}

impl ExecutionHandle {
    fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(EXECUTING)),
            cancel: Arc::new(CancelSignal::new()),
        }
    }

    /// Current state
    pub fn state(&self) -> TraversalState {
        match self.state.load(Ordering::SeqCst) {
            EXECUTING => TraversalState::Executing,
            COMPLETED => TraversalState::Completed,
            _ => TraversalState::Failed,
        }
    }

    /// Cancel the execution
    ///
    /// The response stream is dropped and results not yet consumed are
    /// discarded. The execution ends `Failed`, as it does when the
    /// [`Execution`] is dropped before its stream ends. No effect once the
    /// execution has finished.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    // Only the first terminal transition sticks.
    fn finish(&self, state: u8) {
        let _ = self
            .state
            .compare_exchange(EXECUTING, state, Ordering::SeqCst, Ordering::SeqCst);
    }
}

/// A running traversal, streaming decoded results of shape `S`
///
/// The stream ends after the first error.
pub struct Execution<S: Shape> {
    request_id: Uuid,
    handle: ExecutionHandle,
    results: Pin<Box<dyn Stream<Item = Result<S::Output>> + Send>>,
}

impl<S: Shape> Execution<S> {
    /// Identifier of the underlying request
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Handle that outlives this stream
    pub fn handle(&self) -> ExecutionHandle {
        self.handle.clone()
    }

    /// Current state
    pub fn state(&self) -> TraversalState {
        self.handle.state()
    }

    /// Cancel the execution
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    /// Drain the stream into a list
    ///
    /// Any error, cancellation included, discards the results received so far.
    pub async fn to_list(mut self) -> Result<Vec<S::Output>> {
        let mut out = Vec::new();
        while let Some(item) = self.results.next().await {
            out.push(item?);
        }
        Ok(out)
    }
}

impl<S: Shape> Stream for Execution<S> {
    type Item = Result<S::Output>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.results.as_mut().poll_next(cx)
    }
}

impl<S: Shape> Drop for Execution<S> {
    // Abandoned before the end of the stream
    fn drop(&mut self) {
        self.handle.finish(FAILED);
    }
}

pub(super) fn start<S: Shape>(
    channel: Arc<dyn GraphChannel>,
    query_log: Option<Arc<dyn QueryLogSink>>,
    traversal: CompiledTraversal,
    projector: Projector,
) -> Execution<S> {
    let request_id = Uuid::new_v4();
    let handle = ExecutionHandle::new();
    let task = handle.clone();

    let results = async_stream::stream! {
        let started_at = Utc::now();
        let clock = Instant::now();
        let request = TraversalRequest {
            request_id,
            traversal: traversal.clone(),
        };
        debug!(%request_id, steps = traversal.len(), "Executing traversal");

        let mut emitted = 0usize;
        let mut failure = None;

        let opened = tokio::select! {
            biased;
            _ = task.cancel.cancelled() => Err(TraversalError::Cancelled),
            opened = channel.send(request) => opened,
        };

        match opened {
            Err(err) => failure = Some(err),
            Ok(mut raw) => loop {
                let next = tokio::select! {
                    biased;
                    _ = task.cancel.cancelled() => Some(Err(TraversalError::Cancelled)),
                    next = raw.next() => next,
                };
                match next {
                    None => break,
                    Some(Ok(item)) => match projector.decode::<S>(item) {
                        Ok(Some(value)) => {
                            emitted += 1;
                            yield Ok(value);
                        }
                        Ok(None) => {}
                        Err(err) => {
                            failure = Some(err);
                            break;
                        }
                    },
                    Some(Err(err)) => {
                        failure = Some(err);
                        break;
                    }
                }
            },
        }

        // Consumers may drop the stream at the error, so finish first
        let outcome = match &failure {
            None => {
                task.finish(COMPLETED);
                QueryOutcome::Completed { results: emitted }
            }
            Some(err) => {
                task.finish(FAILED);
                outcome_of(err)
            }
        };

        let elapsed = clock.elapsed();
        match &outcome {
            QueryOutcome::Completed { results } => {
                debug!(%request_id, results, elapsed_ms = elapsed.as_millis() as u64, "Traversal completed")
            }
            QueryOutcome::Cancelled => debug!(%request_id, "Traversal cancelled"),
            QueryOutcome::Failed { error } => warn!(%request_id, %error, "Traversal failed"),
        }

        if let Some(sink) = query_log {
            sink.record(QueryLogEntry {
                request_id,
                started_at,
                traversal,
                elapsed,
                outcome,
            })
            .await;
        }

        if let Some(err) = failure {
            yield Err(err);
        }
    };

    Execution {
        request_id,
        handle,
        results: Box::pin(results),
    }
}

fn outcome_of(err: &TraversalError) -> QueryOutcome {
    match err {
        TraversalError::Cancelled => QueryOutcome::Cancelled,
        other => QueryOutcome::Failed {
            error: other.to_string(),
        },
    }
}
