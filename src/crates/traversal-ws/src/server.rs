//! WebSocket server in front of any [`GraphChannel`]
//!
//! Each connection may carry several requests at once; every request runs in
//! its own task and its results go back in batches of [`BATCH_SIZE`].

use crate::error::Result;
use crate::messages::{status, RequestMessage, ResponseMessage, TRAVERSAL_OP};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use traversal_core::{GraphChannel, TraversalError, TraversalRequest};
use uuid::Uuid;

/// Results per response frame
pub const BATCH_SIZE: usize = 64;

/// Serves traversals from a graph engine
pub struct WebSocketServer {
    listener: TcpListener,
    graph: Arc<dyn GraphChannel>,
}

impl WebSocketServer {
    /// Listen on `addr`; port 0 picks a free port
    pub async fn bind(addr: impl ToSocketAddrs, graph: Arc<dyn GraphChannel>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, graph })
    }

    /// Address actually bound
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the task is dropped
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` completes
    ///
    /// Open connections keep running; only accepting stops.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        info!(addr = %self.local_addr()?, "Graph server listening");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Graph server stopped accepting connections");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((socket, peer)) => {
                        debug!(%peer, "Connection accepted");
                        let graph = self.graph.clone();
                        tokio::spawn(async move {
                            if let Err(err) = serve_connection(socket, graph).await {
                                warn!(%peer, error = %err, "Connection failed");
                            }
                        });
                    }
                    Err(err) => warn!(error = %err, "Accept failed"),
                },
            }
        }
    }
}

async fn serve_connection(socket: TcpStream, graph: Arc<dyn GraphChannel>) -> Result<()> {
    let (mut sink, mut frames) = accept_async(socket).await?.split();

    let (replies, mut outgoing) = mpsc::channel::<ResponseMessage>(BATCH_SIZE);
    let writer = tokio::spawn(async move {
        while let Some(reply) = outgoing.recv().await {
            let text = match serde_json::to_string(&reply) {
                Ok(text) => text,
                Err(err) => {
                    warn!(error = %err, "Failed to encode response");
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    // Dropping the set on disconnect cancels requests still running
    let mut requests = JoinSet::new();
    loop {
        tokio::select! {
            frame = frames.next() => match frame {
                Some(Ok(Message::Text(text))) => match parse_request(&text) {
                    Ok(request) => {
                        requests.spawn(evaluate(graph.clone(), request, replies.clone()));
                    }
                    Err(rejection) => {
                        let _ = replies.send(rejection).await;
                    }
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(err)) => return Err(err.into()),
            },
            Some(_) = requests.join_next(), if !requests.is_empty() => {}
        }
    }

    drop(requests);
    drop(replies);
    let _ = writer.await;
    Ok(())
}

/// Decode a request frame, or the rejection to send back
fn parse_request(text: &str) -> std::result::Result<TraversalRequest, ResponseMessage> {
    let malformed = |id: Option<Uuid>, reason: String| {
        ResponseMessage::error(id, status::MALFORMED_REQUEST, reason)
    };

    let value: Value = serde_json::from_str(text).map_err(|e| malformed(None, e.to_string()))?;
    let request_id = value
        .get("requestId")
        .and_then(Value::as_str)
        .and_then(|id| Uuid::parse_str(id).ok());

    let message: RequestMessage =
        serde_json::from_value(value).map_err(|e| malformed(request_id, e.to_string()))?;
    if message.op != TRAVERSAL_OP {
        return Err(malformed(
            Some(message.request_id),
            format!("Unsupported op '{}'", message.op),
        ));
    }
    Ok(message.into())
}

async fn evaluate(
    graph: Arc<dyn GraphChannel>,
    request: TraversalRequest,
    replies: mpsc::Sender<ResponseMessage>,
) {
    let request_id = request.request_id;
    debug!(%request_id, steps = request.traversal.len(), "Evaluating traversal");

    let mut results = match graph.send(request).await {
        Ok(results) => results,
        Err(err) => {
            let _ = replies.send(failure(request_id, err)).await;
            return;
        }
    };

    let mut batch = Vec::with_capacity(BATCH_SIZE);
    while let Some(item) = results.next().await {
        match item {
            Ok(result) => {
                batch.push(result);
                if batch.len() == BATCH_SIZE {
                    let full = std::mem::replace(&mut batch, Vec::with_capacity(BATCH_SIZE));
                    if replies
                        .send(ResponseMessage::partial(request_id, full))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
            }
            Err(err) => {
                if !batch.is_empty() {
                    let _ = replies
                        .send(ResponseMessage::partial(request_id, batch))
                        .await;
                }
                let _ = replies.send(failure(request_id, err)).await;
                return;
            }
        }
    }
    let _ = replies.send(ResponseMessage::success(request_id, batch)).await;
}

fn failure(request_id: Uuid, err: TraversalError) -> ResponseMessage {
    match err {
        TraversalError::Server { code, message } => {
            ResponseMessage::error(Some(request_id), code, message)
        }
        other => ResponseMessage::error(Some(request_id), status::SERVER_ERROR, other.to_string()),
    }
}
