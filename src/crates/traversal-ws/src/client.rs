//! Multiplexing WebSocket client
//!
//! One connection carries any number of concurrent traversals. A writer task
//! owns the sink and a reader task owns the stream; the reader routes each
//! response frame to the request it answers through the pending table.

use crate::config::WebSocketConfig;
use crate::error::{Result, WsError};
use crate::messages::{RequestMessage, ResponseMessage};
use async_trait::async_trait;
use dashmap::DashMap;
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};
use traversal_core::config::ConfigSource;
use traversal_core::{
    GraphChannel, RawResult, RawResultStream, TraversalError, TraversalRequest,
};
use uuid::Uuid;

// The reader never waits on a request; unread results queue per request
type Pending = Arc<DashMap<Uuid, mpsc::UnboundedSender<traversal_core::Result<RawResult>>>>;

/// [`GraphChannel`] over one WebSocket connection
pub struct WebSocketChannel {
    config: WebSocketConfig,
    outbound: mpsc::Sender<Message>,
    pending: Pending,
    closed: Arc<AtomicBool>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl std::fmt::Debug for WebSocketChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketChannel")
            .field("url", &self.config.url)
            .field("in_flight", &self.pending.len())
            .finish()
    }
}

impl WebSocketChannel {
    /// Open a connection to `config.url`
    pub async fn connect(config: WebSocketConfig) -> Result<Self> {
        config.validate().map_err(|e| WsError::Connect {
            url: config.url.clone(),
            reason: e.to_string(),
        })?;

        info!(url = %config.url, "Connecting to graph server");
        let (socket, _) = connect_async(config.url.as_str())
            .await
            .map_err(|e| WsError::Connect {
                url: config.url.clone(),
                reason: e.to_string(),
            })?;
        let (sink, stream) = socket.split();

        let (outbound, queued) = mpsc::channel(config.buffer_size);
        let pending: Pending = Arc::new(DashMap::new());
        let closed = Arc::new(AtomicBool::new(false));

        let writer = tokio::spawn(write_loop(sink, ReceiverStream::new(queued)));
        let reader = tokio::spawn(read_loop(stream, pending.clone(), closed.clone()));

        debug!(url = %config.url, "Connected");
        Ok(Self {
            config,
            outbound,
            pending,
            closed,
            reader,
            writer,
        })
    }

    /// Connection settings
    pub fn config(&self) -> &WebSocketConfig {
        &self.config
    }

    /// Requests still waiting for their final frame
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Whether the connection is gone
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Ask the server to close the connection
    ///
    /// Requests still in flight fail with a transport error once it is gone.
    pub async fn close(&self) -> Result<()> {
        self.outbound
            .send(Message::Close(None))
            .await
            .map_err(|_| WsError::Closed)
    }
}

impl Drop for WebSocketChannel {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
        self.closed.store(true, Ordering::SeqCst);
        for entry in self.pending.iter() {
            let _ = entry.value().send(Err(WsError::Closed.into()));
        }
        self.pending.clear();
    }
}

#[async_trait]
impl GraphChannel for WebSocketChannel {
    async fn send(&self, request: TraversalRequest) -> traversal_core::Result<RawResultStream> {
        let request_id = request.request_id;
        let frame = serde_json::to_string(&RequestMessage::from(request)).map_err(WsError::from)?;

        let (results, mut incoming) = mpsc::unbounded_channel();
        self.pending.insert(request_id, results);
        let registration = Registration {
            pending: self.pending.clone(),
            request_id,
        };
        if self.is_closed() {
            return Err(WsError::Closed.into());
        }
        self.outbound
            .send(Message::Text(frame))
            .await
            .map_err(|_| WsError::Closed)?;
        debug!(%request_id, "Traversal sent");

        let timeout = self.config.request_timeout;
        let stream = async_stream::stream! {
            let _registration = registration;
            loop {
                match tokio::time::timeout(timeout, incoming.recv()).await {
                    Ok(Some(item)) => {
                        let failed = item.is_err();
                        yield item;
                        if failed {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(_) => {
                        warn!(%request_id, ?timeout, "Graph server stopped responding");
                        yield Err(TraversalError::from(WsError::Timeout(timeout)));
                        break;
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }
}

/// Removes a request from the pending table when its stream goes away
struct Registration {
    pending: Pending,
    request_id: Uuid,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if self.pending.remove(&self.request_id).is_some() {
            debug!(request_id = %self.request_id, "Request released before completion");
        }
    }
}

async fn write_loop<S>(mut sink: S, mut queued: ReceiverStream<Message>)
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    while let Some(message) = queued.next().await {
        let closing = matches!(message, Message::Close(_));
        if let Err(err) = sink.send(message).await {
            warn!(error = %err, "Failed to write to graph server");
            return;
        }
        if closing {
            break;
        }
    }
    let _ = sink.close().await;
}

async fn read_loop<S>(mut stream: S, pending: Pending, closed: Arc<AtomicBool>)
where
    S: Stream<Item = std::result::Result<Message, tungstenite::Error>> + Unpin,
{
    let reason = loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                if let Err(err) = route(&text, &pending) {
                    warn!(error = %err, "Dropping unreadable response frame");
                }
            }
            Some(Ok(Message::Close(frame))) => {
                break frame
                    .map(|f| f.reason.to_string())
                    .unwrap_or_else(|| "closed by server".to_string());
            }
            Some(Ok(_)) => continue,
            Some(Err(err)) => break err.to_string(),
            None => break "connection ended".to_string(),
        }
    };

    closed.store(true, Ordering::SeqCst);
    info!(%reason, in_flight = pending.len(), "Graph server connection lost");

    let ids: Vec<Uuid> = pending.iter().map(|entry| *entry.key()).collect();
    for id in ids {
        if let Some((_, results)) = pending.remove(&id) {
            let _ = results.send(Err(WsError::Closed.into()));
        }
    }
}

fn route(text: &str, pending: &Pending) -> Result<()> {
    let response: ResponseMessage = serde_json::from_str(text)?;
    let Some(request_id) = response.request_id else {
        warn!(
            code = response.status.code,
            message = %response.status.message,
            "Server rejected an unidentified request"
        );
        return Ok(());
    };

    // Terminal frames release the request; the sender drops after delivery
    let results = if response.is_terminal() {
        pending.remove(&request_id).map(|(_, results)| results)
    } else {
        pending.get(&request_id).map(|entry| entry.value().clone())
    };
    let Some(results) = results else {
        debug!(%request_id, "Response for a released request");
        return Ok(());
    };

    if response.is_error() {
        let ResponseMessage { status, .. } = response;
        debug!(%request_id, code = status.code, "Traversal failed on the server");
        let _ = results.send(Err(TraversalError::server(status.code, status.message)));
        return Ok(());
    }

    for item in response.result {
        if results.send(Ok(item)).is_err() {
            pending.remove(&request_id);
            break;
        }
    }
    Ok(())
}
