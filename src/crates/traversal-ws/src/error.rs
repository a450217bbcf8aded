//! Transport errors

use std::time::Duration;
use thiserror::Error;
use tokio_tungstenite::tungstenite;
use traversal_core::TraversalError;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, WsError>;

/// Errors raised by the WebSocket client and server
///
/// Traversal callers see them as [`TraversalError::Transport`].
#[derive(Error, Debug)]
pub enum WsError {
    /// Could not open the connection
    #[error("Failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    /// WebSocket protocol or socket failure
    #[error("WebSocket error: {0}")]
    Protocol(#[from] tungstenite::Error),

    /// Socket failure outside the WebSocket layer
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A message could not be encoded or decoded
    #[error("Malformed message: {0}")]
    Message(#[from] serde_json::Error),

    /// The connection is gone
    #[error("Connection closed")]
    Closed,

    /// No response arrived in time
    #[error("No response within {0:?}")]
    Timeout(Duration),
}

impl From<WsError> for TraversalError {
    fn from(err: WsError) -> Self {
        TraversalError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_to_transport() {
        let err: TraversalError = WsError::Closed.into();
        assert!(matches!(err, TraversalError::Transport(ref m) if m == "Connection closed"));

        let err: TraversalError = WsError::Timeout(Duration::from_secs(2)).into();
        assert_eq!(err.to_string(), "Transport error: No response within 2s");
    }
}
