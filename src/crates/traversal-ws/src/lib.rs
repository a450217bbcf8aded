//! # traversal-ws - WebSocket transport
//!
//! [`WebSocketChannel`] is a [`GraphChannel`](traversal_core::GraphChannel)
//! that multiplexes concurrent traversals over one connection.
//! [`WebSocketServer`] exposes any other channel, such as the in-memory
//! engine, to such clients.
//!
//! ```rust,ignore
//! let channel = WebSocketChannel::connect(WebSocketConfig::at_localhost()).await?;
//! let env = GraphEnvironment::builder(model)
//!     .with_channel(channel)
//!     .build()?;
//! ```
//!
//! Responses are streamed: the server sends partial frames while a
//! traversal produces results and one final frame. Losing the connection
//! fails every request in flight with a transport error; nothing is retried.

pub mod client;
pub mod config;
pub mod error;
pub mod messages;
pub mod server;

pub use client::WebSocketChannel;
pub use config::{WebSocketConfig, DEFAULT_PORT};
pub use error::{Result, WsError};
pub use messages::{status, RequestMessage, ResponseMessage, ResponseStatus};
pub use server::{WebSocketServer, BATCH_SIZE};
