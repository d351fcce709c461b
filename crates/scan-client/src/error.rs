//! Client error types.

use thiserror::Error;

use crate::endpoint::AddressError;

/// Result type alias using ClientError.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while talking to the stream endpoint.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The endpoint address was rejected.
    #[error("Invalid address: {0}")]
    Address(#[from] AddressError),

    /// WebSocket handshake or framing error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Connection failed with a descriptive message.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The peer closed the connection.
    #[error("Connection closed")]
    Closed,

    /// A control message could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
