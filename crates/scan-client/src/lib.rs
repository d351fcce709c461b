//! Streaming client for the line-scan viewer.
//!
//! This crate owns the transport side: resolving the stream endpoint,
//! speaking the WebSocket protocol, and running the reconnecting session
//! task that feeds [`scan_core::StreamEvent`]s to the viewer. It is
//! UI-agnostic and is used by both the egui viewer and the headless probe.

pub mod endpoint;
pub mod error;
pub mod session;
pub mod transport;

pub use endpoint::{
    normalize_url, resolve_address, AddressError, AddressSource, StreamAddress,
    DEFAULT_STREAM_PATH, DEFAULT_STREAM_PORT, DEFAULT_STREAM_URL, STORAGE_KEY_STREAM_ADDR,
};
pub use error::{ClientError, Result};
pub use session::{SessionConfig, SessionHandle, SessionState, StreamSession};
pub use transport::{Connection, Connector, WebSocketConnector, WireMessage};
