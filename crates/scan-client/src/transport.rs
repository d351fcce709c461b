//! Transport seam between the session and the network.
//!
//! The session only sees [`WireMessage`]s flowing through a boxed sink and
//! stream. [`WebSocketConnector`] provides them over `tokio-tungstenite`;
//! tests provide them over in-memory channels.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{future, Sink, SinkExt, Stream, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::endpoint::StreamAddress;
use crate::error::{ClientError, Result};

/// Frame kinds the session cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireMessage {
    /// Control frame (JSON text).
    Text(String),
    /// Pixel-row frame.
    Binary(Bytes),
    /// Close handshake from the peer.
    Close,
}

/// Outgoing half of a connection.
pub type WireSink = Pin<Box<dyn Sink<WireMessage, Error = ClientError> + Send>>;

/// Incoming half of a connection.
pub type WireStream = Pin<Box<dyn Stream<Item = Result<WireMessage>> + Send>>;

/// An open, bidirectional connection.
pub struct Connection {
    /// Frames to the server.
    pub sink: WireSink,
    /// Frames from the server.
    pub stream: WireStream,
}

impl Connection {
    /// Bundle an already-split sink and stream.
    pub fn new(sink: WireSink, stream: WireStream) -> Self {
        Self { sink, stream }
    }
}

/// Opens connections to a stream endpoint.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open a connection to `address`.
    async fn connect(&self, address: &StreamAddress) -> Result<Connection>;
}

/// [`Connector`] over WebSocket.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, address: &StreamAddress) -> Result<Connection> {
        tracing::debug!(url = %address, "Opening WebSocket");
        let (ws_stream, _response) = connect_async(address.as_str()).await?;
        let (write, read) = ws_stream.split();

        let sink = write.with(|msg: WireMessage| future::ready(Ok::<_, ClientError>(to_ws(msg))));
        let stream = read.filter_map(|item| future::ready(from_ws(item)));

        Ok(Connection::new(Box::pin(sink), Box::pin(stream)))
    }
}

fn to_ws(msg: WireMessage) -> Message {
    match msg {
        WireMessage::Text(text) => Message::Text(text.into()),
        WireMessage::Binary(data) => Message::Binary(data),
        WireMessage::Close => Message::Close(None),
    }
}

fn from_ws(
    item: std::result::Result<Message, tokio_tungstenite::tungstenite::Error>,
) -> Option<Result<WireMessage>> {
    match item {
        Ok(Message::Text(text)) => Some(Ok(WireMessage::Text(text.as_str().to_owned()))),
        Ok(Message::Binary(data)) => Some(Ok(WireMessage::Binary(data))),
        Ok(Message::Close(_)) => Some(Ok(WireMessage::Close)),
        // Ping/pong are answered by tungstenite itself.
        Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => None,
        Err(e) => Some(Err(e.into())),
    }
}
