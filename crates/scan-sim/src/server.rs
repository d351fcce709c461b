//! WebSocket endpoint serving simulated scan lines.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use scan_core::protocol::{Action, ClientCommand, StatusAnnouncement, StreamGeometry};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Result, SimError};
use crate::source::{SourceSpec, MAX_WIDTH};

/// Shared server settings, cloned into every connection.
#[derive(Debug, Clone)]
pub struct SimState {
    source: SourceSpec,
    max_lines: u32,
    period: Duration,
}

impl SimState {
    /// Serve `source`, announcing `max_lines`, at `rate_hz` rows per second.
    pub fn new(source: SourceSpec, max_lines: u32, rate_hz: f64) -> Result<Self> {
        if !(rate_hz.is_finite() && rate_hz > 0.0) {
            return Err(SimError::InvalidConfig(format!("rate {rate_hz} must be positive")));
        }
        if max_lines == 0 || source.width() == 0 {
            return Err(SimError::InvalidConfig(
                "width and max_lines must be at least 1".into(),
            ));
        }
        if source.width() > MAX_WIDTH {
            return Err(SimError::InvalidConfig(format!(
                "width {} exceeds {MAX_WIDTH}",
                source.width()
            )));
        }
        Ok(Self {
            source,
            max_lines,
            period: Duration::from_secs_f64(1.0 / rate_hz),
        })
    }

    /// Geometry announced to clients.
    #[must_use]
    pub fn geometry(&self) -> StreamGeometry {
        StreamGeometry::new(self.source.width(), self.max_lines)
    }
}

/// Routes: `/ws/stream` and `/health`.
pub fn router(state: SimState) -> Router {
    Router::new()
        .route("/ws/stream", get(handle_websocket))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Serve on an already bound listener until the server fails.
pub async fn serve(listener: TcpListener, state: SimState) -> Result<()> {
    info!(addr = ?listener.local_addr().ok(), geometry = ?state.geometry(), "Simulator listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Bind an ephemeral localhost port and serve in the background.
pub async fn spawn_local(state: SimState) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
    let addr = listener.local_addr()?;
    let task = tokio::spawn(async move {
        if let Err(e) = serve(listener, state).await {
            warn!(error = %e, "Simulator stopped");
        }
    });
    Ok((addr, task))
}

async fn health_check() -> &'static str {
    "OK"
}

async fn handle_websocket(ws: WebSocketUpgrade, State(state): State<SimState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SimState) {
    let (mut sender, mut receiver) = socket.split();
    let mut source = state.source.open();
    let mut ticker = tokio::time::interval(state.period);
    let mut streaming = false;
    let mut rows_sent: u64 = 0;

    info!("Client connected");

    loop {
        tokio::select! {
            msg = receiver.next() => {
                let msg = match msg {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                    None => break,
                };
                match msg {
                    Message::Text(text) => match ClientCommand::parse(&text).map(|c| c.action) {
                        Some(Action::Start) => {
                            let announcement = StatusAnnouncement::recording(state.geometry());
                            let json = match announcement.encode() {
                                Ok(json) => json,
                                Err(e) => {
                                    warn!(error = %e, "Failed to encode announcement");
                                    break;
                                }
                            };
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                            ticker.reset();
                            streaming = true;
                            info!(geometry = ?state.geometry(), "Streaming started");
                        }
                        Some(Action::Stop) => {
                            streaming = false;
                            info!(rows_sent, "Streaming stopped");
                        }
                        None => debug!(text = %text.as_str(), "Ignoring unknown command"),
                    },
                    Message::Close(_) => break,
                    Message::Ping(data) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    _ => {}
                }
            }
            _ = ticker.tick(), if streaming => {
                let row = Bytes::copy_from_slice(source.next_row());
                if let Err(e) = sender.send(Message::Binary(row)).await {
                    debug!(error = %e, "Row send failed");
                    break;
                }
                rows_sent += 1;
            }
        }
    }

    info!(rows_sent, "Client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_rejects_bad_rate() {
        assert!(SimState::new(SourceSpec::default(), 100, 0.0).is_err());
        assert!(SimState::new(SourceSpec::default(), 100, f64::NAN).is_err());
        assert!(SimState::new(SourceSpec::default(), 0, 10.0).is_err());
        let wide = SourceSpec::Synthetic {
            width: MAX_WIDTH + 1,
            height: 4,
        };
        assert!(SimState::new(wide, 100, 10.0).is_err());
    }

    #[test]
    fn test_state_geometry_follows_source() {
        let spec = SourceSpec::Synthetic {
            width: 300,
            height: 10,
        };
        let state = SimState::new(spec, 64, 100.0).unwrap();
        assert_eq!(state.geometry(), StreamGeometry::new(300, 64));
        assert_eq!(state.period, Duration::from_millis(10));
    }
}
