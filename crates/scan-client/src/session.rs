//! Streaming session state machine with fixed-delay auto-reconnect.
//!
//! The session runs as one task on the tokio runtime and owns the live
//! connection. The UI talks to it through a [`SessionHandle`] and receives
//! [`StreamEvent`]s on an unbounded channel, so ingest never waits on paint.
//!
//! # State Machine
//!
//! ```text
//!   Idle ──activate()──> Connecting ──open──> Streaming
//!    ▲                      │   ▲                 │
//!    │                 fail │   │ delay elapsed   │ close / transport error
//!    │                      ▼   │                 ▼
//!    └──deactivate()──── Disconnected <───────────┘
//! ```
//!
//! `deactivate()` from any state sends `{"action":"stop"}` if a connection
//! is open, closes it, and cancels the pending reconnect timer. Cancelling
//! the timer task (not just ignoring it when it fires) keeps a stopped
//! session from reviving itself.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use scan_core::protocol::{parse_control, ClientCommand, DEFAULT_MAX_LINES};
use scan_core::StreamEvent;
use tokio::sync::{mpsc, oneshot, watch};

use crate::endpoint::StreamAddress;
use crate::transport::{Connection, Connector, WireMessage, WireSink};

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not recording; no connection, no timer.
    Idle,
    /// Connection attempt in progress.
    Connecting,
    /// Connected and receiving rows.
    Streaming,
    /// Recording, but the connection dropped; a reconnect is scheduled.
    Disconnected,
}

impl SessionState {
    /// Short status label for UI display.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Connecting => "Connecting...",
            Self::Streaming => "Streaming",
            Self::Disconnected => "Reconnecting...",
        }
    }

    /// Returns true while recording is requested.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Returns true if connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Streaming)
    }
}

/// Session tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Fixed delay before reconnecting after an unrequested close.
    pub reconnect_delay: Duration,
    /// Ring capacity assumed when an announcement omits `maxLines`.
    pub default_max_lines: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(2),
            default_max_lines: DEFAULT_MAX_LINES,
        }
    }
}

#[derive(Debug)]
enum SessionCommand {
    Activate,
    Deactivate,
    SetAddress(StreamAddress),
    Shutdown,
}

/// Handle to a running session.
///
/// Dropping every handle shuts the session down.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    state: watch::Receiver<SessionState>,
}

impl SessionHandle {
    /// Start recording: connect and keep reconnecting until deactivated.
    pub fn activate(&self) {
        self.send(SessionCommand::Activate);
    }

    /// Stop recording: send stop, close, cancel any pending reconnect.
    pub fn deactivate(&self) {
        self.send(SessionCommand::Deactivate);
    }

    /// Use `address` for the next connection attempt.
    pub fn set_address(&self, address: StreamAddress) {
        self.send(SessionCommand::SetAddress(address));
    }

    /// Stop the session task.
    pub fn shutdown(&self) {
        self.send(SessionCommand::Shutdown);
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Watch channel for state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    fn send(&self, command: SessionCommand) {
        if self.commands.send(command).is_err() {
            tracing::debug!("Session task already stopped");
        }
    }
}

/// A scheduled reconnect; dropping or firing `cancel` aborts the timer task.
struct PendingReconnect {
    cancel: oneshot::Sender<()>,
    generation: u64,
}

/// How a connected (or connecting) phase ended.
enum Ended {
    /// Close, transport error or failed connect. Reconnect if still recording.
    Lost,
    /// The user stopped recording.
    Deactivated,
    /// The session is shutting down.
    Shutdown,
}

/// The session task.
pub struct StreamSession<C: Connector> {
    connector: Arc<C>,
    address: StreamAddress,
    config: SessionConfig,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    events: mpsc::UnboundedSender<StreamEvent>,
    state: watch::Sender<SessionState>,
    timer_tx: mpsc::UnboundedSender<u64>,
    timer_rx: mpsc::UnboundedReceiver<u64>,
    reconnect: Option<PendingReconnect>,
    generation: u64,
    recording: bool,
}

impl<C: Connector> StreamSession<C> {
    /// Spawn a session task on `runtime`.
    ///
    /// Returns the control handle and the event receiver the viewer drains.
    pub fn spawn(
        connector: C,
        address: StreamAddress,
        config: SessionConfig,
        runtime: &tokio::runtime::Handle,
    ) -> (SessionHandle, mpsc::UnboundedReceiver<StreamEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();

        let session = Self {
            connector: Arc::new(connector),
            address,
            config,
            commands: command_rx,
            events: event_tx,
            state: state_tx,
            timer_tx,
            timer_rx,
            reconnect: None,
            generation: 0,
            recording: false,
        };
        runtime.spawn(session.run());

        let handle = SessionHandle {
            commands: command_tx,
            state: state_rx,
        };
        (handle, event_rx)
    }

    async fn run(mut self) {
        tracing::debug!(address = %self.address, "Stream session started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Activate) => {
                        if self.recording {
                            continue;
                        }
                        self.recording = true;
                        tracing::info!(address = %self.address, "Recording started");
                        if !self.stream_until_ended().await {
                            break;
                        }
                    }
                    Some(SessionCommand::Deactivate) => self.stop_recording(),
                    Some(SessionCommand::SetAddress(address)) => self.address = address,
                    Some(SessionCommand::Shutdown) | None => break,
                },
                Some(generation) = self.timer_rx.recv() => {
                    let due = self
                        .reconnect
                        .as_ref()
                        .is_some_and(|pending| pending.generation == generation);
                    if !due || !self.recording {
                        tracing::debug!(generation, "Ignoring stale reconnect timer");
                        continue;
                    }
                    self.reconnect = None;
                    tracing::info!(address = %self.address, "Reconnecting");
                    if !self.stream_until_ended().await {
                        break;
                    }
                }
            }
        }

        self.cancel_reconnect();
        self.set_state(SessionState::Idle);
        tracing::debug!("Stream session stopped");
    }

    /// Connect and stream until the phase ends. Returns `false` on shutdown.
    async fn stream_until_ended(&mut self) -> bool {
        match self.connect_and_stream().await {
            Ended::Lost => {
                if self.recording {
                    self.set_state(SessionState::Disconnected);
                    self.schedule_reconnect();
                } else {
                    self.set_state(SessionState::Idle);
                }
                true
            }
            Ended::Deactivated => {
                self.stop_recording();
                true
            }
            Ended::Shutdown => false,
        }
    }

    async fn connect_and_stream(&mut self) -> Ended {
        self.set_state(SessionState::Connecting);

        let connection = match self.connect().await {
            Ok(Some(connection)) => connection,
            Ok(None) => {
                self.emit(StreamEvent::Connection(false));
                return Ended::Lost;
            }
            Err(ended) => return ended,
        };
        let Connection {
            mut sink,
            mut stream,
        } = connection;

        self.set_state(SessionState::Streaming);
        self.emit(StreamEvent::Connection(true));
        tracing::info!(address = %self.address, "Stream connected");

        if let Err(e) = send_command(&mut sink, ClientCommand::START).await {
            tracing::warn!(error = %e, "Failed to send start command");
            self.emit(StreamEvent::Connection(false));
            return Ended::Lost;
        }

        let ended = loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(WireMessage::Text(text))) => {
                        match parse_control(&text, self.config.default_max_lines) {
                            Some(geometry) => self.emit(StreamEvent::Geometry(geometry)),
                            None => tracing::trace!(len = text.len(), "Ignoring control frame"),
                        }
                    }
                    Some(Ok(WireMessage::Binary(row))) => self.emit(StreamEvent::Row(row)),
                    Some(Ok(WireMessage::Close)) | None => {
                        tracing::info!("Stream closed by server");
                        break Ended::Lost;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Stream transport error");
                        break Ended::Lost;
                    }
                },
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Deactivate) => {
                        close_gracefully(&mut sink).await;
                        break Ended::Deactivated;
                    }
                    Some(SessionCommand::Shutdown) | None => {
                        close_gracefully(&mut sink).await;
                        break Ended::Shutdown;
                    }
                    Some(SessionCommand::SetAddress(address)) => self.address = address,
                    Some(SessionCommand::Activate) => {}
                },
            }
        };

        self.emit(StreamEvent::Connection(false));
        ended
    }

    /// Run one connect attempt while still honoring commands.
    ///
    /// `Ok(None)` means the attempt failed; `Err` means a command ended the
    /// phase before the attempt finished.
    async fn connect(&mut self) -> Result<Option<Connection>, Ended> {
        let connector = Arc::clone(&self.connector);
        let address = self.address.clone();
        let attempt = async move { connector.connect(&address).await };
        tokio::pin!(attempt);

        loop {
            tokio::select! {
                result = &mut attempt => {
                    return Ok(match result {
                        Ok(connection) => Some(connection),
                        Err(e) => {
                            tracing::warn!(address = %self.address, error = %e, "Stream connection failed");
                            None
                        }
                    });
                }
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Deactivate) => return Err(Ended::Deactivated),
                    Some(SessionCommand::Shutdown) | None => return Err(Ended::Shutdown),
                    Some(SessionCommand::SetAddress(address)) => self.address = address,
                    Some(SessionCommand::Activate) => {}
                },
            }
        }
    }

    fn schedule_reconnect(&mut self) {
        self.cancel_reconnect();
        self.generation += 1;
        let generation = self.generation;
        let delay = self.config.reconnect_delay;
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let timer_tx = self.timer_tx.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    let _ = timer_tx.send(generation);
                }
                _ = cancel_rx => {
                    tracing::trace!(generation, "Reconnect timer cancelled");
                }
            }
        });

        tracing::info!(delay_ms = delay.as_millis() as u64, "Reconnect scheduled");
        self.reconnect = Some(PendingReconnect {
            cancel: cancel_tx,
            generation,
        });
    }

    fn cancel_reconnect(&mut self) {
        if let Some(pending) = self.reconnect.take() {
            let _ = pending.cancel.send(());
            tracing::debug!(generation = pending.generation, "Pending reconnect cancelled");
        }
    }

    fn stop_recording(&mut self) {
        if self.recording {
            tracing::info!("Recording stopped");
        }
        self.recording = false;
        self.cancel_reconnect();
        self.set_state(SessionState::Idle);
    }

    fn set_state(&self, state: SessionState) {
        self.state.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            tracing::debug!(from = ?*current, to = ?state, "Session state");
            *current = state;
            true
        });
    }

    fn emit(&self, event: StreamEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("Event receiver dropped");
        }
    }
}

async fn send_command(sink: &mut WireSink, command: ClientCommand) -> crate::Result<()> {
    let text = command.encode()?;
    sink.send(WireMessage::Text(text)).await
}

/// Send stop and close; errors here only mean the peer is already gone.
async fn close_gracefully(sink: &mut WireSink) {
    if let Err(e) = send_command(sink, ClientCommand::STOP).await {
        tracing::debug!(error = %e, "Stop command not delivered");
    }
    if let Err(e) = sink.close().await {
        tracing::debug!(error = %e, "Close failed");
    }
}
