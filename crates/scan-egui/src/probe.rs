//! Headless probe: stream into a host-side ring and log what happens.
//!
//! Runs the same session and viewer core as the window, with
//! [`HostDevice`] standing in for the GPU. Useful on machines without a
//! display or adapter, and for checking a stream endpoint from a terminal.

use std::future::Future;
use std::time::Instant;

use scan_client::{SessionConfig, StreamAddress, StreamSession, WebSocketConnector};
use scan_core::{HostDevice, StreamGeometry, ViewerObserver, ViewerState, ZoomLimits};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Observer that turns viewer callbacks into log events.
#[derive(Debug, Default)]
pub struct LogObserver {
    last_frequency: Option<u32>,
}

impl ViewerObserver for LogObserver {
    fn on_status_change(&mut self, status: &str) {
        info!(status, "GPU status");
    }

    fn on_connection_change(&mut self, connected: bool) {
        if connected {
            info!("Stream connected");
        } else {
            warn!("Stream disconnected");
        }
    }

    fn on_frequency_change(&mut self, lines_per_sec: Option<u32>) {
        self.last_frequency = lines_per_sec;
        if let Some(rate) = lines_per_sec {
            info!(lines_per_sec = rate, "Throughput");
        }
    }
}

/// What the probe saw before it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSummary {
    /// Lines written since the last (re)configuration.
    pub total_lines: u64,
    /// Rows rejected for the wrong length.
    pub dropped_rows: u64,
    /// Geometry in effect at shutdown.
    pub geometry: Option<StreamGeometry>,
    /// Last reported rate.
    pub last_frequency: Option<u32>,
}

/// Record from `address` until `shutdown` resolves.
pub async fn run_until<F>(
    address: StreamAddress,
    session_config: SessionConfig,
    limits: ZoomLimits,
    shutdown: F,
) -> ProbeSummary
where
    F: Future<Output = ()>,
{
    info!(url = %address, source = %address.source(), "Probe starting");

    let (handle, mut events) = StreamSession::spawn(
        WebSocketConnector,
        address,
        session_config,
        &tokio::runtime::Handle::current(),
    );
    let mut viewer = ViewerState::new(HostDevice::new(), LogObserver::default(), limits);

    handle.activate();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => viewer.apply(event.into(), Instant::now()),
                None => break,
            },
            () = &mut shutdown => break,
        }
    }

    handle.shutdown();
    drain_remaining(&mut events, &mut viewer).await;

    let summary = ProbeSummary {
        total_lines: viewer.total_lines(),
        dropped_rows: viewer.dropped_rows(),
        geometry: viewer.geometry(),
        last_frequency: viewer.observer().last_frequency,
    };
    viewer.teardown();
    info!(?summary, "Probe finished");
    summary
}

/// Apply what the session emits while closing (the final disconnect).
async fn drain_remaining(
    events: &mut mpsc::UnboundedReceiver<scan_core::StreamEvent>,
    viewer: &mut ViewerState<HostDevice, LogObserver>,
) {
    while let Some(event) = events.recv().await {
        viewer.apply(event.into(), Instant::now());
    }
}
