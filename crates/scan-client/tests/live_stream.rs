//! End-to-end: simulator server, WebSocket transport, session and viewer.

use std::time::{Duration, Instant};

use scan_client::{
    AddressSource, SessionConfig, SessionState, StreamAddress, StreamSession, WebSocketConnector,
};
use scan_core::{HostDevice, NullObserver, StreamGeometry, ViewerState, ZoomLimits};
use scan_sim::{spawn_local, SimState, SourceSpec};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rows_flow_from_simulator_into_ring() {
    let spec = SourceSpec::Synthetic {
        width: 16,
        height: 32,
    };
    let state = SimState::new(spec, 4, 500.0).unwrap();
    let (addr, _server) = spawn_local(state).await.unwrap();

    let address = StreamAddress::parse(&format!("ws://{addr}/ws/stream"), AddressSource::UserInput)
        .unwrap();
    let (handle, mut events) = StreamSession::spawn(
        WebSocketConnector,
        address,
        SessionConfig::default(),
        &tokio::runtime::Handle::current(),
    );
    let mut viewer = ViewerState::new(HostDevice::new(), NullObserver, ZoomLimits::default());

    handle.activate();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while viewer.total_lines() < 6 {
        let event = tokio::time::timeout_at(deadline, events.recv())
            .await
            .expect("rows did not arrive in time")
            .expect("session ended early");
        viewer.apply(event.into(), Instant::now());
    }

    assert!(viewer.is_connected());
    assert_eq!(viewer.geometry(), Some(StreamGeometry::new(16, 4)));
    assert_eq!(viewer.dropped_rows(), 0);
    let rows = viewer.store().rows_oldest_first();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|row| row.len() == 16));
    assert!(viewer.take_redraw());

    handle.deactivate();
    let mut state = handle.subscribe();
    tokio::time::timeout(Duration::from_secs(5), state.wait_for(|s| *s == SessionState::Idle))
        .await
        .expect("session did not go idle")
        .unwrap();
}
