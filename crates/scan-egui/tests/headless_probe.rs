//! Headless probe against an in-process simulator.

use std::time::Duration;

use scan_client::{AddressSource, SessionConfig, StreamAddress};
use scan_core::{StreamGeometry, ZoomLimits};
use scan_egui::run_until;
use scan_sim::{spawn_local, SimState, SourceSpec};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn probe_records_rows_from_simulator() {
    let spec = SourceSpec::Synthetic {
        width: 64,
        height: 100,
    };
    let state = SimState::new(spec, 32, 400.0).unwrap();
    let (addr, _server) = spawn_local(state).await.unwrap();
    let address =
        StreamAddress::parse(&format!("ws://{addr}/ws/stream"), AddressSource::UserInput).unwrap();

    let summary = run_until(
        address,
        SessionConfig::default(),
        ZoomLimits::default(),
        tokio::time::sleep(Duration::from_millis(600)),
    )
    .await;

    assert_eq!(summary.geometry, Some(StreamGeometry::new(64, 32)));
    assert!(summary.total_lines > 0, "no rows recorded");
    assert_eq!(summary.dropped_rows, 0);
    // The final disconnect reports zero.
    assert_eq!(summary.last_frequency, Some(0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn probe_without_server_stops_cleanly() {
    // Bind then drop to get a port nobody listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let address =
        StreamAddress::parse(&format!("ws://{addr}/ws/stream"), AddressSource::UserInput).unwrap();
    let summary = tokio::time::timeout(
        Duration::from_secs(5),
        run_until(
            address,
            SessionConfig::default(),
            ZoomLimits::default(),
            tokio::time::sleep(Duration::from_millis(300)),
        ),
    )
    .await
    .expect("probe did not stop");

    assert_eq!(summary.total_lines, 0);
    assert_eq!(summary.geometry, None);
}
