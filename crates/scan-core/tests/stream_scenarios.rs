//! End-to-end ingest scenarios through the viewer state owner.

use std::time::Instant;

use bytes::Bytes;
use scan_core::protocol::parse_control;
use scan_core::{
    HostDevice, NullObserver, StreamEvent, StreamGeometry, ViewerCommand, ViewerState, ZoomLimits,
    DEFAULT_MAX_LINES,
};

fn viewer() -> ViewerState<HostDevice, NullObserver> {
    ViewerState::new(HostDevice::new(), NullObserver, ZoomLimits::default())
}

fn control(text: &str) -> ViewerCommand {
    let geometry = parse_control(text, DEFAULT_MAX_LINES).expect("valid announcement");
    StreamEvent::Geometry(geometry).into()
}

fn row(value: u8, width: usize) -> ViewerCommand {
    StreamEvent::Row(Bytes::from(vec![value; width])).into()
}

#[test]
fn full_ring_then_one_more_row() {
    let mut v = viewer();
    let now = Instant::now();
    v.apply(control(r#"{"status":"recording","width":512,"maxLines":256}"#), now);
    assert_eq!(v.geometry(), Some(StreamGeometry::new(512, 256)));

    for _ in 0..256 {
        v.apply(row(0xFF, 512), now);
    }
    let head_before = v.store().head_index();
    assert_eq!(head_before, 0);

    v.apply(row(0x00, 512), now);

    assert_eq!(v.total_lines(), 257);
    assert_eq!(v.store().head_index(), 1);

    let surface = v.store().surface().expect("configured");
    assert!(surface.row(head_before).iter().all(|&p| p == 0x00));
    for i in 1..256 {
        assert!(surface.row(i).iter().all(|&p| p == 0xFF), "row {i} overwritten");
    }

    // Newest row is last in display order.
    let rows = v.store().rows_oldest_first();
    assert_eq!(rows.len(), 256);
    assert!(rows[255].iter().all(|&p| p == 0x00));
    assert!(rows[0].iter().all(|&p| p == 0xFF));
}

#[test]
fn reconfigure_with_new_width_resets_counters() {
    let mut v = viewer();
    let now = Instant::now();
    v.apply(control(r#"{"status":"recording","width":64,"maxLines":16}"#), now);
    for _ in 0..20 {
        v.apply(row(7, 64), now);
    }
    assert_eq!(v.total_lines(), 20);
    assert_eq!(v.store().head_index(), 4);

    v.apply(control(r#"{"status":"recording","width":128,"maxLines":16}"#), now);

    assert_eq!(v.geometry(), Some(StreamGeometry::new(128, 16)));
    assert_eq!(v.total_lines(), 0);
    assert_eq!(v.store().head_index(), 0);
    assert_eq!(v.store().device().allocations(), 2);
    assert_eq!(v.store().device().live_surfaces(), 1);

    // Rows of the old width are now malformed.
    v.apply(row(7, 64), now);
    assert_eq!(v.total_lines(), 0);
    v.apply(row(7, 128), now);
    assert_eq!(v.total_lines(), 1);
}

#[test]
fn announcement_without_max_lines_uses_default_capacity() {
    let mut v = viewer();
    v.apply(control(r#"{"status":"recording","width":32}"#), Instant::now());
    assert_eq!(v.geometry(), Some(StreamGeometry::new(32, DEFAULT_MAX_LINES)));
}

#[test]
fn malformed_rows_never_advance_the_ring() {
    let mut v = viewer();
    let now = Instant::now();
    v.apply(control(r#"{"status":"recording","width":8,"maxLines":4}"#), now);
    v.apply(row(1, 8), now);
    for len in [0, 1, 7, 9, 16] {
        v.apply(row(2, len), now);
    }
    assert_eq!(v.total_lines(), 1);
    assert_eq!(v.store().head_index(), 1);
    assert_eq!(v.dropped_rows(), 5);
}

#[test]
fn teardown_releases_device_surface() {
    let mut v = viewer();
    v.apply(control(r#"{"status":"recording","width":8,"maxLines":4}"#), Instant::now());
    assert_eq!(v.store().device().live_surfaces(), 1);
    v.teardown();
    assert!(!v.is_ready());
    assert_eq!(v.store().device().live_surfaces(), 0);
}

#[test]
fn oversized_announcement_is_refused_and_stream_recovers() {
    let mut v = viewer();
    let now = Instant::now();
    v.apply(
        control(r#"{"status":"recording","width":4294967295,"maxLines":4294967295}"#),
        now,
    );
    assert!(!v.is_ready());
    assert_eq!(v.store().device().allocations(), 0);
    v.apply(row(1, 16), now);
    assert_eq!(v.total_lines(), 0);

    v.apply(control(r#"{"status":"recording","width":16,"maxLines":8}"#), now);
    v.apply(row(1, 16), now);
    assert_eq!(v.total_lines(), 1);
}
