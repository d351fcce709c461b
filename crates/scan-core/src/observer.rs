//! Notifications for the surrounding UI.

/// Receives the viewer's side-effecting notifications.
///
/// Implementations must not block; calls arrive on the thread that drives
/// [`crate::ViewerState`].
pub trait ViewerObserver {
    /// GPU acquisition/configuration progress or failure.
    fn on_status_change(&mut self, status: &str);

    /// Connection opened (`true`) or lost/closed (`false`).
    fn on_connection_change(&mut self, connected: bool);

    /// Line rate in lines/second, or `None` when unknown.
    fn on_frequency_change(&mut self, lines_per_sec: Option<u32>);
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ViewerObserver for NullObserver {
    fn on_status_change(&mut self, _status: &str) {}
    fn on_connection_change(&mut self, _connected: bool) {}
    fn on_frequency_change(&mut self, _lines_per_sec: Option<u32>) {}
}
