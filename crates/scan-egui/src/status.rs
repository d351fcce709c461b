//! Collaborator callbacks captured for display.

use scan_core::ViewerObserver;

/// Last values reported by the viewer core, read by the widgets each frame.
#[derive(Debug, Clone, Default)]
pub struct UiStatus {
    gpu_status: String,
    connected: bool,
    frequency: Option<u32>,
}

impl UiStatus {
    /// Latest GPU status string (empty until the first report).
    #[must_use]
    pub fn gpu_status(&self) -> &str {
        &self.gpu_status
    }

    /// Whether the transport is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Latest rate in lines per second.
    #[must_use]
    pub fn frequency(&self) -> Option<u32> {
        self.frequency
    }
}

impl ViewerObserver for UiStatus {
    fn on_status_change(&mut self, status: &str) {
        status.clone_into(&mut self.gpu_status);
    }

    fn on_connection_change(&mut self, connected: bool) {
        self.connected = connected;
    }

    fn on_frequency_change(&mut self, lines_per_sec: Option<u32>) {
        self.frequency = lines_per_sec;
    }
}

/// `"N lines/sec"`, or an em dash before the first measurement.
#[must_use]
pub fn format_frequency(frequency: Option<u32>) -> String {
    match frequency {
        Some(rate) => format!("{rate} lines/sec"),
        None => "\u{2014}".to_string(),
    }
}

/// Zoom factor as shown on the canvas controls.
#[must_use]
pub fn format_zoom(zoom: f32) -> String {
    format!("{zoom:.1}\u{d7}")
}
