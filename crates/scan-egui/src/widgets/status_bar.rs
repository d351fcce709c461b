//! Status bar widget.
//!
//! Fixed-height bottom panel showing the session state on the left, the GPU
//! status in the middle, and throughput plus version on the right.

use eframe::egui;
use scan_client::SessionState;

use crate::layout::{self, colors};
use crate::status::{format_frequency, UiStatus};

const DOT: &str = "\u{25cf}";

/// Bottom status bar.
#[derive(Debug, Default)]
pub struct StatusBar;

impl StatusBar {
    /// Create a new status bar.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Render the status bar.
    pub fn show(&self, ctx: &egui::Context, session: SessionState, status: &UiStatus) {
        egui::TopBottomPanel::bottom("app_status_bar")
            .exact_height(layout::STATUS_BAR_HEIGHT)
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    self.render_connection(ui, session, status);

                    ui.separator();
                    self.render_gpu_status(ui, status);

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            egui::RichText::new(format!("v{}", env!("CARGO_PKG_VERSION")))
                                .small()
                                .color(colors::MUTED),
                        );
                        ui.add_space(8.0);
                        ui.label(egui::RichText::new(format_frequency(status.frequency())).small());
                    });
                });
            });
    }

    fn render_connection(&self, ui: &mut egui::Ui, session: SessionState, status: &UiStatus) {
        let (color, text) = connection_indicator(session, status.is_connected());
        let response = ui.label(egui::RichText::new(DOT).color(color).size(14.0));
        ui.label(egui::RichText::new(text).small());
        response.on_hover_text(format!("Session: {}", session.label()));
    }

    fn render_gpu_status(&self, ui: &mut egui::Ui, status: &UiStatus) {
        let text = status.gpu_status();
        if text.is_empty() {
            return;
        }
        ui.label(egui::RichText::new(text).small().color(gpu_status_color(text)));
    }
}

/// Dot color and label for the connection section.
fn connection_indicator(session: SessionState, connected: bool) -> (egui::Color32, &'static str) {
    if connected {
        return (colors::CONNECTED, "Connected");
    }
    match session {
        SessionState::Connecting => (colors::CONNECTING, "Connecting..."),
        SessionState::Disconnected => (colors::RECONNECTING, "Reconnecting..."),
        SessionState::Idle | SessionState::Streaming => (colors::DISCONNECTED, "Disconnected"),
    }
}

fn gpu_status_color(text: &str) -> egui::Color32 {
    match text {
        scan_core::STATUS_READY => colors::SUCCESS,
        scan_core::STATUS_INITIALIZING => colors::INFO,
        _ => colors::ERROR,
    }
}
