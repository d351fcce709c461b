//! Layout constants and colors for the viewer.

use egui::{Color32, CornerRadius, Stroke};

pub const STATUS_BAR_HEIGHT: f32 = 24.0;
pub const CONTROLS_HEIGHT: f32 = 36.0;
pub const URL_FIELD_WIDTH: f32 = 260.0;
pub const PANEL_PADDING: f32 = 8.0;

pub const CARD_ROUNDING: CornerRadius = CornerRadius::same(4);

pub mod colors {
    use super::*;

    pub const SUCCESS: Color32 = Color32::from_rgb(34, 197, 94);
    pub const ERROR: Color32 = Color32::from_rgb(239, 68, 68);
    pub const WARNING: Color32 = Color32::from_rgb(234, 179, 8);
    pub const INFO: Color32 = Color32::from_rgb(59, 130, 246);

    pub const CONNECTED: Color32 = SUCCESS;
    pub const DISCONNECTED: Color32 = Color32::from_rgb(156, 163, 175);
    pub const CONNECTING: Color32 = WARNING;
    pub const RECONNECTING: Color32 = WARNING;

    /// Record toggle while recording.
    pub const RECORDING: Color32 = ERROR;

    pub const MUTED: Color32 = Color32::from_rgb(107, 114, 128);
    pub const BORDER: Color32 = Color32::from_rgb(55, 65, 81);
    pub const CANVAS: Color32 = Color32::BLACK;
}

/// Frame around the scan canvas.
pub fn canvas_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(colors::CANVAS)
        .corner_radius(CARD_ROUNDING)
        .stroke(Stroke::new(1.0, colors::BORDER))
}
