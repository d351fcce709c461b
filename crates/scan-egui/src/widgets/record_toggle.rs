//! Record on/off toggle.

use egui::{Response, RichText, Sense, Stroke, Ui, Widget};

use crate::layout::{self, colors};

/// Pill-shaped button flipping `recording`.
///
/// The returned response is `changed()` on the frame the flag flips.
pub struct RecordToggle<'a> {
    recording: &'a mut bool,
}

impl<'a> RecordToggle<'a> {
    pub fn new(recording: &'a mut bool) -> Self {
        Self { recording }
    }
}

impl Widget for RecordToggle<'_> {
    fn ui(self, ui: &mut Ui) -> Response {
        let (label, color) = if *self.recording {
            ("\u{25a0} Stop", colors::RECORDING)
        } else {
            ("\u{25cf} Record", colors::MUTED)
        };
        let text = RichText::new(label).strong().color(if *self.recording {
            egui::Color32::WHITE
        } else {
            colors::RECORDING
        });

        let button = egui::Button::new(text)
            .fill(if *self.recording {
                color
            } else {
                ui.visuals().widgets.inactive.bg_fill
            })
            .stroke(Stroke::new(1.0, color))
            .corner_radius(layout::CARD_ROUNDING)
            .sense(Sense::click());

        let mut response = ui.add(button);
        if response.clicked() {
            *self.recording = !*self.recording;
            response.mark_changed();
        }
        response.on_hover_text(if *self.recording {
            "Stop recording and close the stream"
        } else {
            "Connect and start streaming lines"
        })
    }
}
