//! Maps egui pointer input on the canvas to [`InputCommand`]s.

use egui::{PointerButton, Pos2, Rect, Response};
use scan_core::{InputCommand, ScreenPoint, Viewport, WheelDirection};

/// Pointer state sampled from one frame of canvas interaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanvasInput {
    /// Pointer position, if any.
    pub pointer: Option<Pos2>,
    /// Vertical wheel delta while hovering; positive scrolls up.
    pub scroll_y: f32,
    /// Primary button pressed on the canvas this frame.
    pub drag_started: bool,
    /// Primary button held and moving.
    pub dragged: bool,
    /// Primary button released.
    pub drag_stopped: bool,
    /// Double click on the canvas.
    pub double_clicked: bool,
}

impl CanvasInput {
    /// Sample `response` (allocated with `Sense::click_and_drag`).
    pub fn from_response(ui: &egui::Ui, response: &Response) -> Self {
        let scroll_y = if response.hovered() {
            ui.input(|i| i.raw_scroll_delta.y)
        } else {
            0.0
        };
        Self {
            pointer: response.interact_pointer_pos().or(response.hover_pos()),
            scroll_y,
            drag_started: response.drag_started_by(PointerButton::Primary),
            dragged: response.dragged_by(PointerButton::Primary),
            drag_stopped: response.drag_stopped(),
            double_clicked: response.double_clicked(),
        }
    }

    /// Commands for this frame, in application order.
    #[must_use]
    pub fn commands(&self, rect: Rect) -> Vec<InputCommand> {
        let viewport = Viewport::new(rect.width(), rect.height());
        let local = self
            .pointer
            .map(|p| ScreenPoint::new(p.x - rect.min.x, p.y - rect.min.y));
        let mut commands = Vec::new();

        if self.double_clicked {
            commands.push(InputCommand::Reset);
        }
        if let Some(pos) = local {
            if self.drag_started {
                commands.push(InputCommand::Press { pos });
            }
            if self.dragged {
                commands.push(InputCommand::Drag { pos, viewport });
            }
            if self.scroll_y != 0.0 {
                let direction = if self.scroll_y > 0.0 {
                    WheelDirection::In
                } else {
                    WheelDirection::Out
                };
                commands.push(InputCommand::Wheel {
                    cursor: pos,
                    viewport,
                    direction,
                });
            }
        }
        if self.drag_stopped {
            commands.push(InputCommand::Release);
        }
        commands
    }
}
