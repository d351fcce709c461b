//! Pointer and wheel handling for the canvas.
//!
//! Positions are measured in pixels from the top-left corner of the rendered
//! viewport and are normalized by the viewport size on every event, so the
//! math stays correct across window resizes.

use crate::transform::{TransformState, ZoomLimits};

/// A pointer position relative to the viewport's top-left corner, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    /// Distance from the left edge.
    pub x: f32,
    /// Distance from the top edge.
    pub y: f32,
}

impl ScreenPoint {
    /// Create a point from pixel offsets.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Size of the rendered viewport in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Viewport {
    /// Create a viewport of the given size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether the viewport has a usable area.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Convert a pixel position to clip space (y up).
    ///
    /// Returns `None` for a degenerate viewport.
    #[must_use]
    pub fn to_clip(&self, point: ScreenPoint) -> Option<(f32, f32)> {
        if !self.is_valid() {
            return None;
        }
        let x = point.x / self.width * 2.0 - 1.0;
        let y = -(point.y / self.height * 2.0 - 1.0);
        Some((x, y))
    }
}

/// Direction of one wheel step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDirection {
    /// Magnify.
    In,
    /// Shrink.
    Out,
}

/// Translates pointer input into [`TransformState`] updates.
///
/// Holds only gesture state (the drag origin). Every method that changes the
/// transform returns `true` so the caller can publish and schedule a redraw.
#[derive(Debug, Clone)]
pub struct InteractionController {
    limits: ZoomLimits,
    drag_origin: Option<ScreenPoint>,
}

impl InteractionController {
    /// Create a controller with the given zoom limits.
    #[must_use]
    pub fn new(limits: ZoomLimits) -> Self {
        Self {
            limits,
            drag_origin: None,
        }
    }

    /// Apply one wheel step anchored at `cursor`.
    ///
    /// The quad coordinate under the cursor before the step stays under the
    /// cursor after it.
    pub fn wheel(
        &mut self,
        transform: &mut TransformState,
        cursor: ScreenPoint,
        viewport: Viewport,
        direction: WheelDirection,
    ) -> bool {
        let Some((clip_x, clip_y)) = viewport.to_clip(cursor) else {
            return false;
        };
        let (world_x, world_y) = transform.to_world(clip_x, clip_y);

        let zoom = match direction {
            WheelDirection::In => self.limits.step_in(transform.zoom),
            WheelDirection::Out => self.limits.step_out(transform.zoom),
        };

        transform.zoom = zoom;
        transform.pan_x = clip_x - world_x * zoom;
        transform.pan_y = clip_y - world_y * zoom;
        true
    }

    /// Begin a drag at `pos`.
    pub fn press(&mut self, pos: ScreenPoint) {
        self.drag_origin = Some(pos);
    }

    /// Continue a drag to `pos`, translating the pan by the pointer delta.
    ///
    /// No-op when no drag is in progress.
    pub fn drag_to(
        &mut self,
        transform: &mut TransformState,
        pos: ScreenPoint,
        viewport: Viewport,
    ) -> bool {
        let Some(origin) = self.drag_origin else {
            return false;
        };
        if !viewport.is_valid() {
            return false;
        }

        let dx = pos.x - origin.x;
        let dy = pos.y - origin.y;
        transform.pan_x += dx / viewport.width * 2.0;
        // screen y grows downward, clip y grows upward
        transform.pan_y -= dy / viewport.height * 2.0;
        self.drag_origin = Some(pos);
        true
    }

    /// End the current drag (pointer released or left the canvas).
    pub fn release(&mut self) {
        self.drag_origin = None;
    }

    /// Restore the identity transform.
    pub fn reset(&mut self, transform: &mut TransformState) -> bool {
        self.drag_origin = None;
        transform.reset();
        true
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(ZoomLimits::default())
    }
}
