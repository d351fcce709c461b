//! Zoom/pan state applied by the vertex stage.
//!
//! Pan offsets are in clip-space units (`[-1, 1]` spans the viewport). The
//! ring position (head index, total lines) lives in [`crate::RingBufferStore`]
//! and is combined with this state into [`crate::SurfaceParams`] on publish.

use serde::{Deserialize, Serialize};

/// Lower zoom bound: the image never shrinks below the viewport.
pub const DEFAULT_MIN_ZOOM: f32 = 1.0;

/// Upper zoom bound.
pub const DEFAULT_MAX_ZOOM: f32 = 20.0;

/// Multiplicative zoom change per wheel step.
pub const DEFAULT_ZOOM_FACTOR: f32 = 1.1;

/// Current zoom and pan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    /// Scale applied to the full-viewport quad.
    pub zoom: f32,
    /// Horizontal offset in clip space.
    pub pan_x: f32,
    /// Vertical offset in clip space (positive is up).
    pub pan_y: f32,
}

impl TransformState {
    /// Unzoomed, centered view.
    pub const IDENTITY: Self = Self {
        zoom: 1.0,
        pan_x: 0.0,
        pan_y: 0.0,
    };

    /// Restore the identity transform.
    pub fn reset(&mut self) {
        *self = Self::IDENTITY;
    }

    /// Map a clip-space point back to the unzoomed quad coordinate under it.
    #[must_use]
    pub fn to_world(&self, clip_x: f32, clip_y: f32) -> (f32, f32) {
        (
            (clip_x - self.pan_x) / self.zoom,
            (clip_y - self.pan_y) / self.zoom,
        )
    }

    /// Forward transform used by the vertex stage.
    #[must_use]
    pub fn to_clip(&self, world_x: f32, world_y: f32) -> (f32, f32) {
        (
            world_x * self.zoom + self.pan_x,
            world_y * self.zoom + self.pan_y,
        )
    }
}

impl Default for TransformState {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Zoom clamping and step configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    /// Smallest allowed zoom.
    pub min: f32,
    /// Largest allowed zoom.
    pub max: f32,
    /// Factor applied per wheel step.
    pub factor: f32,
}

impl ZoomLimits {
    /// Clamp a zoom value into `[min, max]`.
    #[must_use]
    pub fn clamp(&self, zoom: f32) -> f32 {
        zoom.max(self.min).min(self.max)
    }

    /// Zoom after one step in.
    #[must_use]
    pub fn step_in(&self, zoom: f32) -> f32 {
        self.clamp(zoom * self.factor)
    }

    /// Zoom after one step out.
    #[must_use]
    pub fn step_out(&self, zoom: f32) -> f32 {
        self.clamp(zoom / self.factor)
    }
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_ZOOM,
            max: DEFAULT_MAX_ZOOM,
            factor: DEFAULT_ZOOM_FACTOR,
        }
    }
}
