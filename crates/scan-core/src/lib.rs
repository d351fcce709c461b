//! Core of the line-scan viewer.
//!
//! This crate is UI-agnostic and transport-agnostic. It owns everything that
//! has to stay consistent while rows stream in and the user zooms around:
//!
//! - [`ring`]: the circular row surface and its wraparound bookkeeping
//! - [`transform`] / [`interaction`]: zoom/pan state and the anchored-zoom math
//! - [`frequency`]: the lines-per-second estimator
//! - [`protocol`]: the control messages exchanged with the stream endpoint
//! - [`viewer`]: the single owner that applies stream and input commands
//!
//! Rendering backends plug in through [`ring::RenderDevice`]; the GPU backend
//! lives in the `scan-egui` crate, and [`ring::HostDevice`] keeps a CPU copy
//! for headless use and tests.

pub mod config;
pub mod error;
pub mod frequency;
pub mod interaction;
pub mod observer;
pub mod protocol;
pub mod ring;
pub mod transform;
pub mod viewer;

pub use config::ViewerConfig;
pub use error::{Result, ScanError};
pub use frequency::FrequencyEstimator;
pub use interaction::{InteractionController, ScreenPoint, Viewport, WheelDirection};
pub use observer::{NullObserver, ViewerObserver};
pub use protocol::{Action, ClientCommand, StatusAnnouncement, StreamGeometry, DEFAULT_MAX_LINES};
pub use ring::{HostDevice, HostSurface, RenderDevice, RingBufferStore, RowSurface, SurfaceParams};
pub use transform::{TransformState, ZoomLimits};
pub use viewer::{
    InputCommand, RedrawScheduler, StreamEvent, ViewerCommand, ViewerState, STATUS_INITIALIZING,
    STATUS_NO_ADAPTER, STATUS_READY,
};
