//! egui front end for the line-scan viewer.
//!
//! The canvas is drawn by a wgpu paint callback ([`render`]) sampling a ring
//! texture owned by [`gpu::GpuDevice`]. Everything stateful lives in
//! [`scan_core::ViewerState`]; this crate only feeds it session events and
//! pointer input once per frame and reads back what to display.

pub mod app;
pub mod gpu;
pub mod input;
pub mod layout;
pub mod logging;
pub mod probe;
pub mod render;
pub mod status;
pub mod widgets;

pub use app::{LineScanApp, ViewerOptions};
pub use probe::{run_until, LogObserver, ProbeSummary};
