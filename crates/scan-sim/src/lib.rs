//! Simulated line-scan camera.
//!
//! Serves the viewer's wire protocol on `/ws/stream`: after a client sends
//! `{"action":"start"}` it announces the stream geometry and then pushes one
//! binary row per tick, wrapping around the source image. `{"action":"stop"}`
//! pauses the row stream for that client.
//!
//! Rows come either from a grayscale image on disk or from a deterministic
//! synthetic pattern, so the viewer can be exercised without hardware.

pub mod error;
pub mod server;
pub mod source;

pub use error::{Result, SimError};
pub use server::{router, serve, spawn_local, SimState};
pub use source::{ImageSource, RowSource, SourceSpec, SyntheticSource, FALLBACK_LINES, MAX_WIDTH};
