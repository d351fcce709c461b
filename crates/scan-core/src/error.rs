//! Error types for the viewer core.

use thiserror::Error;

/// Result type alias using ScanError.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors raised inside the viewer core.
///
/// None of these cross the collaborator boundary: [`crate::ViewerState`]
/// turns them into status strings and log events.
#[derive(Error, Debug)]
pub enum ScanError {
    /// No compatible rendering device could be acquired.
    #[error("{0}")]
    DeviceUnavailable(String),

    /// A pixel row did not match the configured surface width.
    #[error("row length {actual} does not match surface width {expected}")]
    RowLength {
        /// Configured width in bytes.
        expected: u32,
        /// Length of the rejected payload.
        actual: usize,
    },

    /// A row arrived before any surface was configured.
    #[error("ring buffer is not configured")]
    NotConfigured,

    /// Stream geometry that cannot back a surface (zero width or height).
    #[error("invalid stream geometry: {0}")]
    InvalidGeometry(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),
}

impl ScanError {
    /// Text suitable for the GPU-status callback.
    #[must_use]
    pub fn status_text(&self) -> String {
        match self {
            Self::DeviceUnavailable(reason) => reason.clone(),
            other => format!("GPU error: {other}"),
        }
    }
}
