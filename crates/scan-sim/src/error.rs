//! Simulator error types.

use thiserror::Error;

/// Result type alias using SimError.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors raised while setting up or running the simulator.
#[derive(Error, Debug)]
pub enum SimError {
    /// Socket bind or accept failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Source image could not be decoded.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Invalid simulator settings.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
