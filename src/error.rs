//! Error types for the visualizer library.

use thiserror::Error;

/// Errors surfaced by the visualizer.
///
/// Recoverable problems (undecodable covers, missing feature fields, unknown
/// modes) are logged and replaced by defaults instead of being returned.
/// Only failures that leave a component unusable show up here.
#[derive(Debug, Error)]
pub enum VisualizerError {
    #[error("drawing surface unavailable ({width}x{height})")]
    SurfaceUnavailable { width: u32, height: u32 },

    #[error("unknown visualizer mode '{0}'")]
    UnknownMode(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid track state: {0}")]
    TrackState(#[from] serde_json::Error),

    #[error("gpu error: {0}")]
    Gpu(String),
}

pub type Result<T> = std::result::Result<T, VisualizerError>;
