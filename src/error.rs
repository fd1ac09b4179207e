//! Crate-wide error type.
//!
//! Configuration problems (bad dimensions, mismatched images) and sparse
//! system setup failures are errors. Solver non-convergence is not: it is
//! reported through `SolveOutput::converged` and a warning.

/// Errors produced by the reconstruction pipeline and its tools.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("expected {expected} channels, found {found}")]
    ChannelMismatch { expected: usize, found: usize },

    #[error("image size mismatch: {left_w}x{left_h} vs {right_w}x{right_h}")]
    DimensionMismatch {
        left_w: usize,
        left_h: usize,
        right_w: usize,
        right_h: usize,
    },

    #[error("linear system setup failed: {0}")]
    SolverSetup(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
