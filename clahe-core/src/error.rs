//! Error types for the CLAHE transform and its image layer.

use thiserror::Error;

/// Errors that can occur while equalizing a pixel buffer.
///
/// The transform validates everything before touching the buffer, so any
/// of these leaves the caller's pixels unchanged.
#[derive(Debug, Error)]
pub enum ClaheError {
    /// Width, height or sample data is empty
    #[error("pixel buffer is empty")]
    EmptyBuffer,

    /// Only 1, 2 and 3 channel buffers can be equalized
    #[error("unsupported channel count: expected 1..=3, got {0}")]
    UnsupportedChannels(u8),

    /// Sample slice does not match `width * height * channels`
    #[error("buffer size mismatch: expected {expected} samples, got {actual}")]
    BufferSizeMismatch {
        /// Samples implied by the declared shape
        expected: usize,
        /// Samples actually supplied
        actual: usize,
    },

    /// Tile length must be at least one pixel
    #[error("tile length must be greater than zero")]
    InvalidTileLength,

    /// Invalid numeric parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Decoding or encoding failed
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Filesystem error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for CLAHE operations
pub type ClaheResult<T> = Result<T, ClaheError>;
