//! Decoder Error Types

use camera_capture::PixelFormat;
use thiserror::Error;

/// Rejected decoder configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Downsample step of zero would never advance
    #[error("downsample_step must be at least 1")]
    ZeroStep,

    /// Frame-rate cap of zero would never admit a frame
    #[error("target_fps must be greater than 0")]
    ZeroFps,

    /// Frame interval rounds down to zero
    #[error("target_fps {0} is too high to schedule")]
    FpsTooHigh(u32),
}

/// Per-frame decode failures
#[derive(Debug, Clone, Error)]
pub enum DecoderError {
    /// Frame is not in the planar luminance layout
    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(PixelFormat),

    /// No row of the sampled column fell inside the buffer
    #[error("Column sampling produced no samples")]
    EmptyColumn,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A stage panicked while decoding a frame
    #[error("Decoder panicked: {0}")]
    Panicked(String),
}

impl DecoderError {
    /// Whether this failure should replace the published result with the error sentinel
    pub fn surfaces_to_consumer(&self) -> bool {
        matches!(self, DecoderError::EmptyColumn | DecoderError::Panicked(_))
    }
}
