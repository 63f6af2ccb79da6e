//! Rolling-Shutter Frame Decoder
//!
//! Turns one camera frame's luminance plane into a coarse light/dark string:
//! - Format gate (planar luminance only)
//! - Center-column sampling, one sample per row
//! - Mean-brightness threshold
//! - Binarization and downsampling
//! - Single-slot publishing for an independent display cadence

pub mod condense;
pub mod config;
pub mod decoder;
pub mod error;
pub mod publisher;
pub mod sampler;
pub mod session;
pub mod stats;
pub mod symbol;
pub mod threshold;
pub mod throttle;
pub mod validator;

pub use condense::{condense, Condenser};
pub use config::DecoderConfig;
pub use decoder::{decode, DecodeOutcome, FrameLuminanceDecoder};
pub use error::{ConfigError, DecoderError};
pub use publisher::{ResultPublisher, PROCESSING_ERROR, SCANNING};
pub use sampler::{center_column, sample, SampleColumn};
pub use session::{CaptureSession, Generation};
pub use stats::{DecoderStats, StatsSnapshot};
pub use symbol::{binarize, Symbol, SymbolString};
pub use threshold::{estimate, Threshold};
pub use throttle::FrameThrottle;
pub use validator::{validate, ValidFrame};
