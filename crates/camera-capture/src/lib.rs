//! Camera Capture Library
//!
//! Delivers raw frames to the rolling-shutter decoder.
//! Supports:
//! - Planar YUV frames with the luminance plane first
//! - A synthetic rolling-shutter camera watching a blinking light
//! - Still images replayed as a frame stream

pub mod frame;
pub mod source;

pub use frame::{Frame, PixelFormat, VideoFrame};
pub use source::{FrameSource, RollingShutterSimulator, SimulatorConfig, StillImageSource};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open frame source: {0}")]
    Open(String),

    #[error("Invalid capture format: {0}")]
    Format(String),

    #[error("No frame source configured")]
    NotInitialized,
}

/// Which way the camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    #[default]
    Back,
    Front,
}

impl CameraFacing {
    /// The opposite camera
    pub fn flipped(self) -> Self {
        match self {
            CameraFacing::Back => CameraFacing::Front,
            CameraFacing::Front => CameraFacing::Back,
        }
    }
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera facing
    pub facing: CameraFacing,
    /// Capture width
    pub width: u32,
    /// Capture height
    pub height: u32,
    /// Delivered frames per second
    pub fps: u32,
    /// Extra bytes at the end of each luminance row
    pub row_padding: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            facing: CameraFacing::Back,
            width: 640,
            height: 480,
            fps: 30,
            row_padding: 0,
        }
    }
}

impl CameraConfig {
    /// 1080p sensor at 30fps
    pub fn full_hd() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30,
            ..Default::default()
        }
    }
}
