//! Decoder configuration

use std::num::NonZeroU32;
use std::time::Duration;

use governor::Quota;
use serde::{Deserialize, Serialize};

use crate::condense::Condenser;
use crate::error::ConfigError;

/// Decoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Keep every Nth binarized row (>= 1)
    pub downsample_step: usize,

    /// Maximum symbols in the display string
    pub max_display_length: usize,

    /// Maximum frames decoded per second
    pub target_fps: u32,

    /// Per-frame decode time budget (milliseconds); overruns are logged
    pub frame_budget_ms: u64,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            downsample_step: 10,
            max_display_length: 50,
            target_fps: 15,
            frame_budget_ms: 20,
        }
    }
}

impl DecoderConfig {
    /// Check the configuration before any frame is processed
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_fps == 0 {
            return Err(ConfigError::ZeroFps);
        }
        self.frame_quota()?;
        self.condenser().map(|_| ())
    }

    /// Build the downsampler for this configuration
    pub fn condenser(&self) -> Result<Condenser, ConfigError> {
        Condenser::new(self.downsample_step, self.max_display_length)
    }

    /// Minimum spacing between decoded frames
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps.max(1) as f64)
    }

    /// Rate-limiter quota: one decode per frame interval, no burst
    pub fn frame_quota(&self) -> Result<Quota, ConfigError> {
        Quota::with_period(self.frame_interval())
            .map(|quota| quota.allow_burst(NonZeroU32::MIN))
            .ok_or(ConfigError::FpsTooHigh(self.target_fps))
    }

    /// Per-frame time budget
    pub fn frame_budget(&self) -> Duration {
        Duration::from_millis(self.frame_budget_ms)
    }
}
