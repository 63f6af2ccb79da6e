//! Frame sources feeding the decoder

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::frame::VideoFrame;
use crate::{CameraConfig, CameraError, CameraFacing};

/// Anything that can deliver camera frames one at a time
pub trait FrameSource: Send {
    /// Capture the next frame
    fn next_frame(&mut self) -> Result<VideoFrame, CameraError>;

    /// Active capture configuration
    fn config(&self) -> &CameraConfig;

    /// Apply a new capture configuration (device flip, resolution change)
    fn reconfigure(&mut self, config: CameraConfig) -> Result<(), CameraError>;
}

/// Light source and sensor timing for the simulator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Blink frequency of the simulated light source (Hz)
    pub led_frequency_hz: f64,
    /// Fraction of each period the light is on (0-1)
    pub duty_cycle: f64,
    /// Sensor readout time per row (microseconds)
    pub line_time_us: f64,
    /// Luminance of a row exposed while the light is on
    pub bright_level: u8,
    /// Luminance of a row exposed while the light is off
    pub dark_level: u8,
    /// Peak amplitude of per-pixel sensor noise
    pub noise: u8,
    /// Noise generator seed; equal seeds give identical frame streams
    pub seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            led_frequency_hz: 500.0,
            duty_cycle: 0.5,
            line_time_us: 30.0,
            bright_level: 220,
            dark_level: 30,
            noise: 8,
            seed: 0x5EED_F00D,
        }
    }
}

/// Synthetic rolling-shutter camera watching a blinking light.
///
/// Rows are read out one after another, so row `y` of frame `n` samples the
/// light at `n / fps + y * line_time`. A light blinking faster than the frame
/// rate shows up as horizontal bands.
pub struct RollingShutterSimulator {
    camera: CameraConfig,
    light: SimulatorConfig,
    sequence: u32,
    rng: StdRng,
}

impl RollingShutterSimulator {
    pub fn new(camera: CameraConfig, light: SimulatorConfig) -> Self {
        info!(
            "Rolling shutter simulator: {}x{} @ {}fps, light {} Hz",
            camera.width, camera.height, camera.fps, light.led_frequency_hz
        );
        Self {
            camera,
            sequence: 0,
            rng: StdRng::seed_from_u64(light.seed),
            light,
        }
    }

    /// Whether the light is on at time `t_secs`
    fn light_on(&self, t_secs: f64) -> bool {
        if self.light.led_frequency_hz <= 0.0 {
            return true;
        }
        let phase = (t_secs * self.light.led_frequency_hz).fract();
        phase < self.light.duty_cycle.clamp(0.0, 1.0)
    }

    fn next_noise(&mut self) -> i16 {
        let amplitude = self.light.noise as i16;
        if amplitude == 0 {
            return 0;
        }
        self.rng.gen_range(-amplitude..=amplitude)
    }

    /// Render frame `sequence` without advancing the source
    fn render(&mut self, sequence: u32) -> VideoFrame {
        let width = self.camera.width;
        let height = self.camera.height;
        let fps = self.camera.fps.max(1) as f64;
        let frame_start = sequence as f64 / fps;
        let line_time = self.light.line_time_us * 1e-6;

        // Front-facing sensors read out bottom to top relative to the scene
        let flipped = self.camera.facing == CameraFacing::Front;

        let mut luma = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            let readout_row = if flipped { height - 1 - y } else { y };
            let t = frame_start + readout_row as f64 * line_time;
            let level = if self.light_on(t) {
                self.light.bright_level
            } else {
                self.light.dark_level
            };
            for _ in 0..width {
                let value = level as i16 + self.next_noise();
                luma.push(value.clamp(0, 255) as u8);
            }
        }

        let stride = width + self.camera.row_padding;
        VideoFrame::from_luma(width, height, stride, &luma)
            .stamped((frame_start * 1e9) as u64, sequence)
    }
}

impl FrameSource for RollingShutterSimulator {
    fn next_frame(&mut self) -> Result<VideoFrame, CameraError> {
        let sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        let frame = self.render(sequence);
        debug!("Simulated frame {} ({} bytes)", sequence, frame.data.len());
        Ok(frame)
    }

    fn config(&self) -> &CameraConfig {
        &self.camera
    }

    fn reconfigure(&mut self, config: CameraConfig) -> Result<(), CameraError> {
        if config.width == 0 || config.height == 0 {
            return Err(CameraError::Format(format!(
                "invalid resolution {}x{}",
                config.width, config.height
            )));
        }
        info!("Simulator reconfigured: {:?} {}x{}", config.facing, config.width, config.height);
        self.camera = config;
        Ok(())
    }
}

/// Replays a still image from disk as a YUV frame stream
pub struct StillImageSource {
    camera: CameraConfig,
    luma: Vec<u8>,
    sequence: u32,
}

impl StillImageSource {
    /// Load an image file (any format the `image` crate reads)
    pub fn open(path: &Path, camera: CameraConfig) -> Result<Self, CameraError> {
        let img = image::open(path)
            .map_err(|e| CameraError::Open(format!("{}: {}", path.display(), e)))?
            .to_luma8();
        info!("Loaded still image {} ({}x{})", path.display(), img.width(), img.height());
        Ok(Self::from_gray(img, camera))
    }

    /// Use an in-memory grayscale image
    pub fn from_gray(img: image::GrayImage, mut camera: CameraConfig) -> Self {
        camera.width = img.width();
        camera.height = img.height();
        Self {
            camera,
            luma: img.into_raw(),
            sequence: 0,
        }
    }
}

impl FrameSource for StillImageSource {
    fn next_frame(&mut self) -> Result<VideoFrame, CameraError> {
        let sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        let stride = self.camera.width + self.camera.row_padding;
        Ok(VideoFrame::from_luma(self.camera.width, self.camera.height, stride, &self.luma)
            .stamped(0, sequence))
    }

    fn config(&self) -> &CameraConfig {
        &self.camera
    }

    fn reconfigure(&mut self, config: CameraConfig) -> Result<(), CameraError> {
        // Geometry is fixed by the image
        self.camera.facing = config.facing;
        self.camera.fps = config.fps;
        self.camera.row_padding = config.row_padding;
        Ok(())
    }
}
