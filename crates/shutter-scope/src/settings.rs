//! Layered settings: TOML file, then `SHUTTER__*` environment overrides

use std::path::{Path, PathBuf};

use camera_capture::{CameraConfig, SimulatorConfig};
use serde::Deserialize;
use shutter_decoder::{ConfigError as DecoderConfigError, DecoderConfig};
use thiserror::Error;

/// Settings file used when none is given on the command line
pub const DEFAULT_SETTINGS_PATH: &str = "shutter-scope.toml";

/// Prefix for environment overrides, e.g. `SHUTTER__DECODER__TARGET_FPS=10`
const ENV_PREFIX: &str = "SHUTTER";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid decoder settings: {0}")]
    Decoder(#[from] DecoderConfigError),

    #[error("still image source needs `source.path`")]
    MissingImagePath,

    #[error("display.refresh_interval_ms must be greater than 0")]
    ZeroRefresh,

    #[error("camera resolution {0}x{1} is empty")]
    EmptyResolution(u32, u32),

    #[error("camera.fps must be greater than 0")]
    ZeroCameraFps,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub camera: CameraConfig,
    pub decoder: DecoderConfig,
    pub source: SourceSettings,
    pub display: DisplaySettings,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

/// Where frames come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Simulator,
    Still,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub kind: SourceKind,
    /// Image file for the `still` source
    pub path: Option<PathBuf>,
    /// Light and sensor timing for the `simulator` source
    pub simulator: SimulatorConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// How often the display side polls the result (milliseconds)
    pub refresh_interval_ms: u64,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
        }
    }
}

impl Settings {
    /// Load from `path` (optional) with environment overrides on top
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let settings: Settings = raw.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a TOML string (no environment layer)
    pub fn from_toml(text: &str) -> Result<Self, SettingsError> {
        let raw = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?;
        let settings: Settings = raw.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.decoder.validate()?;
        if self.camera.fps == 0 {
            return Err(SettingsError::ZeroCameraFps);
        }
        // A still image brings its own geometry
        if self.source.kind == SourceKind::Simulator
            && (self.camera.width == 0 || self.camera.height == 0)
        {
            return Err(SettingsError::EmptyResolution(
                self.camera.width,
                self.camera.height,
            ));
        }
        if self.source.kind == SourceKind::Still && self.source.path.is_none() {
            return Err(SettingsError::MissingImagePath);
        }
        if self.display.refresh_interval_ms == 0 {
            return Err(SettingsError::ZeroRefresh);
        }
        Ok(())
    }
}
