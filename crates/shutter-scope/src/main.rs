//! Shutter Scope - Main Entry Point

use std::path::PathBuf;

use anyhow::Context;
use shutter_scope::settings::{Settings, DEFAULT_SETTINGS_PATH};
use shutter_scope::{init_logging, install_metrics, run};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));

    let settings = Settings::load(&path)
        .with_context(|| format!("loading settings from {}", path.display()))?;
    init_logging(&settings.logging);

    info!("=== Shutter Scope v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Source: {:?}, camera {}x{} @ {} fps, decoding at up to {} fps",
        settings.source.kind,
        settings.camera.width,
        settings.camera.height,
        settings.camera.fps,
        settings.decoder.target_fps
    );

    let prometheus = install_metrics();
    run(settings, prometheus).await?;

    Ok(())
}
