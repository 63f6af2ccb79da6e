//! Capture and display schedules
//!
//! The capture task pulls frames at the camera rate and hands each one to the
//! decoder. The display task polls the published result on its own, slower
//! timer. They share nothing but the publisher slot.

use std::sync::Arc;
use std::time::Duration;

use camera_capture::{CameraError, FrameSource, RollingShutterSimulator, StillImageSource};
use governor::clock::Clock;
use shutter_decoder::{
    DecodeOutcome, DecoderConfig, DecoderError, FrameLuminanceDecoder, ResultPublisher,
};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::settings::{Settings, SourceKind};

/// Control messages for the capture task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureCommand {
    /// Switch to the other camera
    Flip,
    /// Stop capturing
    Stop,
}

/// Rate-limiter clock backed by the tokio timer, so paused test time
/// drives the frame-rate cap too
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// Decoder used by the capture task
pub type CaptureDecoder = FrameLuminanceDecoder<TokioClock>;

/// Build the capture task's decoder with a fresh result slot
pub fn build_decoder(config: DecoderConfig) -> Result<CaptureDecoder, DecoderError> {
    FrameLuminanceDecoder::with_clock(config, Arc::new(ResultPublisher::new()), TokioClock)
}

/// Open the frame source named in the settings
pub fn open_source(settings: &Settings) -> Result<Box<dyn FrameSource>, CameraError> {
    match settings.source.kind {
        SourceKind::Simulator => Ok(Box::new(RollingShutterSimulator::new(
            settings.camera.clone(),
            settings.source.simulator.clone(),
        ))),
        SourceKind::Still => {
            let path = settings
                .source
                .path
                .as_deref()
                .ok_or(CameraError::NotInitialized)?;
            Ok(Box::new(StillImageSource::open(path, settings.camera.clone())?))
        }
    }
}

/// Delivery period for a camera running at `fps`
fn frame_period(fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / fps.max(1) as f64)
}

/// Capture loop: one frame per tick, decoded inline, never queued.
///
/// Ticks missed while a frame is being handled are skipped, so a slow decode
/// drops frames instead of building a backlog. Commands win over ticks, and any
/// command queued since the last tick is applied before the next frame is
/// pulled, so a frame is never tagged with a session its camera does not belong to.
pub async fn run_capture(
    mut source: Box<dyn FrameSource>,
    mut decoder: CaptureDecoder,
    mut commands: mpsc::Receiver<CaptureCommand>,
) {
    let session = decoder.session();
    let mut ticker = interval(frame_period(source.config().fps));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Capture started at {} fps", source.config().fps);

    loop {
        tokio::select! {
            biased;

            command = commands.recv() => {
                if !apply_command(command, source.as_mut(), &mut decoder) {
                    break;
                }
            }
            _ = ticker.tick() => {
                if !drain_commands(&mut commands, source.as_mut(), &mut decoder) {
                    break;
                }

                let generation = session.current();
                let frame = match source.next_frame() {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("Frame capture failed: {}", e);
                        continue;
                    }
                };

                let outcome = decoder.process_tagged_frame(&frame.as_frame(), generation);
                if let DecodeOutcome::Skipped(reason) = &outcome {
                    debug!("Frame {} skipped: {}", frame.sequence, reason);
                }
            }
        }
    }

    info!("Capture stopped");
}

/// Apply every command already queued. Returns false once capture should stop.
fn drain_commands(
    commands: &mut mpsc::Receiver<CaptureCommand>,
    source: &mut dyn FrameSource,
    decoder: &mut CaptureDecoder,
) -> bool {
    while let Ok(command) = commands.try_recv() {
        if !apply_command(Some(command), source, decoder) {
            return false;
        }
    }
    true
}

/// Returns false once capture should stop
fn apply_command(
    command: Option<CaptureCommand>,
    source: &mut dyn FrameSource,
    decoder: &mut CaptureDecoder,
) -> bool {
    match command {
        Some(CaptureCommand::Flip) => {
            let mut config = source.config().clone();
            config.facing = config.facing.flipped();
            match source.reconfigure(config) {
                Ok(()) => {
                    decoder.restart();
                    info!("Camera flipped to {:?}", source.config().facing);
                }
                Err(e) => warn!("Camera flip failed: {}", e),
            }
            true
        }
        Some(CaptureCommand::Stop) | None => false,
    }
}

/// Tracks what the display last showed
pub struct DisplayRefresher {
    publisher: Arc<ResultPublisher>,
    shown: Option<Arc<str>>,
}

impl DisplayRefresher {
    pub fn new(publisher: Arc<ResultPublisher>) -> Self {
        Self {
            publisher,
            shown: None,
        }
    }

    /// Read the slot; returns the value only if it differs from what is shown
    pub fn poll(&mut self) -> Option<Arc<str>> {
        let current = self.publisher.read();
        if self.shown.as_ref() == Some(&current) {
            return None;
        }
        self.shown = Some(Arc::clone(&current));
        Some(current)
    }
}

/// Display loop: independent of the camera rate
pub async fn run_display(publisher: Arc<ResultPublisher>, refresh: Duration) {
    let mut refresher = DisplayRefresher::new(publisher);
    let mut ticker = interval(refresh);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Some(text) = refresher.poll() {
            info!(target: "shutter_scope::display", "Rolling shutter stream: {}", text);
        }
    }
}
