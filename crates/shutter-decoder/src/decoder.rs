//! Per-frame decode driver

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use camera_capture::Frame;
use governor::clock::{Clock, MonotonicClock};
use metrics::{counter, histogram};
use tracing::{debug, error, info, warn};

use crate::condense::Condenser;
use crate::config::DecoderConfig;
use crate::error::DecoderError;
use crate::publisher::ResultPublisher;
use crate::sampler::{center_column, sample};
use crate::session::{CaptureSession, Generation};
use crate::stats::DecoderStats;
use crate::symbol::{binarize, SymbolString};
use crate::threshold::estimate;
use crate::throttle::FrameThrottle;
use crate::validator::validate;

/// What happened to one delivered frame
#[derive(Debug, Clone)]
pub enum DecodeOutcome {
    /// Decoded and written to the publisher
    Published(SymbolString),
    /// Arrived before the frame-rate cap allowed another decode
    Throttled,
    /// Rejected without touching the publisher
    Skipped(DecoderError),
    /// Failed; the publisher now shows the error sentinel
    Failed(DecoderError),
    /// The capture session changed mid-decode; nothing published
    Abandoned,
}

impl DecodeOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, DecodeOutcome::Published(_))
    }

    fn label(&self) -> &'static str {
        match self {
            DecodeOutcome::Published(_) => "published",
            DecodeOutcome::Throttled => "throttled",
            DecodeOutcome::Skipped(_) => "skipped",
            DecodeOutcome::Failed(_) => "failed",
            DecodeOutcome::Abandoned => "abandoned",
        }
    }
}

/// Run validate → sample → threshold → binarize → condense on one frame.
///
/// Pure: reads the frame, returns the condensed symbols, touches nothing else.
pub fn decode(frame: &Frame<'_>, condenser: &Condenser) -> Result<SymbolString, DecoderError> {
    let valid = validate(frame)?;

    let column = sample(&valid, center_column(valid.width()));
    if column.skipped_rows() > 0 {
        debug!(
            "Frame {}: {} of {} rows outside buffer",
            valid.sequence(),
            column.skipped_rows(),
            valid.height()
        );
    }

    let threshold = estimate(column.samples())?;
    let symbols = binarize(column.samples(), threshold);
    Ok(condenser.condense(&symbols))
}

/// One decode attempt over a borrowed frame
type DecodeStage = for<'a> fn(&Frame<'a>, &Condenser) -> Result<SymbolString, DecoderError>;

/// Turns camera frames into the latest rolling-shutter display string
pub struct FrameLuminanceDecoder<C: Clock = MonotonicClock> {
    config: DecoderConfig,
    condenser: Condenser,
    stage: DecodeStage,
    throttle: FrameThrottle<C>,
    session: CaptureSession,
    publisher: Arc<ResultPublisher>,
    stats: Arc<DecoderStats>,
}

impl FrameLuminanceDecoder {
    /// Create a decoder with its own publisher
    pub fn new(config: DecoderConfig) -> Result<Self, DecoderError> {
        Self::with_publisher(config, Arc::new(ResultPublisher::new()))
    }

    /// Create a decoder writing into an existing publisher
    pub fn with_publisher(
        config: DecoderConfig,
        publisher: Arc<ResultPublisher>,
    ) -> Result<Self, DecoderError> {
        Self::with_clock(config, publisher, MonotonicClock)
    }
}

impl<C: Clock> FrameLuminanceDecoder<C> {
    /// Create a decoder whose frame-rate cap reads time from `clock`
    pub fn with_clock(
        config: DecoderConfig,
        publisher: Arc<ResultPublisher>,
        clock: C,
    ) -> Result<Self, DecoderError> {
        config.validate()?;
        let condenser = config.condenser()?;
        let quota = config.frame_quota()?;
        info!(
            "Frame decoder: step={}, max_length={}, target_fps={}",
            config.downsample_step, config.max_display_length, config.target_fps
        );

        Ok(Self {
            throttle: FrameThrottle::with_clock(quota, clock),
            condenser,
            stage: decode,
            session: CaptureSession::new(),
            publisher,
            stats: Arc::new(DecoderStats::default()),
            config,
        })
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Read side of the result slot
    pub fn publisher(&self) -> Arc<ResultPublisher> {
        Arc::clone(&self.publisher)
    }

    /// Handle for the capture side to invalidate in-flight decodes
    pub fn session(&self) -> CaptureSession {
        self.session.clone()
    }

    pub fn stats(&self) -> Arc<DecoderStats> {
        Arc::clone(&self.stats)
    }

    /// Camera restarted: drop stale work and admit the next frame immediately
    pub fn restart(&mut self) {
        self.session.invalidate();
        self.throttle.reset();
    }

    /// Process one delivered frame
    pub fn process_frame(&mut self, frame: &Frame<'_>) -> DecodeOutcome {
        let generation = self.session.current();
        self.process_tagged_frame(frame, generation)
    }

    /// Process a frame captured under `generation`. If the session has moved
    /// on by the time decoding finishes, the result is dropped.
    pub fn process_tagged_frame(&mut self, frame: &Frame<'_>, generation: Generation) -> DecodeOutcome {
        self.stats.record_seen();

        let outcome = if self.throttle.ready() {
            self.decode_and_publish(frame, generation)
        } else {
            DecodeOutcome::Throttled
        };

        match &outcome {
            DecodeOutcome::Published(_) => self.stats.record_published(),
            DecodeOutcome::Throttled => self.stats.record_throttled(),
            DecodeOutcome::Skipped(_) => self.stats.record_skipped(),
            DecodeOutcome::Failed(_) => self.stats.record_failed(),
            DecodeOutcome::Abandoned => self.stats.record_abandoned(),
        }
        counter!("shutter_frames_total", "outcome" => outcome.label()).increment(1);

        outcome
    }

    fn decode_and_publish(&self, frame: &Frame<'_>, generation: Generation) -> DecodeOutcome {
        let started = Instant::now();

        let stage = self.stage;
        let result = panic::catch_unwind(AssertUnwindSafe(|| stage(frame, &self.condenser)))
            .unwrap_or_else(|payload| Err(DecoderError::Panicked(panic_message(payload.as_ref()))));

        let elapsed = started.elapsed();
        self.stats.record_latency(elapsed);
        histogram!("shutter_decode_seconds").record(elapsed.as_secs_f64());
        if elapsed > self.config.frame_budget() {
            warn!(
                "Frame {} decode took {:?}, over {:?} budget",
                frame.sequence,
                elapsed,
                self.config.frame_budget()
            );
        }

        if !self.session.is_current(generation) {
            debug!("Frame {} abandoned: capture session changed", frame.sequence);
            return DecodeOutcome::Abandoned;
        }

        match result {
            Ok(symbols) => {
                self.publisher.publish(&symbols);
                debug!("Frame {} decoded: {}", frame.sequence, symbols);
                DecodeOutcome::Published(symbols)
            }
            Err(e @ DecoderError::UnsupportedFormat(_)) => {
                debug!("Frame {} skipped: {}", frame.sequence, e);
                DecodeOutcome::Skipped(e)
            }
            Err(e) => {
                if matches!(e, DecoderError::Panicked(_)) {
                    error!("Frame {} decode panicked: {}", frame.sequence, e);
                } else {
                    warn!("Frame {} decode failed: {}", frame.sequence, e);
                }
                if e.surfaces_to_consumer() {
                    self.publisher.publish_error();
                }
                DecodeOutcome::Failed(e)
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
