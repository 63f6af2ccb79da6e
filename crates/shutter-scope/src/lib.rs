//! Shutter Scope
//!
//! Runs the rolling-shutter decoder against a live frame source and exposes
//! the latest decoded stream over HTTP.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub mod pipeline;
pub mod routes;
pub mod settings;

use camera_capture::CameraError;
use governor::clock::Clock;
use pipeline::CaptureCommand;
use settings::{LoggingSettings, Settings};
use shutter_decoder::{
    CaptureSession, DecoderError, DecoderStats, FrameLuminanceDecoder, ResultPublisher,
    StatsSnapshot,
};

/// Host error types
#[derive(Error, Debug)]
pub enum ScopeError {
    #[error("Settings error: {0}")]
    Settings(#[from] settings::SettingsError),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Decoder error: {0}")]
    Decoder(#[from] DecoderError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state shared across handlers
pub struct AppState {
    /// Read side of the decoder's result slot
    pub publisher: Arc<ResultPublisher>,
    /// Decoder counters
    pub stats: Arc<DecoderStats>,
    /// Capture session, invalidated on camera changes
    pub session: CaptureSession,
    /// Control channel into the capture task
    pub commands: mpsc::Sender<CaptureCommand>,
    /// Prometheus exporter, when installed
    pub prometheus: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create application state around a decoder's shared handles
    pub fn new<C: Clock>(
        decoder: &FrameLuminanceDecoder<C>,
        commands: mpsc::Sender<CaptureCommand>,
        prometheus: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            publisher: decoder.publisher(),
            stats: decoder.stats(),
            session: decoder.session(),
            commands,
            prometheus,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub decoder: StatsSnapshot,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/stream", get(routes::stream::get_stream))
        .route("/api/v1/camera/flip", post(routes::camera::flip))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        decoder: state.stats.snapshot(),
    })
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.prometheus {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics exporter not installed".to_string()),
    }
}

/// Initialize logging
pub fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Install the global Prometheus recorder
pub fn install_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Metrics exporter unavailable: {}", e);
            None
        }
    }
}

/// Run capture, display, and the HTTP server until Ctrl-C
pub async fn run(settings: Settings, prometheus: Option<PrometheusHandle>) -> Result<(), ScopeError> {
    let source = pipeline::open_source(&settings)?;
    let decoder = pipeline::build_decoder(settings.decoder.clone())?;

    let (commands, command_rx) = mpsc::channel(8);
    let state = Arc::new(AppState::new(&decoder, commands.clone(), prometheus));

    let display = tokio::spawn(pipeline::run_display(
        Arc::clone(&state.publisher),
        Duration::from_millis(settings.display.refresh_interval_ms),
    ));
    let capture = tokio::spawn(pipeline::run_capture(source, decoder, command_rx));

    let app = create_router(state);
    info!("Starting API server on {}", settings.server.addr);
    let listener = tokio::net::TcpListener::bind(&settings.server.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the capture side first so no frame is mid-decode when we exit
    let _ = commands.send(CaptureCommand::Stop).await;
    if let Err(e) = capture.await {
        warn!("Capture task ended abnormally: {}", e);
    }
    display.abort();

    info!("Shutter scope stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use camera_capture::VideoFrame;
    use shutter_decoder::DecoderConfig;
    use tower::ServiceExt;

    fn test_app() -> (Router, FrameLuminanceDecoder, mpsc::Receiver<CaptureCommand>) {
        let decoder = FrameLuminanceDecoder::new(DecoderConfig::default()).unwrap();
        let (tx, rx) = mpsc::channel(1);
        let state = Arc::new(AppState::new(&decoder, tx, None));
        (create_router(state), decoder, rx)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_stream_before_first_frame() {
        let (app, _decoder, _rx) = test_app();
        let (status, body) = get_json(app, "/api/v1/stream").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["display"], "Scanning...");
        assert_eq!(body["state"], "scanning");
        assert_eq!(body["legend"]["light"], "|");
    }

    #[tokio::test]
    async fn test_stream_after_decode() {
        let (app, mut decoder, _rx) = test_app();
        let column: Vec<u8> = [0u8; 10].iter().chain([255u8; 10].iter()).copied().collect();
        let frame = VideoFrame::from_luma(1, 20, 1, &column);
        decoder.process_frame(&frame.as_frame());

        let (_, body) = get_json(app, "/api/v1/stream").await;
        assert_eq!(body["display"], ".|");
        assert_eq!(body["state"], "decoding");
        assert_eq!(body["version"], 1);
    }

    #[tokio::test]
    async fn test_health_reports_stats() {
        let (app, mut decoder, _rx) = test_app();
        let frame = VideoFrame::from_luma(2, 2, 2, &[1, 2, 3, 4]);
        decoder.process_frame(&frame.as_frame());

        let (status, body) = get_json(app, "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["decoder"]["frames_seen"], 1);
        assert_eq!(body["decoder"]["published"], 1);
    }

    #[tokio::test]
    async fn test_flip_invalidates_session() {
        let (app, decoder, mut rx) = test_app();
        let session = decoder.session();
        let before = session.current();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/camera/flip")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(!session.is_current(before));
        assert_eq!(rx.recv().await, Some(CaptureCommand::Flip));
    }

    #[tokio::test]
    async fn test_flip_rejected_when_queue_full() {
        let (app, decoder, _rx) = test_app();
        let session = decoder.session();
        let flip = || {
            Request::builder()
                .method("POST")
                .uri("/api/v1/camera/flip")
                .body(Body::empty())
                .unwrap()
        };

        let first = app.clone().oneshot(flip()).await.unwrap();
        assert_eq!(first.status(), StatusCode::ACCEPTED);
        let after_first = session.current();

        // Capacity 1 and nobody draining: the second request is turned away
        let second = app.oneshot(flip()).await.unwrap();
        assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(session.is_current(after_first));
    }

    #[tokio::test]
    async fn test_metrics_without_exporter() {
        let (app, _decoder, _rx) = test_app();
        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
