//! Camera Control Routes

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::pipeline::CaptureCommand;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct FlipResponse {
    pub accepted: bool,
}

/// Switch cameras. Any decode already running for the old camera is dropped.
///
/// The command is queued before the session is invalidated: the capture task
/// applies queued commands before tagging a frame, so once the old session
/// ends no frame from the old camera can be tagged with the new one.
pub async fn flip(State(state): State<Arc<AppState>>) -> (StatusCode, Json<FlipResponse>) {
    match state.commands.try_send(CaptureCommand::Flip) {
        Ok(()) => {
            state.session.invalidate();
            (StatusCode::ACCEPTED, Json(FlipResponse { accepted: true }))
        }
        Err(e) => {
            warn!("Flip request dropped: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(FlipResponse { accepted: false }),
            )
        }
    }
}
