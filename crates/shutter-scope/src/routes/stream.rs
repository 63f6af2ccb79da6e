//! Stream Routes

use axum::{extract::State, Json};
use serde::Serialize;
use shutter_decoder::{symbol, PROCESSING_ERROR, SCANNING};
use std::sync::Arc;

use crate::AppState;

/// What the published string currently represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamState {
    Scanning,
    Decoding,
    Error,
}

/// Glyph legend for clients rendering the stream
#[derive(Debug, Serialize)]
pub struct Legend {
    pub light: char,
    pub dark: char,
}

/// Response for stream endpoint
#[derive(Debug, Serialize)]
pub struct StreamResponse {
    pub display: String,
    pub state: StreamState,
    pub version: u64,
    pub legend: Legend,
}

/// Get the latest rolling-shutter display string
pub async fn get_stream(State(state): State<Arc<AppState>>) -> Json<StreamResponse> {
    let display = state.publisher.read();
    let stream_state = match &*display {
        SCANNING => StreamState::Scanning,
        PROCESSING_ERROR => StreamState::Error,
        _ => StreamState::Decoding,
    };

    Json(StreamResponse {
        display: display.to_string(),
        state: stream_state,
        version: state.publisher.version(),
        legend: Legend {
            light: symbol::LIGHT_GLYPH,
            dark: symbol::DARK_GLYPH,
        },
    })
}
