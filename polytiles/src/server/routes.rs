//! Request handlers.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::error::ApiError;
use super::state::AppState;
use crate::convert::{convert_polygons, ConvertRequest};
use crate::ndjson::{progress_to_stream, NDJSON_CONTENT_TYPE};
use crate::progress::Progress;
use crate::VERSION;

/// Path of the conversion endpoint.
pub const CONVERT_POLYGONS_PATH: &str = "/api/convert/polygons";

/// Path of the health endpoint.
pub const HEALTH_PATH: &str = "/api/health";

/// API routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(CONVERT_POLYGONS_PATH, post(convert_polygons_handler))
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: VERSION,
    })
}

// ============================================================================
// Conversion
// ============================================================================

/// Starts a conversion and streams its progress as ndjson.
///
/// Invalid requests are rejected with 400 before anything runs. Once the
/// stream has started, failures arrive as an `error` line instead.
/// If the client goes away, the conversion is aborted.
async fn convert_polygons_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConvertRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let progress = convert_polygons(&request, &state.tools, Arc::clone(&state.runner))?;

    let disconnect = CancellationToken::new();

    // Subscribe first: the adapter starts the pipeline.
    // The guard lives inside the body stream, so dropping the body cancels.
    let guard = disconnect.clone().drop_guard();
    let stream = progress_to_stream(progress.clone(), disconnect.clone()).map(move |line| {
        let _ = &guard;
        line
    });

    let finished = progress.done();
    tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = finished => {}
            _ = disconnect.cancelled() => {
                info!("Client disconnected, aborting conversion");
                progress.abort();
            }
        }
    });

    debug!(input = %request.input, output = %request.output, "Streaming conversion progress");

    Response::builder()
        .header(CONTENT_TYPE, NDJSON_CONTENT_TYPE)
        .header(CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
