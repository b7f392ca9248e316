//! Status and metrics probes.

use axum::Json;
use axum::extract::State;
use axum::http::Uri;

use relayhub_core::error::AppError;
use relayhub_realtime::metrics::MetricsSnapshot;

use crate::dto::StatusResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "Relay hub is running!".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.hub.status())
}

/// Fallback for unknown paths.
pub async fn not_found(uri: Uri) -> ApiError {
    AppError::not_found(format!("No route for {}", uri.path())).into()
}
