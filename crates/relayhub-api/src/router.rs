//! Route definitions for the RelayHub HTTP surface.

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::status))
        .route("/metrics", get(handlers::health::metrics))
        .route("/ws/{client_id}", get(handlers::ws::ws_upgrade))
        .fallback(handlers::health::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
