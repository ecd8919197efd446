//! Liveness endpoints

use crate::core::state::AppState;
use axum::extract::State;
use shared::ApiResponse;

pub async fn hello() -> ApiResponse {
    ApiResponse::success("Hello, World!")
}

pub async fn health() -> ApiResponse {
    ApiResponse::success("ok")
}

/// Prometheus text rendition of all registered counters
pub async fn metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}
