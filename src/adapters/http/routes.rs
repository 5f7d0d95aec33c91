//! Route configuration for the dashboard-facing API.

use axum::routing::get;
use axum::Router;

use super::handlers::{health, list_jobs, AppState};
use super::ws::stream_build;

/// Creates the API router with all endpoints.
///
/// Routes:
/// - `GET /api/jobs` - upstream job listing passthrough
/// - `GET /ws/logs/:job_name/:build_number` - live build log stream
/// - `GET /health` - liveness probe
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/jobs", get(list_jobs))
        .route("/ws/logs/:job_name/:build_number", get(stream_build))
        .route("/health", get(health))
        .with_state(state)
}
