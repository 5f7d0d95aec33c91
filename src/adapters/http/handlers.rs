//! HTTP handlers for the REST endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use tracing::warn;

use crate::application::streaming::SessionRegistry;
use crate::ports::JobDirectory;

use super::dto::{ErrorBody, HealthResponse, JobsResponse};

/// Shared state for every route.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub directory: Arc<dyn JobDirectory>,
}

impl AppState {
    pub fn new(registry: Arc<SessionRegistry>, directory: Arc<dyn JobDirectory>) -> Self {
        Self {
            registry,
            directory,
        }
    }
}

/// `GET /api/jobs`
///
/// Relays the upstream job listing. An unreachable upstream still answers
/// 200, with an `{"error"}` body the dashboard knows how to render.
pub async fn list_jobs(State(state): State<AppState>) -> Response {
    match state.directory.list_jobs().await {
        Ok(summaries) => Json(JobsResponse::from_summaries(summaries)).into_response(),
        Err(err) => {
            warn!(error = %err, "jobs listing failed");
            Json(ErrorBody {
                error: err.to_string(),
            })
            .into_response()
        }
    }
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "buildwatch",
        version: env!("CARGO_PKG_VERSION"),
        active_sessions: state.registry.active_count().await,
    })
}
