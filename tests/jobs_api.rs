//! Integration tests for the REST endpoints.
//!
//! These drive the real router with `tower::ServiceExt::oneshot` over the
//! in-memory adapters, asserting the wire shapes the dashboard consumes.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use buildwatch::adapters::http::{api_router, AppState};
use buildwatch::adapters::memory::{InMemoryBuildLog, InMemoryJobDirectory};
use buildwatch::application::streaming::{SessionRegistry, StreamSettings};
use buildwatch::domain::foundation::BuildNumber;
use buildwatch::ports::{BuildSummary, JobDirectory, JobSummary, LogSink};

// =============================================================================
// Test Infrastructure
// =============================================================================

static TRACING: Lazy<()> = Lazy::new(|| {
    tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init()
        .ok();
});

struct TestApp {
    router: axum::Router,
    directory: Arc<InMemoryJobDirectory>,
}

fn test_app() -> TestApp {
    Lazy::force(&TRACING);
    let sink = Arc::new(InMemoryBuildLog::new());
    let registry = Arc::new(SessionRegistry::new(
        sink as Arc<dyn LogSink>,
        StreamSettings::default(),
    ));
    let directory = Arc::new(InMemoryJobDirectory::new());
    let state = AppState::new(registry, Arc::clone(&directory) as Arc<dyn JobDirectory>);
    TestApp {
        router: api_router(state),
        directory,
    }
}

async fn get_json(router: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn jobs_listing_relays_the_upstream_schema() {
    let app = test_app();
    app.directory
        .push_job(JobSummary {
            name: "web".to_string(),
            url: Some("https://ci.example.com/job/web/".to_string()),
            color: Some("blue".to_string()),
            last_build: Some(BuildSummary {
                number: BuildNumber::new(42),
                url: Some("https://ci.example.com/job/web/42/".to_string()),
            }),
        })
        .await;

    let (status, body) = get_json(app.router, "/api/jobs").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["jobs"][0]["name"], "web");
    assert_eq!(body["jobs"][0]["color"], "blue");
    assert_eq!(body["jobs"][0]["lastBuild"]["number"], 42);
    assert_eq!(
        body["jobs"][0]["lastBuild"]["url"],
        "https://ci.example.com/job/web/42/"
    );
}

#[tokio::test]
async fn jobs_without_color_come_back_grey() {
    let app = test_app();
    app.directory
        .push_job(JobSummary {
            name: "nightly".to_string(),
            url: None,
            color: None,
            last_build: None,
        })
        .await;

    let (status, body) = get_json(app.router, "/api/jobs").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["jobs"][0]["color"], "grey");
    assert!(body["jobs"][0]["lastBuild"].is_null());
}

#[tokio::test]
async fn unreachable_upstream_still_answers_200_with_an_error_body() {
    let app = test_app();
    app.directory.set_unavailable("connection refused").await;

    let (status, body) = get_json(app.router, "/api/jobs").await;

    assert_eq!(status, StatusCode::OK);
    let message = body["error"].as_str().expect("missing error field");
    assert!(message.contains("connection refused"));
    assert!(body.get("jobs").is_none());
}

#[tokio::test]
async fn empty_directory_lists_no_jobs() {
    let app = test_app();

    let (status, body) = get_json(app.router, "/api/jobs").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["jobs"], serde_json::json!([]));
}

#[tokio::test]
async fn health_reports_the_service_and_session_count() {
    let app = test_app();

    let (status, body) = get_json(app.router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "buildwatch");
    assert_eq!(body["active_sessions"], 0);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn log_stream_route_is_mounted() {
    let app = test_app();

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/ws/logs/web/42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Without upgrade headers the websocket extractor rejects the
    // request, which proves the route exists.
    assert_ne!(response.status(), StatusCode::NOT_FOUND);
}
