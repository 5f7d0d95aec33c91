//! Buildwatch server entry point.

use std::sync::Arc;
use std::time::Duration;

use http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use buildwatch::adapters::http::{api_router, AppState};
use buildwatch::adapters::jenkins::{
    JenkinsBuildLog, JenkinsClient, JenkinsConfig, JenkinsJobDirectory,
};
use buildwatch::application::streaming::{RetryPolicy, SessionRegistry, StreamSettings};
use buildwatch::config::AppConfig;
use buildwatch::ports::{JobDirectory, LogSink};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config);

    info!(
        upstream = %config.upstream.base_url,
        environment = ?config.server.environment,
        "starting buildwatch"
    );

    // Both upstream adapters share one HTTP client.
    let mut jenkins_config =
        JenkinsConfig::new(&config.upstream.base_url).with_timeout(config.upstream.timeout());
    if let (Some(username), Some(token)) = (&config.upstream.username, &config.upstream.api_token)
    {
        jenkins_config = jenkins_config.with_credentials(username, token);
    }
    let client = JenkinsClient::new(jenkins_config);
    let sink: Arc<dyn LogSink> = Arc::new(JenkinsBuildLog::new(client.clone()));
    let directory: Arc<dyn JobDirectory> = Arc::new(JenkinsJobDirectory::new(client));

    let settings = StreamSettings::default()
        .with_poll_interval(config.streaming.poll_interval())
        .with_channel_capacity(config.streaming.channel_capacity)
        .with_retry(RetryPolicy {
            max_attempts: config.streaming.retry_max_attempts,
            initial_backoff: config.streaming.retry_initial_backoff(),
            multiplier: config.streaming.retry_multiplier,
            max_backoff: config.streaming.retry_max_backoff(),
        });
    let registry = Arc::new(SessionRegistry::new(sink, settings));

    let state = AppState::new(Arc::clone(&registry), directory);
    let app = api_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&registry)))
        .await?;

    info!("server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Permissive CORS when no origins are configured (local dashboard),
/// an explicit allow list otherwise.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = config.server.allowed_origins();
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let mut allowed: Vec<HeaderValue> = Vec::with_capacity(origins.len());
    for origin in origins {
        match origin.parse::<HeaderValue>() {
            Ok(value) => allowed.push(value),
            Err(_) => warn!(origin = %origin, "ignoring unparseable CORS origin"),
        }
    }
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Resolves on Ctrl-C, after every live session has been closed. The
/// server starts draining connections once this returns, and sealed
/// sessions end their sockets promptly.
async fn shutdown_signal(registry: Arc<SessionRegistry>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => error!(error = %err, "failed to listen for shutdown signal"),
    }
    registry.shutdown().await;
}
