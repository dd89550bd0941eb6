//! Server initialization and routing.
//!
//! Builds the Axum router with its middleware stack, then runs it with
//! graceful shutdown on SIGTERM / Ctrl+C.

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use vitrine::{PipelineConfig, PipelineDeps};

use crate::config::ServerConfig;
use crate::middleware::{api_key_auth, log_requests, request_id};
use crate::routes::{api_info, assist, health, media, not_found};
use crate::state::ServerState;

/// Build the Axum router with all routes and middleware.
///
/// Public routes (`/`, `/health`, `/ready`) skip authentication; everything
/// under `/api/v1` requires an API key and counts against its rate limit.
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let public_routes = Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check));

    let protected_routes = Router::new()
        .route("/api/v1/search", post(assist::search))
        .route("/api/v1/caption", post(media::caption))
        .route("/api/v1/generate", post(assist::generate))
        .route("/api/v1/style", post(assist::style))
        .route("/api/v1/uploads/presign", post(media::presign_upload))
        .route("/api/v1/assist", post(assist::assist))
        .layer(from_fn_with_state(state.clone(), api_key_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.max_body_size()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        // request_id sits outside log_requests so the extension is set
        // before logging reads it.
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Vitrine HTTP server.
///
/// Initializes structured JSON logging, loads the pipeline config named by
/// the server config, builds every pipeline client, and serves until
/// SIGTERM or Ctrl+C.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .json()
        .init();

    let pipeline_cfg = PipelineConfig::load(&config.pipeline_config)?;
    let deps = PipelineDeps::from_config(&pipeline_cfg)?;
    let state = Arc::new(ServerState::new(config.clone(), deps));

    let app = build_router(state);
    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!(
        addr = %addr,
        api_keys = config.api_keys.len(),
        timeout_secs = config.timeout_secs,
        rate_limit_per_minute = config.rate_limit_per_minute,
        cors = config.enable_cors,
        "starting vitrine server"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
