use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::ServerResult;
use crate::state::ServerState;

/// Global server start time for uptime calculation.
static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

/// Liveness probe: 200 while the process runs.
pub async fn health_check() -> impl IntoResponse {
    let uptime = SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(json!({
        "status": "healthy",
        "service": "vitrine-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime,
    }))
}

/// Readiness probe: reports which pipeline dependencies are configured.
///
/// Configuration presence, not reachability — probing the hosted model on
/// every readiness poll would burn quota.
pub async fn readiness_check(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let uptime = SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let storage = if state.deps.storage.is_some() {
        "configured"
    } else {
        "disabled"
    };

    Ok(Json(json!({
        "status": "ready",
        "service": "vitrine-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime,
        "components": {
            "api": "ready",
            "llm": "configured",
            "retrieval": "configured",
            "storage": storage,
        }
    })))
}
