//! API route handlers.
//!
//! - `health`: liveness and readiness probes
//! - `assist`: the chat pipeline surfaces (search, generate, style, assist)
//! - `media`: image upload presigning and captioning

pub mod assist;
pub mod health;
pub mod media;

use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::error::{ServerError, ServerResult};

/// API version and base info. Root endpoint, no authentication.
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "Vitrine",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "/api/v1/search",
            "/api/v1/caption",
            "/api/v1/generate",
            "/api/v1/style",
            "/api/v1/uploads/presign",
            "/api/v1/assist",
            "/health",
            "/ready"
        ]
    })))
}

/// Standardized 404 for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
