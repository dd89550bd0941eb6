//! Image upload presigning and captioning.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use vitrine::{caption_image, StorageClient};

use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;

fn storage(state: &ServerState) -> ServerResult<&StorageClient> {
    state
        .deps
        .storage
        .as_ref()
        .ok_or_else(|| ServerError::Config("object storage is not configured".into()))
}

/// Presign request for a direct-to-storage upload.
#[derive(Debug, Deserialize)]
pub struct PresignRequest {
    pub file_name: String,
    pub content_type: String,
}

/// Mint a presigned PUT URL; the client uploads straight to the store.
pub async fn presign_upload(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<PresignRequest>,
) -> ServerResult<impl IntoResponse> {
    if request.file_name.trim().is_empty() {
        return Err(ServerError::BadRequest("file_name must not be empty".into()));
    }
    if !request.content_type.starts_with("image/") {
        return Err(ServerError::BadRequest(format!(
            "content_type must be an image type, got {:?}",
            request.content_type
        )));
    }

    let upload = storage(&state)?.presign_upload(&request.file_name, &request.content_type);
    Ok(Json(upload))
}

/// Caption request for an already-uploaded object.
#[derive(Debug, Deserialize)]
pub struct CaptionRequest {
    pub object_key: String,
}

#[derive(Debug, Serialize)]
pub struct CaptionResponse {
    pub caption: String,
    pub processing_time_ms: u64,
}

/// Download the object and caption it with the vision model.
pub async fn caption(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<CaptionRequest>,
) -> ServerResult<impl IntoResponse> {
    if request.object_key.trim().is_empty() {
        return Err(ServerError::BadRequest(
            "object_key must not be empty".into(),
        ));
    }

    let start = Instant::now();
    let caption = caption_image(&state.deps.llm, storage(&state)?, &request.object_key).await?;

    Ok(Json(CaptionResponse {
        caption,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}
