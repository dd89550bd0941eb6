//! The chat pipeline surfaces: query search, grounded generation, style
//! suggestions, and the full assist flow.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use vitrine::{
    generate_queries, grounded_reply, retrieve_results, style_suggestions, ChatTranscript,
    ChatTurn, SearchHit, NO_IMAGE_CONTEXT,
};

use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;

/// Search request: a free-text query plus optional image description.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,

    /// Caption of an already-processed image, if the client has one.
    #[serde(default)]
    pub image_context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<TermGroup>,
}

/// Hits for one generated search term.
#[derive(Debug, Serialize)]
pub struct TermGroup {
    pub search_term: String,
    pub hits: Vec<SearchHit>,
}

/// Generate search queries from the request text, then retrieve catalog
/// hits per term.
pub async fn search(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<SearchRequest>,
) -> ServerResult<impl IntoResponse> {
    if request.query.trim().is_empty() {
        return Err(ServerError::BadRequest("query must not be empty".into()));
    }

    let mut transcript = ChatTranscript::default();
    transcript.push_user(request.query);
    let image_context = request.image_context.as_deref().unwrap_or(NO_IMAGE_CONTEXT);

    let queries = generate_queries(&state.deps.llm, &transcript, image_context).await?;
    let results = retrieve_results(&state.deps.retriever, &queries).await?;

    Ok(Json(SearchResponse {
        results: results
            .into_iter()
            .map(|r| TermGroup {
                search_term: r.term,
                hits: r.hits,
            })
            .collect(),
    }))
}

/// Grounded generation request.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub question: String,

    /// Product reference JSON; empty or missing yields the canned greeting.
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub reply: String,
}

/// Answer a question grounded in the provided product reference.
pub async fn generate(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<GenerateRequest>,
) -> ServerResult<impl IntoResponse> {
    if request.question.trim().is_empty() {
        return Err(ServerError::BadRequest("question must not be empty".into()));
    }

    let reference = request.reference.as_deref().unwrap_or("");
    let reply = grounded_reply(&state.deps.llm, &request.question, reference).await?;
    Ok(Json(GenerateResponse { reply }))
}

/// Style suggestion request.
#[derive(Debug, Deserialize)]
pub struct StyleRequest {
    pub query: String,

    #[serde(default)]
    pub image_context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StyleResponse {
    pub suggestions: Vec<String>,
}

/// "Complete the look" suggestions for the described outfit.
pub async fn style(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<StyleRequest>,
) -> ServerResult<impl IntoResponse> {
    if request.query.trim().is_empty() {
        return Err(ServerError::BadRequest("query must not be empty".into()));
    }

    let mut transcript = ChatTranscript::default();
    transcript.push_user(request.query);
    let image_context = request.image_context.as_deref().unwrap_or(NO_IMAGE_CONTEXT);

    let suggestions = style_suggestions(&state.deps.llm, &transcript, image_context).await?;
    Ok(Json(StyleResponse { suggestions }))
}

/// Full assist flow request: conversation history plus an optional uploaded
/// image key.
#[derive(Debug, Deserialize)]
pub struct AssistRequest {
    pub messages: Vec<ChatTurn>,

    #[serde(default)]
    pub object_key: Option<String>,
}

/// Caption (if an image was given) → queries → retrieval → grounded reply.
pub async fn assist(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<AssistRequest>,
) -> ServerResult<impl IntoResponse> {
    if request.messages.is_empty() {
        return Err(ServerError::BadRequest(
            "messages must contain at least one turn".into(),
        ));
    }

    let transcript = ChatTranscript::new(request.messages);
    let outcome = vitrine::assist(&state.deps, &transcript, request.object_key.as_deref()).await?;
    Ok(Json(outcome))
}
