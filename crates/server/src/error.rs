use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use vitrine::PipelineError;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types.
///
/// Upstream dependency failures map to 502 so callers can tell "you sent
/// garbage" (4xx) from "a dependency is down" (502) from "we have a bug"
/// (500).
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("rate limit exceeded")]
    RateLimitExceeded,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("internal server error: {0}")]
    Internal(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ServerError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Pipeline(PipelineError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Pipeline(_) => StatusCode::BAD_GATEWAY,
            ServerError::Internal(_) | ServerError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ServerError::Authentication(_) => "AUTH_FAILED",
            ServerError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::NotFound => "NOT_FOUND",
            ServerError::Pipeline(PipelineError::Caption(_)) => "CAPTION_FAILED",
            ServerError::Pipeline(PipelineError::QueryGen(_)) => "QUERY_GENERATION_FAILED",
            ServerError::Pipeline(PipelineError::Retrieval(_)) => "RETRIEVAL_FAILED",
            ServerError::Pipeline(PipelineError::Generation(_)) => "GENERATION_FAILED",
            ServerError::Pipeline(PipelineError::Storage(_)) => "STORAGE_FAILED",
            ServerError::Pipeline(PipelineError::Config(_)) => "CONFIG_ERROR",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine::{LlmError, RetrievalError, SearchError};

    #[test]
    fn upstream_failures_are_bad_gateway() {
        let err = ServerError::from(PipelineError::QueryGen(LlmError::RateLimited));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.error_code(), "QUERY_GENERATION_FAILED");

        let err = ServerError::from(PipelineError::Retrieval(RetrievalError::Search(
            SearchError::Engine {
                status: 500,
                body: "boom".into(),
            },
        )));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.error_code(), "RETRIEVAL_FAILED");
    }

    #[test]
    fn config_problems_stay_internal() {
        let err = ServerError::from(PipelineError::Config("no storage".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn client_errors_keep_their_codes() {
        assert_eq!(
            ServerError::Authentication("bad key".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServerError::RateLimitExceeded.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ServerError::BadRequest("empty".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ServerError::NotFound.status_code(), StatusCode::NOT_FOUND);
    }
}
