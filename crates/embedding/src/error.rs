use thiserror::Error;

/// Errors surfaced by the embedding client.
#[derive(Debug, Error, Clone)]
pub enum EmbeddingError {
    /// Configuration is inconsistent (missing URL in api mode, zero dimension).
    #[error("invalid embedding config: {0}")]
    InvalidConfig(String),

    /// The request never produced a well-formed HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("provider error (status {status}): {message}")]
    Provider { status: u16, message: String },

    /// The response arrived but did not contain usable embeddings.
    #[error("unexpected response format: {0}")]
    ResponseFormat(String),

    /// The local token bucket refused the request.
    #[error("rate limit exceeded for {0}")]
    RateLimited(String),

    /// The circuit breaker is open for this endpoint.
    #[error("circuit open for {0}; endpoint temporarily unavailable")]
    CircuitOpen(String),
}

impl EmbeddingError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Transport failures and throttling/5xx statuses are transient; config,
    /// auth, and format problems are not.
    pub fn is_transient(&self) -> bool {
        match self {
            EmbeddingError::Transport(_) => true,
            EmbeddingError::Provider { status, .. } => {
                matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
            }
            EmbeddingError::InvalidConfig(_)
            | EmbeddingError::ResponseFormat(_)
            | EmbeddingError::RateLimited(_)
            | EmbeddingError::CircuitOpen(_) => false,
        }
    }
}
