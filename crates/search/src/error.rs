use thiserror::Error;

/// Errors surfaced by the search engine client.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Configuration is unusable (missing endpoint, zero dimension).
    #[error("invalid search config: {0}")]
    InvalidConfig(String),

    /// The request never got a well-formed HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The engine answered with a non-success status.
    #[error("engine error (status {status}): {body}")]
    Engine { status: u16, body: String },

    /// The response arrived but did not have the expected shape.
    #[error("unexpected response format: {0}")]
    ResponseFormat(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_carries_status_and_body() {
        let err = SearchError::Engine {
            status: 400,
            body: "mapper_parsing_exception".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("400"));
        assert!(msg.contains("mapper_parsing_exception"));
    }
}
