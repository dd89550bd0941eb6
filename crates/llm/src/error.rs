use thiserror::Error;

/// Errors surfaced by the chat model client.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Configuration is unusable (missing key, bad URL).
    #[error("invalid llm config: {0}")]
    InvalidConfig(String),

    /// The provider rejected our credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The provider throttled the request.
    #[error("rate limited by provider")]
    RateLimited,

    /// The provider rejected the request body.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The configured model does not exist or is not accessible.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// Any other provider-side error, with status for triage.
    #[error("provider error (status {status}): {message}")]
    Provider { status: u16, message: String },

    /// The request never got a well-formed HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response arrived but did not have the expected shape.
    #[error("unexpected response format: {0}")]
    ResponseFormat(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_carries_status() {
        let err = LlmError::Provider {
            status: 503,
            message: "overloaded".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("overloaded"));
    }
}
