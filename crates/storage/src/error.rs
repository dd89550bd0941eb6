use thiserror::Error;

/// Errors surfaced by the object storage client.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Configuration is unusable (missing endpoint, bucket, or credentials).
    #[error("invalid storage config: {0}")]
    InvalidConfig(String),

    /// The request never got a well-formed HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The requested object does not exist.
    #[error("object not found: {0}")]
    ObjectMissing(String),

    /// The store answered with a non-success status.
    #[error("store error (status {status}): {message}")]
    Store { status: u16, message: String },
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        StorageError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_object_names_the_key() {
        let err = StorageError::ObjectMissing("uploads/abc-dress.jpg".into());
        assert!(err.to_string().contains("uploads/abc-dress.jpg"));
    }
}
