use thiserror::Error;

/// Errors surfaced by the retrieval engine.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Configuration is inconsistent.
    #[error("invalid retrieval config: {0}")]
    InvalidConfig(String),

    /// Turning a query term into a vector failed.
    #[error("embedding failure: {0}")]
    Embedding(#[from] embedding::EmbeddingError),

    /// The search engine rejected or failed the k-NN query.
    #[error("search failure: {0}")]
    Search(#[from] search::SearchError),
}
