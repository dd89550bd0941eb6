//! Client for the hosted embedding model.
//!
//! The retrieval path turns every query term into a vector through this
//! crate, so it carries the protections the other clients skip: retry with
//! backoff, a per-endpoint circuit breaker, token-bucket rate limiting, and
//! an LRU cache over repeated texts. A deterministic stub mode keeps the
//! whole pipeline runnable offline.

mod api;
mod cache;
mod config;
mod embedder;
mod error;
mod normalize;
pub mod resilience;
mod stub;
mod types;

pub use config::EmbeddingConfig;
pub use embedder::Embedder;
pub use error::EmbeddingError;
pub use types::Embedding;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EmbeddingError>;
