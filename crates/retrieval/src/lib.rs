//! Retrieval engine for the product search pipeline.
//!
//! One term goes through embed → k-NN → threshold filter; several terms fan
//! out concurrently with per-term grouping preserved, which is the shape the
//! chat pipeline and the search endpoint both consume.

mod config;
mod engine;
mod error;

pub use config::RetrievalConfig;
pub use engine::{summarize_for_grounding, Retriever, TermResults};
pub use error::RetrievalError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RetrievalError>;
