//! Client for the managed, OpenSearch-compatible search engine.
//!
//! The engine owns everything hard: the HNSW k-NN index, scoring, and
//! persistence. This crate is the REST surface the pipeline needs — index
//! bootstrap with the k-NN mapping, document upserts, and vector queries.

mod client;
mod config;
mod error;

pub use client::{IndexedProduct, SearchClient, SearchHit};
pub use config::SearchConfig;
pub use error::SearchError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SearchError>;
