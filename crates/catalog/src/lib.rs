//! Product catalog data model.
//!
//! This crate owns the shapes that flow between the ingest tool, the search
//! index, and the retrieval pipeline: validated [`ProductRecord`]s and the
//! [`ChatTranscript`] that carries conversation context into query
//! generation.

mod config;
mod error;
mod transcript;
mod types;

pub use config::CatalogConfig;
pub use error::CatalogError;
pub use transcript::{ChatTranscript, ChatTurn, Role};
pub use types::{load_products, LoadReport, ProductRecord};
