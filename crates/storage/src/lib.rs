//! S3-compatible object storage for uploaded product images.
//!
//! Uploads never pass through this service: clients get a presigned PUT URL
//! and talk to the store directly. The caption flow later pulls the object
//! back down by key.

mod client;
mod config;
mod error;

pub use client::{PresignedUpload, StorageClient};
pub use config::StorageConfig;
pub use error::StorageError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StorageError>;
