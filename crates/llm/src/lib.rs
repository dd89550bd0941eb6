//! Client for the hosted chat model.
//!
//! Everything the pipeline asks of the language model goes through here:
//! plain chat completions (query generation, grounded replies, style
//! suggestions) and vision captioning (image bytes in, description out).
//! The wire format is the OpenAI-compatible chat completions API.

mod client;
mod config;
mod error;
mod extract;

pub use client::{ChatMessage, Content, ContentPart, ImageUrl, LlmClient};
pub use config::LlmConfig;
pub use error::LlmError;
pub use extract::extract_string_list;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LlmError>;
