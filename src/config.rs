//! YAML pipeline configuration.
//!
//! One file configures every external boundary the pipeline touches. Each
//! section deserializes into the owning crate's config type, so defaults and
//! validation live next to the client they describe; this module adds
//! cross-section checks and environment overrides for secrets.
//!
//! ## Example
//!
//! ```yaml
//! llm:
//!   base_url: "https://api.openai.com/v1"
//!   model: "gpt-4o-mini"
//!
//! embedding:
//!   mode: "api"
//!   api_url: "https://api.openai.com/v1/embeddings"
//!   model: "text-embedding-3-small"
//!   dimension: 1024
//!
//! search:
//!   endpoint: "https://search.example.com:9200"
//!   index: "products"
//!   dimension: 1024
//!
//! retrieval:
//!   top_k: 3
//!   min_score: 0.0
//!
//! storage:
//!   endpoint: "https://s3.ap-southeast-1.amazonaws.com"
//!   bucket: "vitrine-uploads"
//! ```
//!
//! API keys and store credentials come from `VITRINE_*` environment
//! variables and override anything in the file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use embedding::EmbeddingConfig;
use llm::LlmConfig;
use retrieval::RetrievalConfig;
use search::SearchConfig;
use storage::StorageConfig;

/// Errors from loading or validating the pipeline config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid pipeline config: {0}")]
    Invalid(String),
}

/// Aggregated configuration for the whole pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Omit to run without image upload/captioning.
    #[serde(default)]
    pub storage: Option<StorageConfig>,
}

impl PipelineConfig {
    /// Parse a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read and parse a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Read a YAML file, overlay environment secrets, and validate.
    ///
    /// This is the entry point binaries use; `from_file`/`from_yaml` stay
    /// override-free so tests control exactly what they parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut cfg = Self::from_file(path)?;
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Overlay secrets and endpoints from `VITRINE_*` environment variables.
    ///
    /// Credentials belong in the environment, not in a YAML file that gets
    /// committed; anything set here wins over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("VITRINE_LLM_API_KEY") {
            self.llm.api_key = key;
        }
        if let Ok(url) = std::env::var("VITRINE_LLM_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Ok(key) = std::env::var("VITRINE_EMBEDDING_API_KEY") {
            self.embedding.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("VITRINE_EMBEDDING_API_URL") {
            self.embedding.api_url = Some(url);
        }
        if let Ok(endpoint) = std::env::var("VITRINE_SEARCH_ENDPOINT") {
            self.search.endpoint = endpoint;
        }
        if let Ok(username) = std::env::var("VITRINE_SEARCH_USERNAME") {
            self.search.username = username;
        }
        if let Ok(password) = std::env::var("VITRINE_SEARCH_PASSWORD") {
            self.search.password = password;
        }
        if let Some(storage) = self.storage.as_mut() {
            if let Ok(key) = std::env::var("VITRINE_STORAGE_ACCESS_KEY") {
                storage.access_key = key;
            }
            if let Ok(key) = std::env::var("VITRINE_STORAGE_SECRET_KEY") {
                storage.secret_key = key;
            }
        }
    }

    /// Section validation plus the cross-section invariants only this level
    /// can see.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.embedding
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.search
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.retrieval
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if let Some(storage) = &self.storage {
            storage
                .validate()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }

        // A dimension mismatch would index vectors the engine cannot compare.
        if self.embedding.dimension != self.search.dimension {
            return Err(ConfigError::Invalid(format!(
                "embedding dimension {} does not match search index dimension {}",
                self.embedding.dimension, self.search.dimension
            )));
        }
        Ok(())
    }
}
