use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;
use crate::resilience::{CircuitBreakerConfig, RateLimitConfig, RetryConfig};

/// Runtime configuration for the embedding client.
///
/// Two modes exist: `"api"` calls the hosted embedding endpoint; `"stub"`
/// produces deterministic hash-derived vectors and is meant for tests and
/// offline development, where it keeps the whole retrieval pipeline runnable
/// without credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// `"api"` (remote HTTP) or `"stub"` (deterministic local vectors).
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Embeddings endpoint URL when mode is `"api"`, e.g.
    /// `https://api.openai.com/v1/embeddings`.
    #[serde(default)]
    pub api_url: Option<String>,

    /// Bearer token for the embeddings endpoint.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Expected vector dimensionality.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Ask the provider to reduce output to `dimension` (OpenAI-style
    /// `dimensions` request field). Leave off for providers that reject it.
    #[serde(default)]
    pub request_dimensions: bool,

    /// Normalize vectors to unit length (recommended for cosine k-NN).
    #[serde(default = "default_true")]
    pub normalize: bool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: Option<u64>,

    /// Entries held in the in-process text → vector cache. Zero disables it.
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,

    /// Whether retry, circuit breaking, and rate limiting are applied.
    #[serde(default = "default_true")]
    pub enable_resilience: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_breaker: Option<CircuitBreakerConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitConfig>,
}

impl EmbeddingConfig {
    /// Load from `VITRINE_EMBEDDING_*` environment variables.
    pub fn from_env() -> Result<Self, EmbeddingError> {
        let mut cfg = Self::default();
        if let Ok(mode) = std::env::var("VITRINE_EMBEDDING_MODE") {
            cfg.mode = mode;
        }
        if let Ok(url) = std::env::var("VITRINE_EMBEDDING_API_URL") {
            cfg.api_url = Some(url);
        }
        if let Ok(key) = std::env::var("VITRINE_EMBEDDING_API_KEY") {
            cfg.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("VITRINE_EMBEDDING_MODEL") {
            cfg.model = model;
        }
        if let Ok(dim) = std::env::var("VITRINE_EMBEDDING_DIMENSION") {
            cfg.dimension = dim
                .parse()
                .map_err(|_| EmbeddingError::InvalidConfig("dimension must be an integer".into()))?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), EmbeddingError> {
        match self.mode.as_str() {
            "api" => {
                if self.api_url.is_none() {
                    return Err(EmbeddingError::InvalidConfig(
                        "api_url is required when mode is \"api\"".into(),
                    ));
                }
            }
            "stub" => {}
            other => {
                return Err(EmbeddingError::InvalidConfig(format!(
                    "mode must be \"api\" or \"stub\", got {other:?}"
                )))
            }
        }
        if self.dimension == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "dimension must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Stable key for the per-endpoint breaker and rate limiter.
    pub(crate) fn endpoint_key(&self) -> String {
        self.api_url
            .as_deref()
            .unwrap_or("stub")
            .to_ascii_lowercase()
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            api_url: None,
            api_key: None,
            model: default_model(),
            dimension: default_dimension(),
            request_dimensions: false,
            normalize: default_true(),
            timeout_secs: default_timeout_secs(),
            cache_size: default_cache_size(),
            enable_resilience: default_true(),
            retry: None,
            circuit_breaker: None,
            rate_limit: None,
        }
    }
}

fn default_mode() -> String {
    "api".to_string()
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_dimension() -> usize {
    1024
}

fn default_timeout_secs() -> Option<u64> {
    Some(30)
}

fn default_cache_size() -> usize {
    1024
}

fn default_true() -> bool {
    true
}
