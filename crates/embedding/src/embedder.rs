//! The embedding client the rest of the pipeline talks to.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;

use crate::api::post_embeddings;
use crate::cache::EmbeddingCache;
use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;
use crate::normalize::l2_normalize_in_place;
use crate::resilience::{retry, CircuitBreakerRegistry, RateLimiterRegistry};
use crate::stub::stub_embedding;
use crate::types::Embedding;
use crate::Result;

// Breakers and rate limiters are keyed by endpoint and shared across every
// Embedder in the process, so concurrent request handlers see one picture of
// endpoint health.
static BREAKERS: Lazy<CircuitBreakerRegistry> = Lazy::new(CircuitBreakerRegistry::default);
static RATE_LIMITERS: Lazy<RateLimiterRegistry> = Lazy::new(RateLimiterRegistry::default);

/// Client for the hosted embedding model.
#[derive(Debug, Clone)]
pub struct Embedder {
    config: Arc<EmbeddingConfig>,
    client: reqwest::Client,
    cache: Option<Arc<EmbeddingCache>>,
}

impl Embedder {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        let client = builder.build().map_err(|e| {
            EmbeddingError::InvalidConfig(format!("failed to build HTTP client: {e}"))
        })?;

        let cache = EmbeddingCache::new(config.cache_size).map(Arc::new);

        Ok(Self {
            config: Arc::new(config),
            client,
            cache,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(EmbeddingConfig::from_env()?)
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// Embed one text, consulting the cache first.
    pub async fn embed(&self, text: &str) -> Result<Embedding> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(text) {
                tracing::trace!(chars = text.len(), "embedding cache hit");
                return Ok(hit);
            }
        }

        let embedding = if self.config.mode == "stub" {
            stub_embedding(text, &self.config)
        } else {
            let texts = [text.to_string()];
            let mut vectors = self.fetch(&texts).await?;
            let vector = vectors.pop().ok_or_else(|| {
                EmbeddingError::ResponseFormat("provider returned no embeddings".into())
            })?;
            self.finish(vector)
        };

        if let Some(cache) = &self.cache {
            cache.put(text, embedding.clone());
        }
        Ok(embedding)
    }

    /// Embed a batch in one request. The provider must return exactly one
    /// vector per input; a mismatch fails the whole batch.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        if self.config.mode == "stub" {
            return Ok(texts
                .iter()
                .map(|text| stub_embedding(text, &self.config))
                .collect());
        }

        let vectors = self.fetch(texts).await?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::ResponseFormat(format!(
                "provider returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }

        let embeddings: Vec<Embedding> = vectors
            .into_iter()
            .map(|vector| self.finish(vector))
            .collect();

        if let Some(cache) = &self.cache {
            for (text, embedding) in texts.iter().zip(&embeddings) {
                cache.put(text, embedding.clone());
            }
        }
        Ok(embeddings)
    }

    /// One guarded round trip: circuit breaker, rate limit, then retry.
    async fn fetch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let cfg = &self.config;
        if !cfg.enable_resilience {
            return post_embeddings(&self.client, cfg, texts).await;
        }

        let endpoint = cfg.endpoint_key();
        let breaker =
            BREAKERS.get_or_create(&endpoint, cfg.circuit_breaker.unwrap_or_default());
        if !breaker.allow_request() {
            return Err(EmbeddingError::CircuitOpen(endpoint));
        }

        let bucket = RATE_LIMITERS.get_or_create(&endpoint, cfg.rate_limit.unwrap_or_default());
        if !bucket.acquire().await {
            return Err(EmbeddingError::RateLimited(endpoint));
        }

        let retry_cfg = cfg.retry.unwrap_or_default();
        let result = retry(&retry_cfg, |_attempt| {
            post_embeddings(&self.client, cfg, texts)
        })
        .await;

        match &result {
            Ok(_) => breaker.record_success(),
            Err(err) => {
                tracing::warn!(endpoint = %endpoint, error = %err, "embedding request failed");
                breaker.record_failure();
            }
        }
        result
    }

    fn finish(&self, mut vector: Vec<f32>) -> Embedding {
        if self.config.normalize {
            l2_normalize_in_place(&mut vector);
        }
        let dimension = vector.len();
        Embedding {
            vector,
            model: self.config.model.clone(),
            dimension,
            normalized: self.config.normalize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_embedder(dimension: usize) -> Embedder {
        Embedder::new(EmbeddingConfig {
            mode: "stub".into(),
            dimension,
            ..EmbeddingConfig::default()
        })
        .unwrap()
    }

    fn api_config(server: &mockito::Server) -> EmbeddingConfig {
        EmbeddingConfig {
            api_url: Some(format!("{}/v1/embeddings", server.url())),
            api_key: Some("test-key".into()),
            dimension: 3,
            normalize: false,
            cache_size: 0,
            enable_resilience: false,
            ..EmbeddingConfig::default()
        }
    }

    #[tokio::test]
    async fn stub_mode_is_deterministic_and_normalized() {
        let embedder = stub_embedder(32);
        let a = embedder.embed("boho dress").await.unwrap();
        let b = embedder.embed("boho dress").await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a.dimension, 32);
        assert!((a.l2_norm() - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn cache_serves_repeat_lookups() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/embeddings")
            .with_status(200)
            .with_body(r#"{"data":[{"embedding":[1.0,2.0,3.0],"index":0}]}"#)
            .expect(1)
            .create_async()
            .await;

        let embedder = Embedder::new(EmbeddingConfig {
            cache_size: 8,
            ..api_config(&server)
        })
        .unwrap();

        let first = embedder.embed("silk scarf").await.unwrap();
        let second = embedder.embed("silk scarf").await.unwrap();
        assert_eq!(first, second);
        // One request despite two lookups.
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn batch_count_mismatch_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/embeddings")
            .with_status(200)
            .with_body(r#"{"data":[{"embedding":[1.0,2.0,3.0],"index":0}]}"#)
            .create_async()
            .await;

        let embedder = Embedder::new(api_config(&server)).unwrap();
        let texts = vec!["a".to_string(), "b".to_string()];
        let err = embedder.embed_batch(&texts).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::ResponseFormat(_)));
    }

    #[tokio::test]
    async fn empty_batch_makes_no_calls() {
        let server = mockito::Server::new_async().await;
        let embedder = Embedder::new(api_config(&server)).unwrap();
        let out = embedder.embed_batch(&[]).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn transient_failures_burn_the_retry_budget() {
        let mut server = mockito::Server::new_async().await;
        // Initial attempt plus two retries.
        let mock = server
            .mock("POST", "/v1/embeddings")
            .with_status(503)
            .with_body("unavailable")
            .expect(3)
            .create_async()
            .await;

        let embedder = Embedder::new(EmbeddingConfig {
            enable_resilience: true,
            retry: Some(
                crate::resilience::RetryConfig::default()
                    .with_max_retries(2)
                    .with_base_delay(Duration::from_millis(1))
                    .with_jitter(false),
            ),
            ..api_config(&server)
        })
        .unwrap();

        let err = embedder.embed("wool coat").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Provider { status: 503, .. }));
        mock.assert_async().await;
    }
}
