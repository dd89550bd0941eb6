use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use vitrine::PipelineDeps;

use crate::config::ServerConfig;

/// Shared application state.
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<ServerConfig>,

    /// Rate limit tracking: API key → (count, window start).
    pub rate_limiter: Arc<DashMap<String, (u32, Instant)>>,

    /// The pipeline clients every handler runs against.
    pub deps: PipelineDeps,
}

impl ServerState {
    pub fn new(config: ServerConfig, deps: PipelineDeps) -> Self {
        Self {
            config: Arc::new(config),
            rate_limiter: Arc::new(DashMap::new()),
            deps,
        }
    }

    pub fn is_valid_api_key(&self, key: &str) -> bool {
        self.config.api_keys.contains(key)
    }

    /// Fixed-window rate limit per API key.
    pub fn check_rate_limit(&self, key: &str) -> bool {
        let now = Instant::now();
        let window = Duration::from_secs(60);
        let limit = self.config.rate_limit_per_minute;

        let mut entry = self.rate_limiter.entry(key.to_string()).or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        if now.duration_since(*window_start) > window {
            *count = 0;
            *window_start = now;
        }

        if *count >= limit {
            return false;
        }

        *count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine::{
        Embedder, EmbeddingConfig, LlmClient, LlmConfig, RetrievalConfig, Retriever,
        SearchClient, SearchConfig,
    };

    fn offline_state(config: ServerConfig) -> ServerState {
        let llm = LlmClient::new(LlmConfig {
            api_key: "k".into(),
            ..LlmConfig::default()
        })
        .unwrap();
        let embedder = Embedder::new(EmbeddingConfig {
            mode: "stub".into(),
            dimension: 8,
            ..EmbeddingConfig::default()
        })
        .unwrap();
        let search = SearchClient::new(SearchConfig {
            dimension: 8,
            ..SearchConfig::default()
        })
        .unwrap();
        let retriever = Retriever::new(embedder, search, RetrievalConfig::default()).unwrap();
        ServerState::new(
            config,
            PipelineDeps {
                llm,
                retriever,
                storage: None,
            },
        )
    }

    #[test]
    fn api_key_validation() {
        let mut config = ServerConfig::default();
        config.api_keys.insert("valid-key".into());
        let state = offline_state(config);

        assert!(state.is_valid_api_key("valid-key"));
        assert!(!state.is_valid_api_key("invalid-key"));
    }

    #[test]
    fn rate_limit_counts_per_key() {
        let state = offline_state(ServerConfig {
            rate_limit_per_minute: 2,
            ..ServerConfig::default()
        });

        assert!(state.check_rate_limit("key-a"));
        assert!(state.check_rate_limit("key-a"));
        assert!(!state.check_rate_limit("key-a"));
        // Another key has its own window.
        assert!(state.check_rate_limit("key-b"));
    }
}
