use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Connection and index settings for the managed search engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    /// Engine endpoint, e.g. `https://search.example.com:9200`.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Basic-auth credentials. Both empty means no auth header.
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,

    /// Index holding the product catalog.
    #[serde(default = "default_index")]
    pub index: String,

    /// Name of the k-NN vector field in the mapping.
    #[serde(default = "default_vector_field")]
    pub vector_field: String,

    /// Dimensionality of the vectors in the index. Must match the embedder.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: Option<u64>,
}

impl SearchConfig {
    /// Load from `VITRINE_SEARCH_*` environment variables.
    pub fn from_env() -> Result<Self, SearchError> {
        let mut cfg = Self::default();
        if let Ok(endpoint) = std::env::var("VITRINE_SEARCH_ENDPOINT") {
            cfg.endpoint = endpoint;
        }
        if let Ok(username) = std::env::var("VITRINE_SEARCH_USERNAME") {
            cfg.username = username;
        }
        if let Ok(password) = std::env::var("VITRINE_SEARCH_PASSWORD") {
            cfg.password = password;
        }
        if let Ok(index) = std::env::var("VITRINE_SEARCH_INDEX") {
            cfg.index = index;
        }
        if let Ok(dim) = std::env::var("VITRINE_SEARCH_DIMENSION") {
            cfg.dimension = dim
                .parse()
                .map_err(|_| SearchError::InvalidConfig("dimension must be an integer".into()))?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.endpoint.trim().is_empty() {
            return Err(SearchError::InvalidConfig("endpoint is required".into()));
        }
        if self.index.trim().is_empty() {
            return Err(SearchError::InvalidConfig("index name is required".into()));
        }
        if self.dimension == 0 {
            return Err(SearchError::InvalidConfig(
                "dimension must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn has_credentials(&self) -> bool {
        !self.username.is_empty() || !self.password.is_empty()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            username: String::new(),
            password: String::new(),
            index: default_index(),
            vector_field: default_vector_field(),
            dimension: default_dimension(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:9200".to_string()
}

fn default_index() -> String {
    "products".to_string()
}

fn default_vector_field() -> String {
    "description_vector".to_string()
}

fn default_dimension() -> usize {
    1024
}

fn default_timeout_secs() -> Option<u64> {
    Some(30)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_index_rejected() {
        let cfg = SearchConfig {
            index: "  ".into(),
            ..SearchConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(SearchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_dimension_rejected() {
        let cfg = SearchConfig {
            dimension: 0,
            ..SearchConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn credentials_detection() {
        assert!(!SearchConfig::default().has_credentials());
        let cfg = SearchConfig {
            username: "admin".into(),
            password: "secret".into(),
            ..SearchConfig::default()
        };
        assert!(cfg.has_credentials());
    }
}
