//! REST client for the managed search engine.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use url::Url;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::Result;

/// Document body written to the engine for one product.
///
/// The embedding lands in the configured vector field; everything else is
/// stored source used to shape hits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedProduct {
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_url: String,
    pub embedding: Vec<f32>,
}

/// One k-NN hit, in engine score order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub score: f32,
    /// Stable product identifier (the catalog keys products by image URL).
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_score")]
    score: f32,
    #[serde(rename = "_source", default)]
    source: Map<String, Value>,
}

/// Client for the OpenSearch-compatible engine.
#[derive(Debug, Clone)]
pub struct SearchClient {
    config: Arc<SearchConfig>,
    client: Client,
    base: Url,
}

impl SearchClient {
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.validate()?;

        let base = Url::parse(&config.endpoint)
            .map_err(|e| SearchError::InvalidConfig(format!("invalid endpoint: {e}")))?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        let client = builder.build().map_err(|e| {
            SearchError::InvalidConfig(format!("failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            config: Arc::new(config),
            client,
            base,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(SearchConfig::from_env()?)
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// URL for the index itself, or a path below it. Segments are
    /// percent-encoded, so document ids containing slashes stay one segment.
    fn index_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| SearchError::InvalidConfig("endpoint cannot be a base URL".into()))?;
            path.push(&self.config.index);
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let mut request = self.client.request(method, url);
        if self.config.has_credentials() {
            request = request.basic_auth(&self.config.username, Some(&self.config.password));
        }
        request
    }

    async fn check(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body: String = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(1024)
            .collect();
        Err(SearchError::Engine {
            status: status.as_u16(),
            body,
        })
    }

    /// Create the index with the k-NN mapping if it does not exist yet.
    pub async fn ensure_index(&self) -> Result<()> {
        let url = self.index_url(&[])?;
        let response = self
            .request(reqwest::Method::HEAD, url.clone())
            .send()
            .await?;

        if response.status().is_success() {
            tracing::debug!(index = %self.config.index, "index already exists");
            return Ok(());
        }
        if response.status().as_u16() != 404 {
            self.check(response).await?;
            return Ok(());
        }

        tracing::info!(index = %self.config.index, "creating index");
        let body = self.index_mapping();
        let response = self
            .request(reqwest::Method::PUT, url)
            .json(&body)
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    /// Drop the index. Missing index is fine; ingest rebuilds call this
    /// unconditionally.
    pub async fn delete_index(&self) -> Result<()> {
        let url = self.index_url(&[])?;
        let response = self.request(reqwest::Method::DELETE, url).send().await?;
        if response.status().as_u16() == 404 {
            return Ok(());
        }
        self.check(response).await?;
        Ok(())
    }

    /// Upsert one product document under the given id.
    pub async fn index_product(&self, id: &str, product: &IndexedProduct) -> Result<()> {
        let url = self.index_url(&["_doc", id])?;
        let mut doc = json!({
            "name": product.name,
            "description": product.description,
            "price": product.price,
            "image_url": product.image_url,
        });
        doc[&self.config.vector_field] = json!(product.embedding);

        let response = self
            .request(reqwest::Method::PUT, url)
            .json(&doc)
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    /// k-NN query, results in engine score order.
    pub async fn knn_search(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        let url = self.index_url(&["_search"])?;
        let body = json!({
            "size": k,
            "query": {
                "knn": {
                    (self.config.vector_field.as_str()): {
                        "vector": vector,
                        "k": k,
                    }
                }
            }
        });

        let response = self
            .request(reqwest::Method::POST, url)
            .json(&body)
            .send()
            .await?;
        let response = self.check(response).await?;

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ResponseFormat(format!("invalid search payload: {e}")))?;

        let mut hits = Vec::with_capacity(parsed.hits.hits.len());
        for raw in parsed.hits.hits {
            match Self::shape_hit(raw) {
                Some(hit) => hits.push(hit),
                None => {
                    tracing::warn!(index = %self.config.index, "skipping hit with missing source fields");
                }
            }
        }
        Ok(hits)
    }

    fn shape_hit(raw: RawHit) -> Option<SearchHit> {
        let field = |name: &str| {
            raw.source
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Some(SearchHit {
            score: raw.score,
            id: field("image_url")?,
            name: field("name")?,
            description: field("description")?,
            price: field("price")?,
        })
    }

    /// Index settings and mapping: HNSW + cosine over the vector field, a
    /// shingle analyzer on descriptions for the engine's text scoring.
    fn index_mapping(&self) -> Value {
        json!({
            "settings": {
                "index.knn": true,
                "analysis": {
                    "analyzer": {
                        "shingle_analyzer": {
                            "type": "custom",
                            "tokenizer": "standard",
                            "filter": ["lowercase", "shingle_filter"]
                        }
                    },
                    "filter": {
                        "shingle_filter": {
                            "type": "shingle",
                            "min_shingle_size": 2,
                            "max_shingle_size": 3,
                            "output_unigrams": true
                        }
                    }
                }
            },
            "mappings": {
                "properties": {
                    "name": { "type": "text" },
                    "description": {
                        "type": "text",
                        "analyzer": "shingle_analyzer"
                    },
                    "price": { "type": "keyword" },
                    "image_url": { "type": "keyword" },
                    (self.config.vector_field.as_str()): {
                        "type": "knn_vector",
                        "dimension": self.config.dimension,
                        "method": {
                            "name": "hnsw",
                            "space_type": "cosinesimil",
                            "engine": "lucene"
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(endpoint: &str) -> SearchConfig {
        SearchConfig {
            endpoint: endpoint.to_string(),
            index: "products".into(),
            vector_field: "description_vector".into(),
            dimension: 3,
            ..SearchConfig::default()
        }
    }

    #[test]
    fn mapping_names_the_vector_field() {
        let client = SearchClient::new(test_config("http://localhost:9200")).unwrap();
        let mapping = client.index_mapping();
        let field = &mapping["mappings"]["properties"]["description_vector"];
        assert_eq!(field["type"], "knn_vector");
        assert_eq!(field["dimension"], 3);
        assert_eq!(field["method"]["space_type"], "cosinesimil");
    }

    #[tokio::test]
    async fn ensure_index_creates_when_missing() {
        let mut server = mockito::Server::new_async().await;
        let head = server
            .mock("HEAD", "/products")
            .with_status(404)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/products")
            .with_status(200)
            .with_body(r#"{"acknowledged":true}"#)
            .create_async()
            .await;

        let client = SearchClient::new(test_config(&server.url())).unwrap();
        client.ensure_index().await.unwrap();
        head.assert_async().await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn ensure_index_is_a_noop_when_present() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/products")
            .with_status(200)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/products")
            .with_status(200)
            .expect(0)
            .create_async()
            .await;

        let client = SearchClient::new(test_config(&server.url())).unwrap();
        client.ensure_index().await.unwrap();
        put.assert_async().await;
    }

    #[tokio::test]
    async fn document_ids_are_percent_encoded() {
        let mut server = mockito::Server::new_async().await;
        // Slashes are encoded so the id stays one path segment; ':' is legal
        // inside a segment and passes through.
        let put = server
            .mock("PUT", "/products/_doc/https:%2F%2Fimg%2Fdress.jpg")
            .with_status(201)
            .with_body(r#"{"result":"created"}"#)
            .create_async()
            .await;

        let client = SearchClient::new(test_config(&server.url())).unwrap();
        let product = IndexedProduct {
            name: "Slip Dress".into(),
            description: "Satin slip dress".into(),
            price: "$79".into(),
            image_url: "https://img/dress.jpg".into(),
            embedding: vec![0.1, 0.2, 0.3],
        };
        client
            .index_product("https://img/dress.jpg", &product)
            .await
            .unwrap();
        put.assert_async().await;
    }

    #[tokio::test]
    async fn knn_search_shapes_hits_and_skips_partial_sources() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/products/_search")
            .with_status(200)
            .with_body(
                r#"{
                  "hits": {
                    "hits": [
                      {"_score": 0.92, "_source": {"name": "Slip Dress", "description": "Satin slip dress", "price": "$79", "image_url": "https://img/slip.jpg"}},
                      {"_score": 0.41, "_source": {"name": "No image url", "description": "Broken doc", "price": "$1"}}
                    ]
                  }
                }"#,
            )
            .create_async()
            .await;

        let client = SearchClient::new(test_config(&server.url())).unwrap();
        let hits = client.knn_search(&[0.1, 0.2, 0.3], 3).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "https://img/slip.jpg");
        assert!((hits[0].score - 0.92).abs() < 1e-6);
    }

    #[tokio::test]
    async fn engine_failures_carry_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/products/_search")
            .with_status(500)
            .with_body("search_phase_execution_exception")
            .create_async()
            .await;

        let client = SearchClient::new(test_config(&server.url())).unwrap();
        let err = client.knn_search(&[0.1, 0.2, 0.3], 3).await.unwrap_err();
        match err {
            SearchError::Engine { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("search_phase"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn delete_tolerates_missing_index() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/products")
            .with_status(404)
            .with_body(r#"{"error":"index_not_found_exception"}"#)
            .create_async()
            .await;

        let client = SearchClient::new(test_config(&server.url())).unwrap();
        client.delete_index().await.unwrap();
    }

    #[tokio::test]
    async fn basic_auth_is_sent_when_configured() {
        let mut server = mockito::Server::new_async().await;
        // "admin:secret" base64-encoded.
        let head = server
            .mock("HEAD", "/products")
            .match_header("authorization", "Basic YWRtaW46c2VjcmV0")
            .with_status(200)
            .create_async()
            .await;

        let client = SearchClient::new(SearchConfig {
            username: "admin".into(),
            password: "secret".into(),
            ..test_config(&server.url())
        })
        .unwrap();
        client.ensure_index().await.unwrap();
        head.assert_async().await;
    }
}
