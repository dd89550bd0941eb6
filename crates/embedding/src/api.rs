//! Wire format for the hosted embeddings endpoint.
//!
//! Requests and responses follow the OpenAI-compatible shape:
//! `{"input": [...], "model": ...}` out, `{"data": [{"embedding": [...]}]}`
//! back. Providers that support dimension reduction also get `dimensions`.

use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    input: &'a [String],
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

/// One round trip to the embeddings endpoint. Returns vectors in input order.
pub(crate) async fn post_embeddings(
    client: &reqwest::Client,
    cfg: &EmbeddingConfig,
    texts: &[String],
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let url = cfg
        .api_url
        .as_deref()
        .ok_or_else(|| EmbeddingError::InvalidConfig("api_url is required in api mode".into()))?;

    let body = EmbeddingsRequest {
        input: texts,
        model: &cfg.model,
        dimensions: cfg.request_dimensions.then_some(cfg.dimension),
    };

    let mut request = client.post(url).json(&body);
    if let Some(key) = cfg.api_key.as_deref() {
        request = request.header("Authorization", format!("Bearer {key}"));
    }

    let response = request
        .send()
        .await
        .map_err(|e| EmbeddingError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(512)
            .collect();
        return Err(EmbeddingError::Provider {
            status: status.as_u16(),
            message,
        });
    }

    let parsed: EmbeddingsResponse = response
        .json()
        .await
        .map_err(|e| EmbeddingError::ResponseFormat(format!("invalid embeddings payload: {e}")))?;

    // Some providers return items out of order with an explicit index.
    let mut items = parsed.data;
    if items.iter().all(|item| item.index.is_some()) {
        items.sort_by_key(|item| item.index.unwrap_or(usize::MAX));
    }

    Ok(items.into_iter().map(|item| item.embedding).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_config(url: &str) -> EmbeddingConfig {
        EmbeddingConfig {
            api_url: Some(format!("{url}/v1/embeddings")),
            api_key: Some("test-key".into()),
            dimension: 3,
            ..EmbeddingConfig::default()
        }
    }

    #[tokio::test]
    async fn parses_vectors_in_input_order() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/embeddings")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_body(
                r#"{"data":[{"embedding":[0.4,0.5,0.6],"index":1},{"embedding":[0.1,0.2,0.3],"index":0}]}"#,
            )
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let cfg = api_config(&server.url());
        let texts = vec!["red dress".to_string(), "blue dress".to_string()];
        let vectors = post_embeddings(&client, &cfg, &texts).await.unwrap();

        assert_eq!(vectors[0], vec![0.1, 0.2, 0.3]);
        assert_eq!(vectors[1], vec![0.4, 0.5, 0.6]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_maps_to_provider_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/embeddings")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let cfg = api_config(&server.url());
        let err = post_embeddings(&client, &cfg, &["x".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, EmbeddingError::Provider { status: 429, .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn garbage_body_is_a_format_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/embeddings")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let cfg = api_config(&server.url());
        let err = post_embeddings(&client, &cfg, &["x".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, EmbeddingError::ResponseFormat(_)));
    }
}
