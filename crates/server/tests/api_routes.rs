//! Route-level tests: requests go through the real router and middleware
//! stack via `oneshot`, with the upstream providers mocked.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use server::{build_router, ServerConfig, ServerState};
use vitrine::{
    Embedder, EmbeddingConfig, LlmClient, LlmConfig, PipelineDeps, RetrievalConfig, Retriever,
    SearchClient, SearchConfig, StorageClient, StorageConfig,
};

const API_KEY: &str = "test-api-key";

struct TestBackend {
    llm: mockito::Server,
    search: mockito::Server,
}

impl TestBackend {
    async fn new() -> Self {
        Self {
            llm: mockito::Server::new_async().await,
            search: mockito::Server::new_async().await,
        }
    }

    fn deps(&self, storage: Option<StorageClient>) -> PipelineDeps {
        let llm = LlmClient::new(LlmConfig {
            base_url: self.llm.url(),
            api_key: "llm-key".into(),
            ..LlmConfig::default()
        })
        .unwrap();
        let embedder = Embedder::new(EmbeddingConfig {
            mode: "stub".into(),
            dimension: 8,
            cache_size: 0,
            ..EmbeddingConfig::default()
        })
        .unwrap();
        let search = SearchClient::new(SearchConfig {
            endpoint: self.search.url(),
            index: "products".into(),
            dimension: 8,
            ..SearchConfig::default()
        })
        .unwrap();
        let retriever = Retriever::new(embedder, search, RetrievalConfig::default()).unwrap();
        PipelineDeps {
            llm,
            retriever,
            storage,
        }
    }

    fn router(&self, config: ServerConfig) -> axum::Router {
        let mut config = config;
        config.api_keys.insert(API_KEY.to_string());
        build_router(Arc::new(ServerState::new(config, self.deps(None))))
    }
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("x-api-key", API_KEY)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn chat_reply(content: &str) -> String {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

#[tokio::test]
async fn health_is_public() {
    let backend = TestBackend::new().await;
    let app = backend.router(ServerConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn protected_routes_require_an_api_key() {
    let backend = TestBackend::new().await;
    let app = backend.router(ServerConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/search")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"query":"red dress"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "AUTH_FAILED");
}

#[tokio::test]
async fn wrong_api_key_is_rejected() {
    let backend = TestBackend::new().await;
    let app = backend.router(ServerConfig::default());

    let mut request = post_json("/api/v1/search", r#"{"query":"red dress"}"#);
    request
        .headers_mut()
        .insert("x-api-key", "wrong-key".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rate_limit_kicks_in_per_key() {
    let backend = TestBackend::new().await;
    let app = backend.router(ServerConfig {
        rate_limit_per_minute: 1,
        ..ServerConfig::default()
    });

    let first = app
        .clone()
        .oneshot(post_json("/api/v1/generate", r#"{"question":"hi"}"#))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(post_json("/api/v1/generate", r#"{"question":"hi"}"#))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(second).await;
    assert_eq!(json["error"]["code"], "RATE_LIMIT_EXCEEDED");
}

#[tokio::test]
async fn search_runs_query_generation_and_retrieval() {
    let mut backend = TestBackend::new().await;
    backend
        .llm
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(chat_reply(r#"["red summer dress"]"#))
        .create_async()
        .await;
    backend
        .search
        .mock("POST", "/products/_search")
        .with_status(200)
        .with_body(
            r#"{"hits":{"hits":[{"_score":0.9,"_source":{"name":"Red Wrap Dress","description":"Flowy red wrap dress","price":"$59","image_url":"https://img/red.jpg"}}]}}"#,
        )
        .create_async()
        .await;

    let app = backend.router(ServerConfig::default());
    let response = app
        .oneshot(post_json("/api/v1/search", r#"{"query":"a dress for the beach"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["results"][0]["search_term"], "red summer dress");
    assert_eq!(json["results"][0]["hits"][0]["name"], "Red Wrap Dress");
    assert_eq!(json["results"][0]["hits"][0]["id"], "https://img/red.jpg");
}

#[tokio::test]
async fn empty_search_query_is_a_bad_request() {
    let backend = TestBackend::new().await;
    let app = backend.router(ServerConfig::default());

    let response = app
        .oneshot(post_json("/api/v1/search", r#"{"query":"   "}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn llm_outage_maps_to_bad_gateway() {
    let mut backend = TestBackend::new().await;
    backend
        .llm
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body("exploded")
        .create_async()
        .await;

    let app = backend.router(ServerConfig::default());
    let response = app
        .oneshot(post_json("/api/v1/search", r#"{"query":"red dress"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "QUERY_GENERATION_FAILED");
}

#[tokio::test]
async fn generate_without_reference_returns_the_canned_greeting() {
    let backend = TestBackend::new().await;
    // No llm mock: the canned path must not call the model.
    let app = backend.router(ServerConfig::default());

    let response = app
        .oneshot(post_json("/api/v1/generate", r#"{"question":"anyone there?"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["reply"]
        .as_str()
        .unwrap()
        .contains("shopping assistant"));
}

#[tokio::test]
async fn style_returns_a_parsed_suggestion_list() {
    let mut backend = TestBackend::new().await;
    backend
        .llm
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(chat_reply(r#"["strappy heels", "woven clutch"]"#))
        .create_async()
        .await;

    let app = backend.router(ServerConfig::default());
    let response = app
        .oneshot(post_json("/api/v1/style", r#"{"query":"red wrap dress"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["suggestions"][0], "strappy heels");
    assert_eq!(json["suggestions"][1], "woven clutch");
}

#[tokio::test]
async fn assist_requires_at_least_one_message() {
    let backend = TestBackend::new().await;
    let app = backend.router(ServerConfig::default());

    let response = app
        .oneshot(post_json("/api/v1/assist", r#"{"messages":[]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn assist_returns_the_full_outcome() {
    let mut backend = TestBackend::new().await;
    backend
        .llm
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(chat_reply("[]"))
        .create_async()
        .await;

    let app = backend.router(ServerConfig::default());
    let response = app
        .oneshot(post_json(
            "/api/v1/assist",
            r#"{"messages":[{"role":"user","content":"hello!"}]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["queries"].as_array().unwrap().is_empty());
    assert!(json["results"].as_array().unwrap().is_empty());
    assert!(json["reply"].as_str().unwrap().contains("shopping assistant"));
    assert!(json["caption"].is_null());
}

#[tokio::test]
async fn presign_without_storage_is_a_config_error() {
    let backend = TestBackend::new().await;
    let app = backend.router(ServerConfig::default());

    let response = app
        .oneshot(post_json(
            "/api/v1/uploads/presign",
            r#"{"file_name":"dress.jpg","content_type":"image/jpeg"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "CONFIG_ERROR");
}

#[tokio::test]
async fn presign_with_storage_returns_url_and_key() {
    let backend = TestBackend::new().await;
    let storage = StorageClient::new(StorageConfig {
        endpoint: "https://s3.example.com".into(),
        bucket: "vitrine-uploads".into(),
        access_key: "AKIA".into(),
        secret_key: "secret".into(),
        ..StorageConfig::default()
    })
    .unwrap();

    let mut config = ServerConfig::default();
    config.api_keys.insert(API_KEY.to_string());
    let app = build_router(Arc::new(ServerState::new(
        config,
        backend.deps(Some(storage)),
    )));

    let response = app
        .oneshot(post_json(
            "/api/v1/uploads/presign",
            r#"{"file_name":"dress.jpg","content_type":"image/jpeg"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["upload_url"]
        .as_str()
        .unwrap()
        .contains("vitrine-uploads"));
    assert!(json["key"].as_str().unwrap().starts_with("uploads/"));
    assert!(json["key"].as_str().unwrap().ends_with("-dress.jpg"));
}

#[tokio::test]
async fn presign_rejects_non_image_content_types() {
    let backend = TestBackend::new().await;
    let app = backend.router(ServerConfig::default());

    let response = app
        .oneshot(post_json(
            "/api/v1/uploads/presign",
            r#"{"file_name":"run.sh","content_type":"text/x-shellscript"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_routes_get_the_error_envelope() {
    let backend = TestBackend::new().await;
    let app = backend.router(ServerConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn responses_echo_a_request_id() {
    let backend = TestBackend::new().await;
    let app = backend.router(ServerConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "trace-me-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "trace-me-123"
    );
}
