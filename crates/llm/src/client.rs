//! Chat completions client and wire types.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::Result;

/// One message in a chat request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: Content,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: Content::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: Content::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: Content::Text(text.into()),
        }
    }

    /// A user message combining instruction text with an inline image.
    pub fn user_with_image(text: impl Into<String>, data_url: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: Content::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: data_url.into(),
                    },
                },
            ]),
        }
    }
}

/// Message content: plain text or multimodal parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: String,
    #[serde(rename = "type")]
    #[allow(dead_code)]
    error_type: Option<String>,
    code: Option<String>,
}

/// Client for the hosted chat model.
#[derive(Debug, Clone)]
pub struct LlmClient {
    config: Arc<LlmConfig>,
    client: Client,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::InvalidConfig("API key is required".into()));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        let client = builder
            .build()
            .map_err(|e| LlmError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(LlmConfig::from_env()?)
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
    }

    /// Run one chat completion and return the assistant text.
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        self.chat_with_model(&self.config.model, messages).await
    }

    /// Chat completion against an explicit model (vision calls use this).
    pub async fn chat_with_model(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        let body = ChatCompletionRequest {
            model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
        };

        tracing::debug!(model, messages = messages.len(), "chat completion request");

        let response = self.build_request(&self.chat_url()).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::parse_error(status.as_u16(), &body, model));
        }

        let text = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&text).map_err(|e| {
            LlmError::ResponseFormat(format!("invalid chat completion payload: {e}"))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::ResponseFormat("response contained no choices".into()))?;

        tracing::debug!(chars = content.len(), "chat completion response");
        Ok(content)
    }

    /// Caption an image: bytes go out as a base64 data URL content part.
    pub async fn caption_image(&self, prompt: &str, image: &[u8], mime: &str) -> Result<String> {
        if image.is_empty() {
            return Err(LlmError::InvalidRequest("image payload is empty".into()));
        }
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let data_url = format!("data:{mime};base64,{encoded}");
        let messages = [ChatMessage::user_with_image(prompt, data_url)];
        self.chat_with_model(self.config.vision_model(), &messages)
            .await
    }

    /// Map a provider error response to a typed error.
    fn parse_error(status: u16, body: &str, model: &str) -> LlmError {
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
            let message = envelope.error.message;
            return match status {
                401 | 403 => LlmError::Auth(message),
                429 => LlmError::RateLimited,
                404 => LlmError::ModelNotFound(model.to_string()),
                400 => LlmError::InvalidRequest(message),
                _ => LlmError::Provider {
                    status,
                    message: envelope.error.code.map_or(message.clone(), |code| {
                        format!("{code}: {message}")
                    }),
                },
            };
        }

        LlmError::Provider {
            status,
            message: body.chars().take(512).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_url: &str) -> LlmConfig {
        LlmConfig {
            base_url: base_url.to_string(),
            api_key: "test-key".into(),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn missing_api_key_rejected() {
        let err = LlmClient::new(LlmConfig::default()).unwrap_err();
        assert!(matches!(err, LlmError::InvalidConfig(_)));
    }

    #[test]
    fn image_message_serializes_to_parts() {
        let msg = ChatMessage::user_with_image("describe this", "data:image/jpeg;base64,AAAA");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][1]["type"], "image_url");
        assert_eq!(
            json["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,AAAA"
        );
    }

    #[test]
    fn text_message_serializes_to_string_content() {
        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(json["content"], "hi");
    }

    #[test]
    fn parse_error_maps_statuses() {
        let body = r#"{"error":{"message":"bad key","type":"invalid_request_error","code":null}}"#;
        assert!(matches!(
            LlmClient::parse_error(401, body, "m"),
            LlmError::Auth(_)
        ));
        assert!(matches!(
            LlmClient::parse_error(429, body, "m"),
            LlmError::RateLimited
        ));
        assert!(matches!(
            LlmClient::parse_error(404, body, "m"),
            LlmError::ModelNotFound(_)
        ));
        assert!(matches!(
            LlmClient::parse_error(400, body, "m"),
            LlmError::InvalidRequest(_)
        ));
    }

    #[test]
    fn parse_error_truncates_opaque_bodies() {
        let body = "x".repeat(2048);
        match LlmClient::parse_error(500, &body, "m") {
            LlmError::Provider { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message.len(), 512);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn chat_returns_assistant_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":"[\"red dress\"]"}}]}"#,
            )
            .create_async()
            .await;

        let client = LlmClient::new(test_config(&server.url())).unwrap();
        let reply = client.chat(&[ChatMessage::user("find a red dress")]).await.unwrap();
        assert_eq!(reply, r#"["red dress"]"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn chat_surfaces_rate_limits() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"slow down","type":"rate_limit_error","code":null}}"#)
            .create_async()
            .await;

        let client = LlmClient::new(test_config(&server.url())).unwrap();
        let err = client.chat(&[ChatMessage::user("hello")]).await.unwrap_err();
        assert!(matches!(err, LlmError::RateLimited));
    }

    #[tokio::test]
    async fn empty_choices_is_a_format_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let client = LlmClient::new(test_config(&server.url())).unwrap();
        let err = client.chat(&[ChatMessage::user("hello")]).await.unwrap_err();
        assert!(matches!(err, LlmError::ResponseFormat(_)));
    }
}
