use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Configuration for the chat model client.
///
/// Inference defaults (max tokens, temperature, top-p) apply to every chat
/// call; per-call overrides are deliberately not exposed because the pipeline
/// wants uniform, low-temperature behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    /// Base URL of the chat completions API, without the trailing path.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token. Required; the client refuses to construct without it.
    #[serde(default)]
    pub api_key: String,

    /// Model used for text chat.
    #[serde(default = "default_model")]
    pub model: String,

    /// Model used for image captioning. Defaults to the chat model.
    #[serde(default)]
    pub vision_model: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: Option<u64>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

impl LlmConfig {
    /// Load from `VITRINE_LLM_*` environment variables.
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = std::env::var("VITRINE_LLM_API_KEY")
            .map_err(|_| LlmError::InvalidConfig("VITRINE_LLM_API_KEY is not set".into()))?;

        let mut cfg = Self {
            api_key,
            ..Self::default()
        };
        if let Ok(url) = std::env::var("VITRINE_LLM_BASE_URL") {
            cfg.base_url = url;
        }
        if let Ok(model) = std::env::var("VITRINE_LLM_MODEL") {
            cfg.model = model;
        }
        if let Ok(model) = std::env::var("VITRINE_LLM_VISION_MODEL") {
            cfg.vision_model = Some(model);
        }
        if let Ok(secs) = std::env::var("VITRINE_LLM_TIMEOUT_SECS") {
            cfg.timeout_secs = secs.parse().ok();
        }
        Ok(cfg)
    }

    /// Model used for vision calls.
    pub fn vision_model(&self) -> &str {
        self.vision_model.as_deref().unwrap_or(&self.model)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            model: default_model(),
            vision_model: None,
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> Option<u64> {
    Some(30)
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_temperature() -> f32 {
    0.1
}

fn default_top_p() -> f32 {
    0.9
}
