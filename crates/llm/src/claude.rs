//! Claude generation backend
//!
//! Non-streaming Anthropic Messages API client. One request per
//! question; the composed prompt travels as a single user message.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use shop_assistant_core::{GenerationOptions, GenerationProvider, Result};

use crate::LlmError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Configuration for the Claude backend
#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    /// API key (from ANTHROPIC_API_KEY or config)
    pub api_key: String,
    /// Model id, e.g. "claude-3-5-sonnet-latest"
    pub model: String,
    /// API endpoint (overridable for testing or a proxy)
    pub endpoint: String,
    /// Client-level request timeout
    pub timeout: Duration,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            model: shop_assistant_config::constants::generation::DEFAULT_MODEL.to_string(),
            endpoint: shop_assistant_config::constants::endpoints::ANTHROPIC_DEFAULT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClaudeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Anthropic Messages API backend
pub struct ClaudeBackend {
    config: ClaudeConfig,
    client: Client,
}

impl ClaudeBackend {
    pub fn new(config: ClaudeConfig) -> std::result::Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::Configuration(
                "ANTHROPIC_API_KEY not set. Set it via environment or config.".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    async fn generate_raw(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> std::result::Result<String, LlmError> {
        let request = ClaudeRequest {
            model: self.config.model.clone(),
            max_tokens: options.max_tokens,
            messages: vec![ClaudeMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: Some(options.temperature),
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.endpoint))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let response: ClaudeApiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let mut text = String::new();
        for block in response.content {
            let ClaudeContentBlock::Text { text: t } = block;
            text.push_str(&t);
        }

        if text.trim().is_empty() {
            return Err(LlmError::InvalidResponse(
                "response contained no text content".to_string(),
            ));
        }

        tracing::debug!(
            model = %self.config.model,
            output_tokens = response.usage.output_tokens,
            "generation complete"
        );

        Ok(text)
    }
}

#[async_trait]
impl GenerationProvider for ClaudeBackend {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        self.generate_raw(prompt, options)
            .await
            .map_err(shop_assistant_core::Error::from)
    }

    fn name(&self) -> &str {
        "claude"
    }
}

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: usize,
    messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeApiResponse {
    content: Vec<ClaudeContentBlock>,
    usage: ClaudeUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeContentBlock {
    Text { text: String },
}

#[derive(Debug, Deserialize)]
struct ClaudeUsage {
    #[allow(dead_code)]
    input_tokens: usize,
    output_tokens: usize,
}
