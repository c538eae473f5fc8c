//! OpenAI-compatible client implementation

use async_trait::async_trait;
use kgforge_core::error::Error;
use kgforge_core::error::Result;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;
use tracing::instrument;
use tracing::warn;

use crate::GenerationClient;
use crate::GenerationParams;
use crate::Message;
use crate::SYSTEM_PROMPT;

/// OpenAI API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key
    pub api_key: String,
    /// Base URL (defaults to https://api.openai.com/v1)
    pub base_url: String,
    /// Model to use (e.g., "gpt-4o", "gpt-4o-mini")
    pub model: String,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Maximum retries for transient HTTP failures
    pub max_retries: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            // Do not read env in defaults to keep tests deterministic.
            // Callers should invoke LlmConfig::from_env() explicitly.
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout: 60,
            max_retries: 3,
        }
    }
}

/// OpenAI-compatible chat-completions client
#[derive(Debug)]
pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
    params: GenerationParams,
}

impl OpenAiClient {
    /// Create a new client
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| {
                Error::generation_with_source("Failed to create HTTP client", e)
            })?;

        Ok(Self {
            client,
            config,
            params: GenerationParams::extraction(),
        })
    }

    fn request_body(&self, messages: &[Message], output_schema: &serde_json::Value) -> serde_json::Value {
        let mut body = json!({
            "model": self.config.model,
            "messages": messages,
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "extraction",
                    "schema": output_schema
                }
            }
        });

        if let Some(max_tokens) = self.params.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(temperature) = self.params.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(top_p) = self.params.top_p {
            body["top_p"] = json!(top_p);
        }
        if let Some(stop) = &self.params.stop {
            body["stop"] = json!(stop);
        }

        body
    }

    async fn make_request(&self, body: &serde_json::Value) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url);

        for attempt in 0..self.config.max_retries {
            let response = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.config.api_key))
                .header("Content-Type", "application/json")
                .json(body)
                .send()
                .await
                .map_err(|e| Error::generation_with_source("Request failed", e))?;

            match response.status() {
                StatusCode::TOO_MANY_REQUESTS => {
                    warn!("Rate limited, retrying after delay");
                    tokio::time::sleep(Duration::from_secs(2u64.pow(attempt))).await;
                }
                StatusCode::INTERNAL_SERVER_ERROR
                | StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE => {
                    warn!("Server error, retrying after delay");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
                status if status.is_success() => {
                    let response_json: serde_json::Value =
                        response.json().await.map_err(|e| {
                            Error::generation_with_source("Failed to parse response", e)
                        })?;

                    let content = response_json
                        .get("choices")
                        .and_then(|choices| choices.get(0))
                        .and_then(|choice| choice.get("message"))
                        .and_then(|message| message.get("content"))
                        .and_then(|content| content.as_str())
                        .ok_or_else(|| Error::generation("Invalid response format"))?;

                    return Ok(content.to_string());
                }
                status => {
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(Error::generation(format!(
                        "API error {status}: {error_text}"
                    )));
                }
            }
        }

        Err(Error::generation("Max retries exceeded"))
    }
}

#[async_trait]
impl GenerationClient for OpenAiClient {
    #[instrument(skip(self, prompt, output_schema))]
    async fn generate(&self, prompt: &str, output_schema: &serde_json::Value) -> Result<String> {
        debug!(model = %self.config.model, "making structured completion request");

        let messages = vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)];
        let body = self.request_body(&messages, output_schema);
        self.make_request(&body).await
    }
}
