//! Ollama client implementation for local inference

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::InMemoryState;
use governor::state::NotKeyed;
use governor::Quota;
use governor::RateLimiter;
use kgforge_core::error::Error;
use kgforge_core::error::Result;
use moka::future::Cache;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing::instrument;
use tracing::warn;

use crate::GenerationClient;
use crate::GenerationParams;
use crate::Message;
use crate::MessageRole;
use crate::SYSTEM_PROMPT;

/// Serde helpers for Duration
mod duration_serde {
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serialize;
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Ollama API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL (defaults to http://localhost:11434)
    pub base_url: String,
    /// Model to use (e.g., "llama3.2:latest", "mistral:latest")
    pub model: String,
    /// Request timeout
    #[serde(with = "duration_serde")]
    pub timeout: Duration,
    /// Maximum retries for transient HTTP failures
    pub max_retries: u32,
    /// Rate limit (requests per minute) - usually higher for local inference
    pub rate_limit: u32,
    /// Keep model loaded in memory
    #[serde(with = "duration_serde")]
    pub keep_alive: Duration,
    /// Additional model options
    pub options: OllamaOptions,
}

/// Ollama model options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaOptions {
    /// Temperature for sampling (0.0 to 2.0)
    pub temperature: Option<f32>,
    /// Top-p sampling
    pub top_p: Option<f32>,
    /// Number of tokens to predict
    pub num_predict: Option<u32>,
    /// Stop sequences
    pub stop: Option<Vec<String>>,
    /// Context window size
    pub num_ctx: Option<u32>,
}

impl Default for OllamaOptions {
    fn default() -> Self {
        let params = GenerationParams::extraction();
        Self {
            temperature: params.temperature,
            top_p: params.top_p,
            num_predict: params.max_tokens,
            stop: params.stop,
            num_ctx: Some(8192),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:latest".to_string(),
            timeout: Duration::from_secs(120), // Longer timeout for local inference
            max_retries: 3,
            rate_limit: 120,
            keep_alive: Duration::from_secs(600),
            options: OllamaOptions::default(),
        }
    }
}

/// Ollama API client
pub struct OllamaClient {
    config: OllamaConfig,
    client: Client,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    cache: Cache<String, String>,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                Error::generation_with_source("Failed to create HTTP client", e)
            })?;

        let rate_limit = NonZeroU32::new(config.rate_limit).ok_or_else(|| {
            Error::configuration("Rate limit must be greater than 0")
        })?;
        let quota = Quota::per_minute(rate_limit);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        // 1 hour TTL, 1000 entries
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(3600))
            .max_capacity(1000)
            .build();

        Ok(Self {
            config,
            client,
            rate_limiter,
            cache,
        })
    }

    /// Check if Ollama is running and accessible
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.config.base_url);

        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => Ok(true),
            Ok(_) => Ok(false),
            Err(_) => Ok(false),
        }
    }

    /// Make a request to the Ollama API with retries
    async fn request(&self, body: serde_json::Value) -> Result<OllamaResponse> {
        let url = format!("{}/api/chat", self.config.base_url);

        for attempt in 0..self.config.max_retries {
            self.rate_limiter.until_ready().await;

            let response = self
                .client
                .post(&url)
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|e| Error::generation_with_source("Request failed", e))?;

            match response.status() {
                StatusCode::OK => {
                    return response.json::<OllamaResponse>().await.map_err(|e| {
                        Error::generation_with_source("Failed to parse response", e)
                    });
                }
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
                _ => {
                    let error_text = response.text().await.unwrap_or_default();
                    return Err(Error::generation(format!("API error: {error_text}")));
                }
            }
        }

        Err(Error::generation("Max retries exceeded"))
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<String>,
    /// JSON schema constraining the response
    format: serde_json::Value,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    message: Option<OllamaMessage>,
}

fn to_ollama_messages(messages: &[Message]) -> Vec<OllamaMessage> {
    messages
        .iter()
        .map(|m| OllamaMessage {
            role: match m.role {
                MessageRole::System => "system",
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            }
            .to_string(),
            content: m.content.clone(),
        })
        .collect()
}

#[async_trait]
impl GenerationClient for OllamaClient {
    #[instrument(skip(self, prompt, output_schema))]
    async fn generate(&self, prompt: &str, output_schema: &serde_json::Value) -> Result<String> {
        let cache_key = format!("{}\u{1}{}", prompt, output_schema);
        if let Some(cached) = self.cache.get(&cache_key).await {
            debug!("cache hit for generation");
            return Ok(cached);
        }

        let messages = vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)];
        let keep_alive = format!("{}s", self.config.keep_alive.as_secs());

        let request = OllamaChatRequest {
            model: self.config.model.clone(),
            messages: to_ollama_messages(&messages),
            options: Some(self.config.options.clone()),
            keep_alive: Some(keep_alive),
            format: output_schema.clone(),
            stream: false,
        };

        let response = self
            .request(serde_json::to_value(request).map_err(Error::Serialization)?)
            .await?;

        let content = if let Some(message) = response.message {
            message.content
        } else {
            response.response
        };

        self.cache.insert(cache_key, content.clone()).await;
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_default() {
        let config = OllamaConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.model, "llama3.2:latest");
        assert_eq!(config.rate_limit, 120);
    }

    #[test]
    fn test_client_creation() {
        let config = OllamaConfig::default();
        let result = OllamaClient::new(config);
        assert!(result.is_ok());
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let config = OllamaConfig {
            rate_limit: 0,
            ..OllamaConfig::default()
        };
        assert!(OllamaClient::new(config).is_err());
    }

    #[test]
    fn test_chat_request_serialization() {
        let request = OllamaChatRequest {
            model: "llama3.2:latest".to_string(),
            messages: to_ollama_messages(&[Message::user("extract")]),
            options: None,
            keep_alive: None,
            format: json!({ "type": "object" }),
            stream: false,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["format"]["type"], "object");
        assert_eq!(value["messages"][0]["role"], "user");
        assert!(value.get("options").is_none());
    }
}
