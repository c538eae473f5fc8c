//! Structured-generation clients for kgforge
//!
//! The pipeline consumes one narrow capability: given a prompt and an
//! output schema, produce complete schema-conforming text or fail. The
//! clients here implement that contract over OpenAI-compatible APIs and
//! local Ollama.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

use async_trait::async_trait;
use kgforge_core::error::Result;
use serde::Deserialize;
use serde::Serialize;

mod config;
pub use config::LlmConfig;
pub use config::LlmProvider;

mod factory;
pub use factory::create_generation_client;

mod openai;
pub use openai::OpenAiClient;
pub use openai::OpenAiConfig;

mod ollama;
pub use ollama::OllamaClient;
pub use ollama::OllamaConfig;
pub use ollama::OllamaOptions;

/// System prompt shared by all generation clients
pub(crate) const SYSTEM_PROMPT: &str =
    "You are an expert at extracting structured information from documents. \
     Respond with valid JSON only, no additional text.";

/// Message role in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message (instructions)
    System,
    /// User message
    User,
    /// Assistant message
    Assistant,
}

/// A message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling parameters for a generation call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature for sampling (0.0 to 2.0)
    pub temperature: Option<f32>,
    /// Top-p sampling
    pub top_p: Option<f32>,
    /// Stop sequences
    pub stop: Option<Vec<String>>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: Some(4000),
            temperature: Some(0.7),
            top_p: Some(1.0),
            stop: None,
        }
    }
}

impl GenerationParams {
    /// Preset for extraction calls: low temperature for consistent output
    pub fn extraction() -> Self {
        Self {
            temperature: Some(0.1),
            ..Default::default()
        }
    }
}

/// The external structured-generation capability
///
/// Implementations must produce complete text conforming to
/// `output_schema` for the given prompt, or fail. Transport-level retry
/// inside a client is its own concern and is unrelated to the pipeline's
/// quality retry loop.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate schema-conforming text for the prompt
    async fn generate(&self, prompt: &str, output_schema: &serde_json::Value) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let system = Message::system("You are a helpful assistant");
        assert!(matches!(system.role, MessageRole::System));
        assert_eq!(system.content, "You are a helpful assistant");

        let user = Message::user("Hello");
        assert!(matches!(user.role, MessageRole::User));
        assert_eq!(user.content, "Hello");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn test_extraction_params_lower_temperature() {
        let params = GenerationParams::extraction();
        assert_eq!(params.temperature, Some(0.1));
        assert_eq!(params.max_tokens, GenerationParams::default().max_tokens);
    }
}
