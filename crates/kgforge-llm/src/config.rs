//! Provider configuration for structured generation

use crate::OllamaConfig;
use crate::OpenAiConfig;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

/// Supported generation providers
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI-compatible chat completions API
    OpenAi,
    /// Local Ollama models
    #[default]
    Ollama,
}

/// Generation provider configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Which provider to use
    pub provider: LlmProvider,
    /// OpenAI configuration
    pub openai: OpenAiConfig,
    /// Ollama configuration
    pub ollama: OllamaConfig,
}

impl LlmConfig {
    /// The active provider's name as a string
    pub fn provider_name(&self) -> &'static str {
        match self.provider {
            LlmProvider::OpenAi => "openai",
            LlmProvider::Ollama => "ollama",
        }
    }

    /// Whether the active provider requires an API key
    pub fn requires_api_key(&self) -> bool {
        match self.provider {
            LlmProvider::OpenAi => true,
            LlmProvider::Ollama => false,
        }
    }

    /// Update configuration from environment variables
    pub fn from_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.openai.api_key = key;
        }

        if let Ok(provider) = std::env::var("KGFORGE_LLM_PROVIDER") {
            match provider.to_lowercase().as_str() {
                "openai" => self.provider = LlmProvider::OpenAi,
                "ollama" => self.provider = LlmProvider::Ollama,
                other => warn!("Unknown LLM provider '{}', keeping {}", other, self.provider_name()),
            }
        }

        if let Ok(model) = std::env::var("KGFORGE_LLM_MODEL") {
            match self.provider {
                LlmProvider::OpenAi => self.openai.model = model,
                LlmProvider::Ollama => self.ollama.model = model,
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        match self.provider {
            LlmProvider::OpenAi => {
                if self.openai.api_key.is_empty() {
                    return Err("OpenAI API key is required".to_string());
                }
            }
            LlmProvider::Ollama => {
                // Local Ollama needs no credentials
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_config_default() {
        let config = LlmConfig::default();
        assert_eq!(config.provider, LlmProvider::Ollama);
        assert_eq!(config.provider_name(), "ollama");
        assert!(!config.requires_api_key());
    }

    #[test]
    fn test_provider_serialization() {
        let provider = LlmProvider::OpenAi;
        let json = serde_json::to_string(&provider).unwrap();
        assert_eq!(json, "\"openai\"");

        let deserialized: LlmProvider = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, LlmProvider::OpenAi);
    }

    #[test]
    fn test_config_validation() {
        let mut config = LlmConfig::default();

        // Ollama validates without an API key
        assert!(config.validate().is_ok());

        // OpenAI requires one
        config.provider = LlmProvider::OpenAi;
        assert!(config.validate().is_err());

        config.openai.api_key = "test-key".to_string();
        assert!(config.validate().is_ok());
    }
}
