//! Client construction from provider configuration

use crate::GenerationClient;
use crate::LlmConfig;
use crate::LlmProvider;
use crate::OllamaClient;
use crate::OpenAiClient;
use kgforge_core::error::Error;
use kgforge_core::error::Result;
use std::sync::Arc;
use tracing::info;

/// Create a generation client for the configured provider
pub fn create_generation_client(config: &LlmConfig) -> Result<Arc<dyn GenerationClient>> {
    config
        .validate()
        .map_err(|reason| Error::configuration(reason))?;

    info!(provider = config.provider_name(), "creating generation client");

    match config.provider {
        LlmProvider::OpenAi => Ok(Arc::new(OpenAiClient::new(config.openai.clone())?)),
        LlmProvider::Ollama => Ok(Arc::new(OllamaClient::new(config.ollama.clone())?)),
    }
}
