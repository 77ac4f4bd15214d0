//! LLM integration for mail-triage.
//!
//! The pipeline talks to the backend only through the `LlmProvider` trait;
//! the shipped implementation speaks the OpenAI-compatible
//! `/chat/completions` wire format, so any compatible service works via
//! `base_url`.

pub mod openai;
pub mod provider;

pub use openai::OpenAiProvider;
pub use provider::*;

use std::sync::Arc;

use secrecy::SecretString;

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: SecretString,
    pub model: String,
    /// Override for OpenAI-compatible services; `None` uses the OpenAI API.
    pub base_url: Option<String>,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Arc<dyn LlmProvider> {
    let mut provider = OpenAiProvider::new(config.api_key.clone(), &config.model);
    if let Some(ref url) = config.base_url {
        provider = provider.with_base_url(url.clone());
    }
    tracing::info!(model = %config.model, "Using OpenAI-compatible provider");
    Arc::new(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_provider_reports_model_name() {
        // Any string is accepted as an API key at construction time; auth
        // failures happen when a request is made.
        let config = LlmConfig {
            api_key: SecretString::from("test-key"),
            model: "gpt-4o".to_string(),
            base_url: None,
        };
        let provider = create_provider(&config);
        assert_eq!(provider.model_name(), "gpt-4o");
    }

    #[test]
    fn create_provider_accepts_custom_base_url() {
        let config = LlmConfig {
            api_key: SecretString::from("test-key"),
            model: "local-model".to_string(),
            base_url: Some("http://localhost:11434/v1".to_string()),
        };
        let provider = create_provider(&config);
        assert_eq!(provider.model_name(), "local-model");
    }
}
