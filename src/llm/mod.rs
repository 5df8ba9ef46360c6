//! LLM integration for Emploi Assist.
//!
//! Supports:
//! - **OpenAI**: chat-completions API
//! - **Mistral**: chat-completions API (same wire format)
//!
//! Both backends go through `OpenAiCompatProvider`, a reqwest client for the
//! shared `POST /chat/completions` format.

mod openai_compat;
pub mod provider;

pub use openai_compat::OpenAiCompatProvider;
pub use provider::*;

use std::sync::Arc;

use crate::config::LlmSettings;
use crate::error::LlmError;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const MISTRAL_BASE_URL: &str = "https://api.mistral.ai/v1";

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    OpenAi,
    Mistral,
}

/// Create an LLM provider from settings.
pub fn create_provider(settings: &LlmSettings) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let (name, default_base) = match settings.backend {
        LlmBackend::OpenAi => ("openai", OPENAI_BASE_URL),
        LlmBackend::Mistral => ("mistral", MISTRAL_BASE_URL),
    };
    let base_url = settings.base_url.as_deref().unwrap_or(default_base);

    tracing::info!("Using {} (model: {})", name, settings.model);
    Ok(Arc::new(OpenAiCompatProvider::new(
        name,
        base_url,
        settings.api_key.clone(),
        settings.model.clone(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_provider_constructs_for_both_backends() {
        // API keys are not validated at construction time; auth failures
        // happen on the first request.
        for backend in [LlmBackend::OpenAi, LlmBackend::Mistral] {
            let settings = LlmSettings {
                backend,
                api_key: secrecy::SecretString::from("test-key"),
                model: "test-model".to_string(),
                base_url: None,
            };
            let provider = create_provider(&settings).unwrap();
            assert_eq!(provider.model_name(), "test-model");
        }
    }
}
