//! Text-generation backends used to draft presentation outlines.
//!
//! Every backend takes one natural-language instruction and returns free
//! text; interpreting that text is the caller's job.

pub mod gemini;
pub mod offline;
pub mod openai;

use async_trait::async_trait;
use slide_common::{ProviderKind, SlideConfig};
use std::time::Duration;

pub use gemini::GeminiClient;
pub use offline::OfflineGenerator;
pub use openai::OpenAiClient;

/// One outline request. Networked backends only send `prompt`; `topic` and
/// `num_slides` let offline backends answer without parsing the prompt.
#[derive(Debug, Clone)]
pub struct SlideRequest {
    pub prompt: String,
    pub topic: String,
    pub num_slides: usize,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send a single instruction and return the raw response text.
    async fn generate(&self, request: &SlideRequest) -> Result<String, ProviderError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Network error: {0}")]
    Network(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Missing API key: set {0}")]
    MissingApiKey(&'static str),
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::Network(e.to_string()))
}

/// Build the generator selected by `config`.
pub fn from_config(config: &SlideConfig) -> Result<Box<dyn TextGenerator>, ProviderError> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let require_key = |kind: ProviderKind| -> Result<String, ProviderError> {
        let var = kind.api_key_env_var().unwrap_or("API_KEY");
        config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ProviderError::MissingApiKey(var))
    };

    let generator: Box<dyn TextGenerator> = match config.provider {
        ProviderKind::Gemini => Box::new(GeminiClient::new(
            require_key(ProviderKind::Gemini)?,
            config.model_name().to_string(),
            timeout,
        )?),
        ProviderKind::OpenAi => Box::new(OpenAiClient::new(
            require_key(ProviderKind::OpenAi)?,
            config.model_name().to_string(),
            timeout,
        )?),
        ProviderKind::Offline => Box::new(OfflineGenerator::new()),
    };
    Ok(generator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn networked_providers_need_a_key() {
        let config = SlideConfig {
            provider: ProviderKind::Gemini,
            api_key: None,
            ..SlideConfig::default()
        };
        let err = from_config(&config).err().unwrap();
        assert!(matches!(err, ProviderError::MissingApiKey("GEMINI_API_KEY")));
    }

    #[test]
    fn offline_needs_nothing() {
        let config = SlideConfig {
            provider: ProviderKind::Offline,
            ..SlideConfig::default()
        };
        let generator = from_config(&config).unwrap();
        assert_eq!(generator.name(), "offline");
    }
}
