use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::{http_client, ProviderError, SlideRequest, TextGenerator};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Minimal OpenAI Chat Completions client (single, non-streamed turn).
pub struct OpenAiClient {
    api_key: String,
    pub model: String,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            api_key,
            model,
            http: http_client(timeout)?,
        })
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0.7,
        })
    }

    pub(crate) fn parse_response(json: &serde_json::Value) -> Result<String, ProviderError> {
        json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Parse("no message content in response".to_string()))
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, request: &SlideRequest) -> Result<String, ProviderError> {
        let mut req = self
            .http
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json");
        if let Ok(project) = std::env::var("OPENAI_PROJECT") {
            if !project.is_empty() {
                debug!(%project, "adding OpenAI-Project header");
                req = req.header("OpenAI-Project", project);
            }
        }
        if let Ok(org) = std::env::var("OPENAI_ORG") {
            if !org.is_empty() {
                debug!(%org, "adding OpenAI-Organization header");
                req = req.header("OpenAI-Organization", org);
            }
        }

        debug!(model = %self.model, "OpenAI request");
        let resp = req
            .json(&self.request_body(&request.prompt))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = resp.status();
        debug!(%status, "OpenAI response");
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!("openai http {status}: {text}")));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        Self::parse_response(&json)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reads_first_choice() {
        let json = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "hello" } }]
        });
        assert_eq!(OpenAiClient::parse_response(&json).unwrap(), "hello");
    }

    #[test]
    fn parse_fails_without_content() {
        let json = serde_json::json!({ "choices": [] });
        assert!(OpenAiClient::parse_response(&json).is_err());
    }

    #[test]
    fn body_names_model() {
        let client =
            OpenAiClient::new("k".into(), "gpt-4o-mini".into(), Duration::from_secs(5)).unwrap();
        let body = client.request_body("hi");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["content"], "hi");
    }
}
