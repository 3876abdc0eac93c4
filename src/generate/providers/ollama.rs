//! Ollama provider (local model server).
//!
//! First tier of the fallback chain. Talks to a local Ollama instance over
//! HTTP and passes the card schema through the `format` field, so the model
//! is constrained to structured output when the server supports it.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::super::provider::{GenerationProvider, GenerationRequest, ProviderError};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaProvider {
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, model)
    }

    pub fn with_base_url(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }
}

#[async_trait]
impl GenerationProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let mut body = json!({
            "model": self.model,
            "system": request.system_prompt,
            "prompt": request.user_prompt,
            "stream": false,
        });
        if let Some(schema) = &request.schema {
            body["format"] = schema.clone();
        }

        debug!(model = %self.model, url = %self.generate_url(), "Sending Ollama request");

        let response = self
            .client
            .post(self.generate_url())
            .json(&body)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ProviderError::Unavailable(format!("Ollama not reachable: {e}"))
                } else {
                    ProviderError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            // Model not pulled, or the endpoint doesn't exist on this server
            let detail = response.text().await.unwrap_or_default();
            return Err(ProviderError::CapabilityMismatch(format!(
                "Ollama rejected model '{}': {}",
                self.model,
                detail.trim()
            )));
        }
        if !status.is_success() {
            return Err(ProviderError::Unavailable(format!(
                "Ollama returned {status}"
            )));
        }

        let parsed: OllamaResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(format!("Invalid Ollama response: {e}")))?;

        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_url() {
        let provider = OllamaProvider::with_base_url("http://localhost:11434/", "llama3.2");
        assert_eq!(provider.generate_url(), "http://localhost:11434/api/generate");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        // Nothing listens on this port
        let provider = OllamaProvider::with_base_url("http://127.0.0.1:59999", "llama3.2");
        let request = GenerationRequest::new("sys", "user")
            .with_timeout(std::time::Duration::from_secs(2));

        let err = provider.generate(&request).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }
}
