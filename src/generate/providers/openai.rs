//! OpenAI-compatible chat providers.
//!
//! Two tiers of the fallback chain live here. `OpenAiChatProvider` uses the
//! chat completions endpoint with a `json_schema` response format.
//! `OpenAiReasoningProvider` is the same wire call plus `reasoning_effort`,
//! which older models reject with a 400; that rejection is reported as a
//! capability mismatch so the chain keeps moving instead of surfacing it.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::super::provider::{GenerationProvider, GenerationRequest, ProviderError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

/// Shared wire call for both OpenAI tiers.
struct ChatCall {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl ChatCall {
    fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    fn api_key(&self) -> Result<String, ProviderError> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::AuthFailure(format!("{API_KEY_ENV} is not set")))
    }

    fn body(&self, request: &GenerationRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_prompt },
            ],
        });
        if let Some(schema) = &request.schema {
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "cultural_card",
                    "strict": true,
                    "schema": schema,
                },
            });
        }
        body
    }

    async fn send(&self, body: Value, request: &GenerationRequest) -> Result<String, ProviderError> {
        let api_key = self.api_key()?;
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %self.model, url = %url, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ProviderError::Unavailable(format!("API not reachable: {e}"))
                } else {
                    ProviderError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::AuthFailure(format!(
                "API rejected credentials ({status})"
            )));
        }
        if status == reqwest::StatusCode::BAD_REQUEST {
            let detail = response.text().await.unwrap_or_default();
            // Parameter rejections mean the model can't honor the request shape
            if detail.contains("reasoning_effort") || detail.contains("response_format") {
                return Err(ProviderError::CapabilityMismatch(detail.trim().to_string()));
            }
            return Err(ProviderError::Transport(format!(
                "API returned 400: {}",
                detail.trim()
            )));
        }
        if !status.is_success() {
            return Err(ProviderError::Unavailable(format!("API returned {status}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(format!("Invalid API response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ProviderError::Transport("API response had no content".to_string()))
    }
}

/// Standard chat completions tier.
pub struct OpenAiChatProvider {
    call: ChatCall,
}

impl OpenAiChatProvider {
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, model)
    }

    pub fn with_base_url(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            call: ChatCall::new(base_url, model),
        }
    }
}

#[async_trait]
impl GenerationProvider for OpenAiChatProvider {
    fn name(&self) -> &str {
        "openai-chat"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let body = self.call.body(request);
        self.call.send(body, request).await
    }
}

/// Reasoning-model tier: same endpoint with an effort hint.
pub struct OpenAiReasoningProvider {
    call: ChatCall,
    effort: String,
}

impl OpenAiReasoningProvider {
    pub fn new(model: impl Into<String>, effort: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, model, effort)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        model: impl Into<String>,
        effort: impl Into<String>,
    ) -> Self {
        Self {
            call: ChatCall::new(base_url, model),
            effort: effort.into(),
        }
    }
}

#[async_trait]
impl GenerationProvider for OpenAiReasoningProvider {
    fn name(&self) -> &str {
        "openai-reasoning"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let mut body = self.call.body(request);
        body["reasoning_effort"] = json!(self.effort);
        self.call.send(body, request).await
    }
}
