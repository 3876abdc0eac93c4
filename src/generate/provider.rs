//! Generation provider contract.
//!
//! Providers turn a (system, user) prompt pair into raw text. Any backend
//! implementing this trait can participate in the fallback chain; the
//! orchestrator interprets every `ProviderError` as "advance to the next
//! tier".

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use crate::domain::KEY_KNOWLEDGE_LEN;

/// Errors a provider may signal. All of them advance the fallback chain;
/// none are surfaced unless the chain is exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Backend not reachable or not running
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// Credentials missing or rejected
    #[error("provider authentication failed: {0}")]
    AuthFailure(String),

    /// Network/transport failure mid-request
    #[error("provider transport error: {0}")]
    Transport(String),

    /// The backend cannot honor the request shape (e.g. no schema support)
    #[error("provider capability mismatch: {0}")]
    CapabilityMismatch(String),
}

/// One generation request, provider-agnostic.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_prompt: String,

    /// JSON schema for providers that support structured output
    pub schema: Option<Value>,

    /// Per-provider deadline
    pub timeout: Duration,
}

impl GenerationRequest {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            schema: Some(card_schema()),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A generation backend.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Human-readable provider name (used in progress phases and logs)
    fn name(&self) -> &str;

    /// Produce raw text for the request.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError>;
}

/// JSON schema for the generated card, handed to schema-capable providers.
pub fn card_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string" },
            "category": {
                "type": "string",
                "enum": crate::domain::CulturalCategory::ALL
                    .iter()
                    .map(|c| c.label())
                    .collect::<Vec<_>>()
            },
            "nameCard": { "type": "string" },
            "keyKnowledge": {
                "type": "array",
                "items": { "type": "string" },
                "minItems": KEY_KNOWLEDGE_LEN,
                "maxItems": KEY_KNOWLEDGE_LEN
            },
            "culturalInsights": { "type": "string" }
        },
        "required": ["title", "category", "nameCard", "keyKnowledge", "culturalInsights"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_schema_shape() {
        let schema = card_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["keyKnowledge"]["minItems"], 4);
        assert_eq!(
            schema["properties"]["category"]["enum"]
                .as_array()
                .unwrap()
                .len(),
            8
        );
    }

    #[test]
    fn test_request_defaults_include_schema() {
        let request = GenerationRequest::new("sys", "user");
        assert!(request.schema.is_some());
        assert_eq!(request.timeout, Duration::from_secs(60));
    }
}
