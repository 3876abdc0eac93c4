//! Cultural card generation.
//!
//! The pipeline: `PromptBuilder` renders prompts, the `CardGenerator` walks
//! a provider fallback chain, `extract` salvages structured fields from the
//! response, and assembly defaults whatever is missing. The offline
//! provider terminates the chain, so generation only fails on an empty
//! question.

pub mod extract;
pub mod localize;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod providers;

pub use extract::{extract, Extraction, ExtractionTier, PartialInsight};
pub use orchestrator::{CardGenerator, GenerateError, GenerationPhase};
pub use prompt::{Prompt, PromptBuilder};
pub use provider::{card_schema, GenerationProvider, GenerationRequest, ProviderError};
pub use providers::{OfflineProvider, OllamaProvider, OpenAiChatProvider, OpenAiReasoningProvider};
