//! Concrete generation backends.

pub mod offline;
pub mod ollama;
pub mod openai;

pub use offline::OfflineProvider;
pub use ollama::OllamaProvider;
pub use openai::{OpenAiChatProvider, OpenAiReasoningProvider};
