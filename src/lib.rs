//! lancards - voice-to-cultural-insight card generator
//!
//! Turns a spoken (or typed) question about a travel destination into a
//! structured cultural insight card and stores it per destination.
//!
//! # Architecture
//!
//! The system is a three-stage pipeline:
//! - Capture: live transcription state machine over pluggable audio
//!   sources and speech recognizers
//! - Generate: provider fallback chain (Ollama, OpenAI, offline) with
//!   layered extraction of the model response
//! - Store: a JSON document of destinations and cards with atomic saves
//!   and legacy-card migration
//!
//! # Modules
//!
//! - `capture`: recording session, audio levels, recognizer seam, whisper
//! - `generate`: prompts, providers, extraction, orchestrator
//! - `store`: persistent destination store and migration
//! - `domain`: data structures (Destination, CulturalCard, categories)
//! - `cli`: command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Ask a question and save the card
//! lancards ask Japan how do I greet business partners
//!
//! # From a recorded voice memo
//! lancards ask Japan --audio memo.m4a
//!
//! # Browse
//! lancards list Japan
//! ```

pub mod capture;
pub mod cli;
pub mod config;
pub mod domain;
pub mod generate;
pub mod store;

// Re-export main types at crate root for convenience
pub use capture::{CaptureError, Permissions, TranscriptionSession, TranscriptionState};
pub use domain::{CardType, CulturalCard, CulturalCategory, Destination};
pub use generate::{CardGenerator, GenerateError, GenerationPhase, GenerationProvider};
pub use store::{ContentStore, StoreError, ValidationReport};
