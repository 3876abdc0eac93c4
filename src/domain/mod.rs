//! Domain types for lancards.
//!
//! This module contains the core data structures:
//! - Destination: a country/city with its ordered card collection
//! - CulturalCard: one insight, legacy or AI-generated shape
//! - CardType / CulturalCategory: closed taxonomies

pub mod card;
pub mod destination;

// Re-export commonly used types
pub use card::{CardType, CulturalCard, CulturalCategory, KEY_KNOWLEDGE_LEN};
pub use destination::Destination;
