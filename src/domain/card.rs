//! Cultural insight cards and their category taxonomy.
//!
//! A card is either manually authored (legacy `content`/`type` shape) or
//! AI-generated (bilingual name card, four key-knowledge bullets, insight
//! paragraph). Both shapes live in the same struct; the optional fields
//! decode as absent for old files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of key-knowledge bullets on a generated card.
pub const KEY_KNOWLEDGE_LEN: usize = 4;

/// A single cultural insight card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CulturalCard {
    /// Unique identifier. Old files without ids get a fresh one on decode.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    /// Legacy display type (drives icon/grouping in consumers)
    #[serde(rename = "type")]
    pub card_type: CardType,

    /// Short topic title
    pub title: String,

    /// Legacy free-text body; for generated cards this mirrors
    /// `cultural_insights` for display compatibility
    pub content: String,

    /// When the card was created
    #[serde(rename = "dateAdded")]
    pub date_added: DateTime<Utc>,

    /// Category label (generated cards only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CulturalCategory>,

    /// Legacy single-line bilingual name card
    #[serde(rename = "nameCard", default, skip_serializing_if = "Option::is_none")]
    pub name_card: Option<String>,

    /// Name-card concept in the requesting user's language
    #[serde(rename = "nameCardApp", default, skip_serializing_if = "Option::is_none")]
    pub name_card_app: Option<String>,

    /// Name-card concept in the destination's local language
    #[serde(
        rename = "nameCardLocal",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub name_card_local: Option<String>,

    /// Exactly four short glyph-prefixed facts (generated cards)
    #[serde(
        rename = "keyKnowledge",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub key_knowledge: Option<Vec<String>>,

    /// Free-text insight paragraph (generated cards)
    #[serde(
        rename = "culturalInsights",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cultural_insights: Option<String>,

    /// Original user question; absent for non-voice-originated cards
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,

    /// Provenance flag
    #[serde(rename = "isAIGenerated")]
    pub is_ai_generated: bool,

    /// Destination name this card was generated for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

impl CulturalCard {
    /// Create a manually authored card (legacy shape).
    pub fn manual(card_type: CardType, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            card_type,
            title: title.into(),
            content: content.into(),
            date_added: Utc::now(),
            category: None,
            name_card: None,
            name_card_app: None,
            name_card_local: None,
            key_knowledge: None,
            cultural_insights: None,
            question: None,
            is_ai_generated: false,
            destination: None,
        }
    }

    /// Create an AI-generated card.
    ///
    /// `content` and the legacy `name_card` are filled from the structured
    /// fields so older consumers can still display the card.
    #[allow(clippy::too_many_arguments)]
    pub fn generated(
        title: impl Into<String>,
        category: CulturalCategory,
        name_card_app: Option<String>,
        name_card_local: Option<String>,
        key_knowledge: Vec<String>,
        cultural_insights: impl Into<String>,
        destination: impl Into<String>,
        question: Option<String>,
    ) -> Self {
        let cultural_insights = cultural_insights.into();
        Self {
            id: Uuid::new_v4(),
            card_type: category.card_type(),
            title: title.into(),
            content: cultural_insights.clone(),
            date_added: Utc::now(),
            category: Some(category),
            name_card: name_card_app.clone(),
            name_card_app,
            name_card_local,
            key_knowledge: Some(key_knowledge),
            cultural_insights: Some(cultural_insights),
            question,
            is_ai_generated: true,
            destination: Some(destination.into()),
        }
    }

    /// Whether the card carries the current structured shape.
    pub fn has_structured_fields(&self) -> bool {
        self.key_knowledge.is_some()
    }
}

/// Legacy display type for cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    BusinessEtiquette,
    SocialCustoms,
    DiningCulture,
    Communication,
    GiftGiving,
    QuickFacts,
}

impl CardType {
    /// Human-readable title
    pub fn title(&self) -> &'static str {
        match self {
            Self::BusinessEtiquette => "Business Etiquette",
            Self::SocialCustoms => "Social Customs",
            Self::DiningCulture => "Dining Culture",
            Self::Communication => "Communication",
            Self::GiftGiving => "Gift Giving",
            Self::QuickFacts => "Quick Facts",
        }
    }

    /// Display glyph
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::BusinessEtiquette => "💼",
            Self::SocialCustoms => "🤝",
            Self::DiningCulture => "🍽️",
            Self::Communication => "💬",
            Self::GiftGiving => "🎁",
            Self::QuickFacts => "⚡",
        }
    }
}

/// Closed category enumeration for generated cards.
///
/// Wire values are the full labels the generation schema expects, e.g.
/// `"Greeting Customs & Personal Space"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CulturalCategory {
    #[serde(rename = "Business Etiquette & Meeting Protocols")]
    BusinessEtiquette,
    #[serde(rename = "Social Customs & Relationship Building")]
    SocialCustoms,
    #[serde(rename = "Communication Styles & Non-verbal Cues")]
    Communication,
    #[serde(rename = "Gift Giving & Entertainment")]
    GiftGiving,
    #[serde(rename = "Dining Etiquette & Food Culture")]
    DiningCulture,
    #[serde(rename = "Time Management & Scheduling")]
    TimeManagement,
    #[serde(rename = "Hierarchy & Decision Making")]
    Hierarchy,
    #[serde(rename = "Greeting Customs & Personal Space")]
    GreetingCustoms,
}

impl CulturalCategory {
    /// All categories, in schema order.
    pub const ALL: [CulturalCategory; 8] = [
        Self::BusinessEtiquette,
        Self::SocialCustoms,
        Self::Communication,
        Self::GiftGiving,
        Self::DiningCulture,
        Self::TimeManagement,
        Self::Hierarchy,
        Self::GreetingCustoms,
    ];

    /// Full label as it appears on the wire.
    pub fn label(&self) -> &'static str {
        match self {
            Self::BusinessEtiquette => "Business Etiquette & Meeting Protocols",
            Self::SocialCustoms => "Social Customs & Relationship Building",
            Self::Communication => "Communication Styles & Non-verbal Cues",
            Self::GiftGiving => "Gift Giving & Entertainment",
            Self::DiningCulture => "Dining Etiquette & Food Culture",
            Self::TimeManagement => "Time Management & Scheduling",
            Self::Hierarchy => "Hierarchy & Decision Making",
            Self::GreetingCustoms => "Greeting Customs & Personal Space",
        }
    }

    /// Parse a category label. Unknown labels fall back to Social Customs;
    /// the chain must always terminate with a valid category.
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|c| c.label() == label)
            .unwrap_or(Self::SocialCustoms)
    }

    /// Display glyph
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::BusinessEtiquette => "💼",
            Self::SocialCustoms => "🤝",
            Self::Communication => "💬",
            Self::GiftGiving => "🎁",
            Self::DiningCulture => "🍽️",
            Self::TimeManagement => "⏰",
            Self::Hierarchy => "👔",
            Self::GreetingCustoms => "👋",
        }
    }

    /// Map to the legacy display type.
    pub fn card_type(&self) -> CardType {
        match self {
            Self::BusinessEtiquette | Self::Hierarchy => CardType::BusinessEtiquette,
            Self::SocialCustoms | Self::GreetingCustoms => CardType::SocialCustoms,
            Self::Communication => CardType::Communication,
            Self::GiftGiving => CardType::GiftGiving,
            Self::DiningCulture => CardType::DiningCulture,
            Self::TimeManagement => CardType::QuickFacts,
        }
    }

    /// Default name-card concept for defaulted cards.
    pub fn default_concept(&self) -> &'static str {
        match self {
            Self::BusinessEtiquette => "Protocol",
            Self::SocialCustoms => "Courtesy",
            Self::Communication => "Dialogue",
            Self::GiftGiving => "Gifting",
            Self::DiningCulture => "Dining",
            Self::TimeManagement => "Time",
            Self::Hierarchy => "Rank",
            Self::GreetingCustoms => "Respect",
        }
    }
}
