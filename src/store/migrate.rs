//! Migration of legacy cards to the structured shape.
//!
//! Legacy cards only carry `type`, `title`, `content`. Migration infers a
//! category from the display type, derives a bilingual name card, and
//! segments the body into four bullets, leaving the legacy fields
//! untouched so old consumers keep working. Presence of `key_knowledge`
//! marks a card as already migrated, which makes the pass idempotent.

use crate::domain::{CardType, CulturalCard, CulturalCategory, KEY_KNOWLEDGE_LEN};
use crate::generate::localize;

const FILLER_BULLETS: [&str; KEY_KNOWLEDGE_LEN] = [
    "📚 Research local customs before important interactions",
    "🤝 Show genuine interest in cultural traditions",
    "🚫 Don't make assumptions based on stereotypes",
    "👀 Pay attention to non-verbal communication",
];

/// Category a legacy display type maps to.
fn category_of(card_type: CardType) -> CulturalCategory {
    match card_type {
        CardType::BusinessEtiquette => CulturalCategory::BusinessEtiquette,
        CardType::SocialCustoms => CulturalCategory::SocialCustoms,
        CardType::DiningCulture => CulturalCategory::DiningCulture,
        CardType::Communication => CulturalCategory::Communication,
        CardType::GiftGiving => CulturalCategory::GiftGiving,
        CardType::QuickFacts => CulturalCategory::TimeManagement,
    }
}

/// Name-card concept inferred from title keywords, falling back to the
/// category default.
fn concept_of(title: &str, category: CulturalCategory) -> &'static str {
    let title = title.to_lowercase();
    if title.contains("punctual") || title.contains("time") {
        "Time"
    } else if title.contains("greet") || title.contains("bow") {
        "Respect"
    } else if title.contains("din") || title.contains("food") || title.contains("table") {
        "Dining"
    } else if title.contains("gift") {
        "Gifting"
    } else if title.contains("hierarch") || title.contains("rank") {
        "Rank"
    } else if title.contains("communicat") || title.contains("conversation") {
        "Dialogue"
    } else if title.contains("meeting") || title.contains("card") {
        "Protocol"
    } else {
        category.default_concept()
    }
}

/// Segment free text into exactly `KEY_KNOWLEDGE_LEN` glyph-prefixed
/// bullets, padding with generic ones.
fn bullets_of(content: &str, glyph: &str) -> Vec<String> {
    let mut bullets: Vec<String> = content
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(KEY_KNOWLEDGE_LEN)
        .map(|sentence| format!("{glyph} {sentence}"))
        .collect();

    for filler in FILLER_BULLETS.iter().skip(bullets.len()) {
        bullets.push(filler.to_string());
    }
    bullets
}

/// Migrate one card in place. Returns whether the card changed.
pub fn migrate_card(card: &mut CulturalCard, country: &str) -> bool {
    if card.has_structured_fields() {
        return false;
    }

    let category = card.category.unwrap_or_else(|| category_of(card.card_type));
    let concept = concept_of(&card.title, category);

    card.category = Some(category);
    card.name_card_app = Some(concept.to_string());
    card.name_card_local = localize::local_name(concept, country).map(str::to_string);
    if card.name_card.is_none() {
        card.name_card = Some(concept.to_string());
    }
    card.key_knowledge = Some(bullets_of(&card.content, category.emoji()));
    if card.cultural_insights.is_none() {
        card.cultural_insights = Some(card.content.clone());
    }
    true
}

/// Migrate every legacy card of a destination. Returns how many changed.
pub fn migrate_destination(destination: &mut crate::domain::Destination) -> usize {
    let country = destination.country.clone();
    let mut changed = 0;
    for card in destination.cultural_cards.iter_mut() {
        if migrate_card(card, &country) {
            changed += 1;
        }
    }
    changed
}
