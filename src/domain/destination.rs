//! Destinations and the canned sample set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::card::{CardType, CulturalCard, CulturalCategory};

/// A travel destination with its collection of cultural cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    /// Unique identifier, immutable once created. Old files without ids
    /// get a fresh one on decode.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Flag or emblem glyph
    pub flag: String,

    /// Country key used for localization tables and generation context.
    /// Older files lack this field; it is backfilled from `name` on decode.
    #[serde(default)]
    pub country: String,

    /// Ordered card collection
    #[serde(rename = "culturalCards")]
    pub cultural_cards: Vec<CulturalCard>,

    #[serde(rename = "dateAdded")]
    pub date_added: DateTime<Utc>,

    /// Refreshed on every card add/remove
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
}

impl Destination {
    /// Create an empty destination. `country` defaults to `name`.
    pub fn new(
        name: impl Into<String>,
        flag: impl Into<String>,
        country: Option<String>,
    ) -> Self {
        let name = name.into();
        let country = country.unwrap_or_else(|| name.clone());
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            flag: flag.into(),
            country,
            cultural_cards: Vec::new(),
            date_added: now,
            last_updated: now,
        }
    }

    /// Append a card and refresh `last_updated`.
    pub fn add_card(&mut self, card: CulturalCard) {
        self.cultural_cards.push(card);
        self.last_updated = Utc::now();
    }

    /// Remove a card by id and refresh `last_updated`. Returns the removed
    /// card, or None if no card matched.
    pub fn remove_card(&mut self, card_id: Uuid) -> Option<CulturalCard> {
        let pos = self.cultural_cards.iter().position(|c| c.id == card_id)?;
        let card = self.cultural_cards.remove(pos);
        self.last_updated = Utc::now();
        Some(card)
    }

    /// Replace a card by id, keeping its position. Refreshes `last_updated`
    /// on success. Used when a regeneration supersedes an earlier card.
    pub fn replace_card(&mut self, card_id: Uuid, replacement: CulturalCard) -> bool {
        match self.cultural_cards.iter_mut().find(|c| c.id == card_id) {
            Some(slot) => {
                *slot = replacement;
                self.last_updated = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Backfill `country` from `name` for pre-country files.
    pub(crate) fn normalize(&mut self) {
        if self.country.is_empty() {
            self.country = self.name.clone();
        }
    }

    /// Canned first-run sample set.
    pub fn sample_data() -> Vec<Destination> {
        let mut japan = Destination::new("Japan", "🇯🇵", Some("Japan".to_string()));
        japan.add_card(CulturalCard::generated(
            "Business Card Exchange",
            CulturalCategory::BusinessEtiquette,
            Some("Protocol".to_string()),
            Some("礼儀".to_string()),
            vec![
                "👥 Present and receive business cards with both hands".to_string(),
                "👀 Take time to read the card before putting it away".to_string(),
                "✍️ Never write on someone's business card in their presence".to_string(),
                "🙏 Show respect for the person's identity and position".to_string(),
            ],
            "Business card exchange in Japan is a formal ritual that reflects respect \
             and hierarchy awareness. The card represents the person's identity and \
             status, so treating it with care demonstrates your understanding of \
             Japanese business culture and attention to proper etiquette.",
            "Japan",
            None,
        ));
        japan.add_card(CulturalCard::generated(
            "Bowing Etiquette",
            CulturalCategory::GreetingCustoms,
            Some("Respect".to_string()),
            Some("尊敬".to_string()),
            vec![
                "🙇 Bowing depth reflects hierarchy and respect levels".to_string(),
                "👴 Wait for the senior person to initiate the greeting".to_string(),
                "⏱️ Hold the bow for an appropriate duration".to_string(),
                "🤝 Some situations may combine bowing with handshakes".to_string(),
            ],
            "Bowing remains an important part of Japanese business culture, especially \
             in formal situations. The depth and duration of your bow should reflect \
             the status of the person you're greeting. A slight bow of the head is \
             appropriate for foreigners, but understanding the nuances shows cultural \
             awareness and respect.",
            "Japan",
            None,
        ));

        let mut germany = Destination::new("Germany", "🇩🇪", Some("Germany".to_string()));
        germany.add_card(CulturalCard::generated(
            "Punctuality",
            CulturalCategory::TimeManagement,
            Some("Time".to_string()),
            Some("Zeit".to_string()),
            vec![
                "⏰ Arrive exactly on time or slightly early".to_string(),
                "📅 Respect scheduled meeting times strictly".to_string(),
                "🚫 Being late is considered disrespectful and unprofessional".to_string(),
                "⚡ Germans value efficiency and time management".to_string(),
            ],
            "German business culture places extremely high value on punctuality and \
             time management. Arriving late to meetings or appointments is seen as \
             disrespectful and unprofessional. This reflects the broader cultural \
             values of efficiency, reliability, and respect for others' time.",
            "Germany",
            None,
        ));
        germany.add_card(CulturalCard::generated(
            "Table Manners",
            CulturalCategory::DiningCulture,
            Some("Dining".to_string()),
            Some("Speisen".to_string()),
            vec![
                "👐 Keep your hands visible on the table".to_string(),
                "🍽️ Wait for the host to say 'Guten Appetit' before eating".to_string(),
                "🥔 Don't cut potatoes with a knife - use your fork".to_string(),
                "🍞 Break bread with your hands, don't cut it".to_string(),
            ],
            "German dining etiquette emphasizes proper table manners and respect for \
             food traditions. Understanding these customs shows cultural awareness and \
             helps build better business relationships during important meals and \
             social gatherings.",
            "Germany",
            None,
        ));

        vec![japan, germany]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_remove_card_refresh_last_updated() {
        let mut dest = Destination::new("Japan", "🇯🇵", None);
        let before = dest.last_updated;

        let card = CulturalCard::manual(CardType::SocialCustoms, "Bowing", "Bow slightly.");
        let card_id = card.id;
        dest.add_card(card);
        assert!(dest.last_updated >= before);
        assert_eq!(dest.cultural_cards.len(), 1);

        let removed = dest.remove_card(card_id);
        assert!(removed.is_some());
        assert!(dest.cultural_cards.is_empty());
    }

    #[test]
    fn test_remove_unknown_card_is_none() {
        let mut dest = Destination::new("Japan", "🇯🇵", None);
        assert!(dest.remove_card(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_country_backfilled_from_name() {
        let json = r#"{
            "name": "Japan",
            "flag": "🇯🇵",
            "culturalCards": [],
            "dateAdded": "2025-07-02T10:00:00Z",
            "lastUpdated": "2025-07-02T10:00:00Z"
        }"#;

        let mut dest: Destination = serde_json::from_str(json).unwrap();
        dest.normalize();
        assert_eq!(dest.country, "Japan");
    }

    #[test]
    fn test_sample_data_shape() {
        let samples = Destination::sample_data();
        assert_eq!(samples.len(), 2);
        for dest in &samples {
            assert_eq!(dest.cultural_cards.len(), 2);
            for card in &dest.cultural_cards {
                assert!(card.is_ai_generated);
                assert_eq!(card.key_knowledge.as_ref().unwrap().len(), 4);
            }
        }
    }
}
