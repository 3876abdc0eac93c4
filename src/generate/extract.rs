//! Layered extraction of card fields from raw model output.
//!
//! Tier 1 is a strict JSON decode of the whole response (code fences and
//! surrounding prose tolerated) carrying the complete card schema. Tier 2
//! covers everything partial: well-formed JSON missing fields, and
//! malformed JSON salvaged by per-field regexes. Tier 3 gives up and
//! reports nothing extracted. Extraction is pure and never errors; the
//! orchestrator fills whatever is still missing.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::domain::KEY_KNOWLEDGE_LEN;

/// Fields recovered from a model response. Any subset may be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialInsight {
    pub title: Option<String>,
    pub category: Option<String>,
    pub name_card: Option<String>,
    #[serde(alias = "practicalTips")]
    pub key_knowledge: Option<Vec<String>>,
    #[serde(alias = "insight")]
    pub cultural_insights: Option<String>,
}

impl PartialInsight {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category.is_none()
            && self.name_card.is_none()
            && self.key_knowledge.is_none()
            && self.cultural_insights.is_none()
    }

    /// Every schema field present, with the exact bullet count.
    pub fn is_complete(&self) -> bool {
        self.title.is_some()
            && self.category.is_some()
            && self.name_card.is_some()
            && self
                .key_knowledge
                .as_ref()
                .is_some_and(|k| k.len() == KEY_KNOWLEDGE_LEN)
            && self.cultural_insights.is_some()
    }
}

/// How far down the extraction ladder we had to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionTier {
    /// The response decoded as well-formed JSON carrying the full schema
    Structured,
    /// Fields were salvaged from a partial or malformed response
    Recovered,
    /// Nothing usable in the response
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub insight: PartialInsight,
    pub tier: ExtractionTier,
}

struct FieldPatterns {
    title: Regex,
    category: Regex,
    name_card: Regex,
    key_knowledge: Regex,
    cultural_insights: Regex,
    array_item: Regex,
}

static FIELD_PATTERNS: LazyLock<FieldPatterns> = LazyLock::new(|| FieldPatterns {
    title: scalar_pattern("title"),
    category: scalar_pattern("category"),
    name_card: scalar_pattern("nameCard"),
    key_knowledge: Regex::new(r#"(?s)"(?:keyKnowledge|practicalTips)"\s*:\s*\[(.*?)\]"#)
        .unwrap(),
    cultural_insights: Regex::new(
        r#""(?:culturalInsights|insight)"\s*:\s*"((?:[^"\\]|\\.)*)""#,
    )
    .unwrap(),
    array_item: Regex::new(r#""((?:[^"\\]|\\.)*)""#).unwrap(),
});

fn scalar_pattern(key: &str) -> Regex {
    // Tolerates escaped quotes inside the value
    Regex::new(&format!(r#""{key}"\s*:\s*"((?:[^"\\]|\\.)*)""#)).unwrap()
}

/// Undo the JSON string escapes the regex tier captures verbatim.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Strip markdown code fences and surrounding prose down to the outermost
/// JSON object, if one exists.
fn json_body(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end > start {
        Some(&raw[start..=end])
    } else {
        None
    }
}

fn strict_decode(raw: &str) -> Option<PartialInsight> {
    let body = json_body(raw)?;
    let insight: PartialInsight = serde_json::from_str(body).ok()?;
    if insight.is_empty() {
        None
    } else {
        Some(insight)
    }
}

fn regex_recover(raw: &str) -> PartialInsight {
    let p = &FIELD_PATTERNS;

    let scalar = |re: &Regex| {
        re.captures(raw)
            .and_then(|c| c.get(1))
            .and_then(|m| non_blank(unescape(m.as_str())))
    };

    let key_knowledge = p.key_knowledge.captures(raw).and_then(|c| {
        let body = c.get(1)?.as_str();
        let items: Vec<String> = p
            .array_item
            .captures_iter(body)
            .filter_map(|c| c.get(1).and_then(|m| non_blank(unescape(m.as_str()))))
            .collect();
        if items.is_empty() {
            None
        } else {
            Some(items)
        }
    });

    PartialInsight {
        title: scalar(&p.title),
        category: scalar(&p.category),
        name_card: scalar(&p.name_card),
        key_knowledge,
        cultural_insights: scalar(&p.cultural_insights),
    }
}

/// Extract card fields from a raw model response.
pub fn extract(raw: &str) -> Extraction {
    if let Some(insight) = strict_decode(raw) {
        // A decode missing fields is only a partial recovery
        let tier = if insight.is_complete() {
            ExtractionTier::Structured
        } else {
            ExtractionTier::Recovered
        };
        return Extraction { insight, tier };
    }

    let recovered = regex_recover(raw);
    if recovered.is_empty() {
        Extraction {
            insight: PartialInsight::default(),
            tier: ExtractionTier::Empty,
        }
    } else {
        Extraction {
            insight: recovered,
            tier: ExtractionTier::Recovered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"{
        "title": "Bowing Etiquette",
        "category": "Greeting Customs & Personal Space",
        "nameCard": "Respect\n尊敬",
        "keyKnowledge": ["🙇 Bow first", "👋 Then shake", "⏱️ Take time", "🤝 Be gentle"],
        "culturalInsights": "Bowing matters."
    }"#;

    #[test]
    fn test_structured_decode() {
        let extraction = extract(WELL_FORMED);
        assert_eq!(extraction.tier, ExtractionTier::Structured);
        assert_eq!(extraction.insight.title.as_deref(), Some("Bowing Etiquette"));
        assert_eq!(extraction.insight.name_card.as_deref(), Some("Respect\n尊敬"));
        assert_eq!(extraction.insight.key_knowledge.as_ref().unwrap().len(), 4);
    }

    #[test]
    fn test_code_fences_and_prose_tolerated() {
        let wrapped = format!("Here is the card:\n```json\n{WELL_FORMED}\n```\nHope it helps!");
        let extraction = extract(&wrapped);
        assert_eq!(extraction.tier, ExtractionTier::Structured);
        assert_eq!(extraction.insight.title.as_deref(), Some("Bowing Etiquette"));
    }

    #[test]
    fn test_legacy_aliases() {
        let legacy = r#"{
            "title": "Gifts",
            "insight": "Bring a small gift.",
            "practicalTips": ["🎁 Wrap it", "🙏 Present with both hands"]
        }"#;
        let extraction = extract(legacy);
        // Aliases decode, but a partial object never rates tier 1
        assert_eq!(extraction.tier, ExtractionTier::Recovered);
        assert_eq!(
            extraction.insight.cultural_insights.as_deref(),
            Some("Bring a small gift.")
        );
        assert_eq!(extraction.insight.key_knowledge.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_partial_decode_is_recovered_not_structured() {
        // Well-formed JSON, but only two bullets and no title
        let partial = r#"{
            "category": "Dining Etiquette & Food Culture",
            "keyKnowledge": ["🍽️ Wait for the host", "🥢 Try local dishes"],
            "culturalInsights": "Meals build trust."
        }"#;
        let extraction = extract(partial);

        assert_eq!(extraction.tier, ExtractionTier::Recovered);
        assert_eq!(
            extraction.insight.category.as_deref(),
            Some("Dining Etiquette & Food Culture")
        );
        assert_eq!(extraction.insight.key_knowledge.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_regex_recovery_from_malformed_json() {
        // Trailing comma makes this invalid JSON
        let malformed = r#"{
            "title": "Dining Out",
            "category": "Dining Etiquette & Food Culture",
            "keyKnowledge": [
                "🍽️ Wait for the host",
                "🥢 Never stick chopsticks upright",
            ],
            "culturalInsights": "Meals build trust.",
        }"#;
        let extraction = extract(malformed);
        assert_eq!(extraction.tier, ExtractionTier::Recovered);
        assert_eq!(extraction.insight.title.as_deref(), Some("Dining Out"));
        assert_eq!(
            extraction.insight.category.as_deref(),
            Some("Dining Etiquette & Food Culture")
        );
        assert_eq!(extraction.insight.key_knowledge.as_ref().unwrap().len(), 2);
        assert_eq!(
            extraction.insight.cultural_insights.as_deref(),
            Some("Meals build trust.")
        );
    }

    #[test]
    fn test_escaped_quotes_recovered() {
        let malformed = r#""title": "The \"right\" bow", oops"#;
        let extraction = extract(malformed);
        assert_eq!(extraction.tier, ExtractionTier::Recovered);
        assert_eq!(
            extraction.insight.title.as_deref(),
            Some("The \"right\" bow")
        );
    }

    #[test]
    fn test_plain_prose_is_empty() {
        let extraction = extract("I could not produce a card for that question.");
        assert_eq!(extraction.tier, ExtractionTier::Empty);
        assert!(extraction.insight.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let extraction = extract("");
        assert_eq!(extraction.tier, ExtractionTier::Empty);
    }
}
