//! Prompt templates for cultural insight generation.
//!
//! Provider-agnostic: every provider receives the same system instruction
//! and user turn. Two variants exist, plain text generation and
//! image-grounded generation (the question refers to an attached photo).

use crate::domain::{CulturalCategory, KEY_KNOWLEDGE_LEN};

/// A rendered (system, user) prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Builds prompts from (destination country, question) pairs.
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// System instruction shared by all variants.
    fn system_prompt(&self) -> String {
        let categories = CulturalCategory::ALL
            .iter()
            .map(|c| format!("- {}", c.label()))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are a cultural intelligence expert helping international business \
professionals understand local customs and practices. Your role is to provide \
practical, actionable cultural insights that help build respectful business \
relationships.

Guidelines:
- Provide specific, actionable advice
- Focus on business and professional contexts
- Include DO and DON'T examples
- Explain the cultural reasoning behind practices
- Keep responses concise but comprehensive (2-3 paragraphs)
- Use respectful, professional tone
- Avoid stereotypes or oversimplifications

Categories to consider:
{categories}

Format your response as JSON:
{{
    \"title\": \"[Concise topic title]\",
    \"category\": \"[One of the categories above]\",
    \"nameCard\": \"[One-word concept in English, newline, the same concept in the destination's local language]\",
    \"keyKnowledge\": [{bullets} short bullet facts, each starting with a fitting emoji],
    \"culturalInsights\": \"[Main cultural insight paragraph]\"
}}",
            categories = categories,
            bullets = KEY_KNOWLEDGE_LEN,
        )
    }

    /// Text-generation variant: the question stands alone.
    pub fn text(&self, country: &str, question: &str) -> Prompt {
        let user = format!(
            "Destination: {country}\n\
             User Question: \"{question}\"\n\n\
             Please generate a cultural insight card that addresses the user's \
             question in the context of doing business in {country}. Focus on \
             practical advice that will help them navigate this cultural aspect \
             professionally and respectfully."
        );

        Prompt {
            system: self.system_prompt(),
            user,
        }
    }

    /// Image-grounded variant: the question refers to an attached photo.
    pub fn image_grounded(&self, country: &str, question: &str) -> Prompt {
        let user = format!(
            "Destination: {country}\n\
             User Question about the attached photo: \"{question}\"\n\n\
             The user has photographed something in {country} they want to \
             understand. Identify the culturally relevant subject of the photo \
             and generate a cultural insight card explaining its significance \
             for a visiting business professional. If the photo's subject is \
             ambiguous, favor the interpretation most relevant to the question."
        );

        Prompt {
            system: self.system_prompt(),
            user,
        }
    }
}
