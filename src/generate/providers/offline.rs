//! Deterministic offline provider.
//!
//! Terminal tier of the fallback chain: routes the question through a small
//! keyword table and returns canned, schema-shaped JSON. Never fails, which
//! is what guarantees the chain terminates.

use async_trait::async_trait;

use super::super::provider::{GenerationProvider, GenerationRequest, ProviderError};

pub struct OfflineProvider;

impl OfflineProvider {
    pub fn new() -> Self {
        Self
    }

    /// Pull the destination out of the rendered user prompt.
    fn destination_of(request: &GenerationRequest) -> String {
        request
            .user_prompt
            .lines()
            .find_map(|line| line.strip_prefix("Destination:"))
            .map(|rest| rest.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "your destination".to_string())
    }

    /// Pull the verbatim question out of the rendered user prompt.
    fn question_of(request: &GenerationRequest) -> String {
        request
            .user_prompt
            .lines()
            .find_map(|line| {
                line.split_once("Question")
                    .map(|(_, rest)| rest.trim_start_matches([':', ' ']).trim_matches('"'))
            })
            .map(str::to_string)
            .unwrap_or_default()
    }

    fn greeting_response(destination: &str) -> String {
        match destination.to_lowercase().as_str() {
            "japan" => r#"{
    "title": "Business Greeting Etiquette",
    "category": "Greeting Customs & Personal Space",
    "nameCard": "Respect\n尊敬",
    "keyKnowledge": [
        "🙇 Offer a slight bow while extending your hand for a handshake",
        "👴 Wait for the senior person to initiate the greeting",
        "⏱️ Don't rush the greeting - allow time for proper acknowledgment",
        "🤝 Avoid overly firm handshakes; gentler grips are preferred"
    ],
    "culturalInsights": "In Japanese business culture, the bow (ojigi) is the traditional greeting that shows respect and hierarchy awareness. The depth and duration of your bow should reflect the status of the person you're greeting - deeper bows for senior executives, lighter bows for peers. However, many Japanese businesspeople now expect handshakes when meeting international colleagues, creating a hybrid approach."
}"#
            .to_string(),
            "germany" => r#"{
    "title": "German Business Greetings",
    "category": "Greeting Customs & Personal Space",
    "nameCard": "Respect\nRespekt",
    "keyKnowledge": [
        "🤝 Use a firm handshake with direct eye contact",
        "🎩 Address people by their title and surname initially",
        "🚫 Don't use first names unless explicitly invited",
        "💬 Keep small talk brief during business greetings"
    ],
    "culturalInsights": "German business culture values directness and efficiency in greetings. A firm handshake with direct eye contact is the standard, accompanied by formal titles and surnames until invited to use first names. Germans appreciate punctuality and prefer to keep personal and professional boundaries clear during initial meetings."
}"#
            .to_string(),
            _ => Self::general_response(destination),
        }
    }

    fn meeting_response(destination: &str) -> String {
        format!(
            r#"{{
    "title": "Business Meeting Protocols",
    "category": "Business Etiquette & Meeting Protocols",
    "nameCard": "Protocol",
    "keyKnowledge": [
        "⏰ Arrive on time or slightly early to show respect",
        "💳 Bring business cards and exchange them properly",
        "🤫 Don't interrupt senior members during presentations",
        "👔 Don't make decisions without considering hierarchy"
    ],
    "culturalInsights": "Business meetings in {destination} follow specific cultural protocols that demonstrate respect and professionalism. Understanding hierarchy, timing, and communication styles is crucial for successful interactions. Preparation and attention to cultural nuances can make the difference between building strong business relationships and missing opportunities."
}}"#
        )
    }

    fn dining_response(destination: &str) -> String {
        format!(
            r#"{{
    "title": "Business Dining Etiquette",
    "category": "Dining Etiquette & Food Culture",
    "nameCard": "Dining",
    "keyKnowledge": [
        "🍽️ Wait for the host to begin eating or drinking",
        "🥢 Try local dishes to show cultural appreciation",
        "🗣️ Don't discuss business immediately - build rapport first",
        "🙏 Don't refuse offered food or drink without polite explanation"
    ],
    "culturalInsights": "Business dining in {destination} is an important relationship-building activity with specific etiquette rules. Understanding proper table manners, gift-giving customs, and conversation topics can strengthen business partnerships. The way you handle dining situations often reflects your respect for local culture and attention to detail."
}}"#
        )
    }

    fn general_response(destination: &str) -> String {
        format!(
            r#"{{
    "title": "Cultural Business Insight",
    "category": "Social Customs & Relationship Building",
    "nameCard": "Courtesy",
    "keyKnowledge": [
        "📚 Research local customs before important interactions",
        "🤝 Show genuine interest in cultural traditions",
        "🚫 Don't make assumptions based on stereotypes",
        "👀 Don't ignore subtle social cues or non-verbal communication"
    ],
    "culturalInsights": "Understanding cultural nuances in {destination} requires attention to both explicit customs and subtle social cues. Business relationships are built on mutual respect and cultural awareness. Taking time to learn and demonstrate appreciation for local customs shows professionalism and can lead to stronger, more successful business partnerships."
}}"#
        )
    }
}

impl Default for OfflineProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationProvider for OfflineProvider {
    fn name(&self) -> &str {
        "offline"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let destination = Self::destination_of(request);
        let question = Self::question_of(request).to_lowercase();

        let response = if question.contains("greet") || question.contains("hello") {
            Self::greeting_response(&destination)
        } else if question.contains("meeting") || question.contains("business") {
            Self::meeting_response(&destination)
        } else if question.contains("food")
            || question.contains("eat")
            || question.contains("dining")
        {
            Self::dining_response(&destination)
        } else {
            Self::general_response(&destination)
        };

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(country: &str, question: &str) -> GenerationRequest {
        let prompt = crate::generate::prompt::PromptBuilder::new().text(country, question);
        GenerationRequest::new(prompt.system, prompt.user)
    }

    #[tokio::test]
    async fn test_offline_is_deterministic() {
        let provider = OfflineProvider::new();
        let req = request("Japan", "How do I greet colleagues?");

        let a = provider.generate(&req).await.unwrap();
        let b = provider.generate(&req).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_keyword_routing() {
        let provider = OfflineProvider::new();

        let greeting = provider
            .generate(&request("Japan", "How do I greet colleagues?"))
            .await
            .unwrap();
        assert!(greeting.contains("Greeting Customs & Personal Space"));
        assert!(greeting.contains("尊敬"));

        let dining = provider
            .generate(&request("Korea", "What should I know about food?"))
            .await
            .unwrap();
        assert!(dining.contains("Dining Etiquette & Food Culture"));
        assert!(dining.contains("Korea"));

        let general = provider
            .generate(&request("France", "What about gift wrapping?"))
            .await
            .unwrap();
        assert!(general.contains("Social Customs & Relationship Building"));
        assert!(general.contains("France"));
    }

    #[tokio::test]
    async fn test_responses_are_valid_json() {
        let provider = OfflineProvider::new();
        for question in ["greet", "meeting plans", "local food", "anything else"] {
            let raw = provider
                .generate(&request("Germany", question))
                .await
                .unwrap();
            let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
            assert_eq!(value["keyKnowledge"].as_array().unwrap().len(), 4);
        }
    }
}
