//! Generation orchestrator: provider fallback chain and card assembly.
//!
//! Walks an ordered provider chain until one produces usable output, then
//! assembles a complete `CulturalCard` from whatever the extraction layer
//! salvaged, defaulting the rest. The chain is always terminated by the
//! offline provider, so `generate` can only fail on an empty question.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::{CulturalCard, CulturalCategory, KEY_KNOWLEDGE_LEN};

use super::extract::{self, ExtractionTier};
use super::localize;
use super::prompt::PromptBuilder;
use super::provider::{GenerationProvider, GenerationRequest};
use super::providers::OfflineProvider;

const DEFAULT_TITLE: &str = "Cultural Insight";

/// Generic bullets used to pad out incomplete key knowledge.
const GENERIC_BULLETS: [&str; KEY_KNOWLEDGE_LEN] = [
    "📚 Research local customs before important interactions",
    "🤝 Show genuine interest in cultural traditions",
    "🚫 Don't make assumptions based on stereotypes",
    "👀 Pay attention to non-verbal communication",
];

/// Where the orchestrator currently is in a generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationPhase {
    Idle,
    /// Building prompts from the question
    Analyzing,
    /// Waiting on the named provider
    Generating(String),
    /// Extracting and assembling the card
    Processing,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("cannot generate a card from an empty question")]
    EmptyQuestion,

    /// Unreachable with the default chain (the offline tier is infallible)
    /// but custom chains may exhaust.
    #[error("all generation providers failed")]
    Exhausted,
}

pub struct CardGenerator {
    providers: Vec<Arc<dyn GenerationProvider>>,
    prompts: PromptBuilder,
    provider_timeout: Duration,
    phase_tx: watch::Sender<GenerationPhase>,
    error_tx: watch::Sender<Option<String>>,
}

impl CardGenerator {
    /// Build a generator over the given chain. The offline provider is
    /// appended unconditionally so the chain always terminates.
    pub fn new(chain: Vec<Arc<dyn GenerationProvider>>) -> Self {
        let mut providers = chain;
        providers.push(Arc::new(OfflineProvider::new()));

        let (phase_tx, _) = watch::channel(GenerationPhase::Idle);
        let (error_tx, _) = watch::channel(None);

        Self {
            providers,
            prompts: PromptBuilder::new(),
            provider_timeout: Duration::from_secs(60),
            phase_tx,
            error_tx,
        }
    }

    /// Offline-only generator.
    pub fn offline() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Subscribe to progress phases.
    pub fn phase(&self) -> watch::Receiver<GenerationPhase> {
        self.phase_tx.subscribe()
    }

    /// Subscribe to the advisory error message (last provider failure).
    pub fn error_message(&self) -> watch::Receiver<Option<String>> {
        self.error_tx.subscribe()
    }

    /// Generate a card for a question asked about a destination.
    ///
    /// Cancellation is dropping the returned future; nothing is persisted
    /// here, so a dropped call leaves no trace. A dropped call also resets
    /// the published phase to `Idle` so subscribers never see a stale
    /// `Generating` from an abandoned attempt.
    pub async fn generate(
        &self,
        destination: &str,
        question: &str,
    ) -> Result<CulturalCard, GenerateError> {
        let question = question.trim();
        if question.is_empty() {
            let err = GenerateError::EmptyQuestion;
            self.error_tx.send_replace(Some(err.to_string()));
            return Err(err);
        }

        let mut phase_reset = PhaseReset {
            phase_tx: &self.phase_tx,
            armed: true,
        };

        self.error_tx.send_replace(None);
        self.phase_tx.send_replace(GenerationPhase::Analyzing);

        let prompt = self.prompts.text(destination, question);
        let request = GenerationRequest::new(prompt.system, prompt.user)
            .with_timeout(self.provider_timeout);

        for provider in &self.providers {
            self.phase_tx
                .send_replace(GenerationPhase::Generating(provider.name().to_string()));

            let attempt =
                tokio::time::timeout(self.provider_timeout, provider.generate(&request)).await;

            let raw = match attempt {
                Ok(Ok(raw)) => raw,
                Ok(Err(e)) => {
                    warn!(provider = provider.name(), error = %e, "Provider failed, advancing chain");
                    self.error_tx.send_replace(Some(e.to_string()));
                    continue;
                }
                Err(_) => {
                    warn!(
                        provider = provider.name(),
                        timeout_secs = self.provider_timeout.as_secs(),
                        "Provider timed out, advancing chain"
                    );
                    self.error_tx
                        .send_replace(Some(format!("{} timed out", provider.name())));
                    continue;
                }
            };

            self.phase_tx.send_replace(GenerationPhase::Processing);
            let extraction = extract::extract(&raw);

            if extraction.tier == ExtractionTier::Empty && raw.trim().is_empty() {
                warn!(provider = provider.name(), "Provider returned nothing usable");
                continue;
            }

            debug!(provider = provider.name(), tier = ?extraction.tier, "Assembling card");
            let card = self.assemble(destination, question, &raw, extraction.insight);

            self.phase_tx.send_replace(GenerationPhase::Complete);
            phase_reset.armed = false;
            info!(
                provider = provider.name(),
                destination, title = %card.title, "Generated cultural card"
            );
            return Ok(card);
        }

        // The guard publishes Idle on the way out
        Err(GenerateError::Exhausted)
    }

    /// Fill the gaps extraction left and build the final card.
    fn assemble(
        &self,
        destination: &str,
        question: &str,
        raw: &str,
        insight: extract::PartialInsight,
    ) -> CulturalCard {
        let category = insight
            .category
            .as_deref()
            .map(CulturalCategory::from_label)
            .unwrap_or(CulturalCategory::SocialCustoms);

        let title = insight
            .title
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let mut key_knowledge = insight.key_knowledge.unwrap_or_default();
        key_knowledge.truncate(KEY_KNOWLEDGE_LEN);
        for bullet in GENERIC_BULLETS.iter().skip(key_knowledge.len()) {
            key_knowledge.push(bullet.to_string());
        }

        let cultural_insights = insight
            .cultural_insights
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| raw.trim().to_string());

        let (name_card_app, mut name_card_local) = match insight.name_card.as_deref() {
            Some(nc) => localize::split_name_card(nc),
            None => (category.default_concept().to_string(), None),
        };
        if name_card_local.is_none() {
            name_card_local =
                localize::local_name(&name_card_app, destination).map(str::to_string);
        }

        CulturalCard::generated(
            title,
            category,
            Some(name_card_app),
            name_card_local,
            key_knowledge,
            cultural_insights,
            destination,
            Some(question.to_string()),
        )
    }
}

/// Resets the published phase to `Idle` when a `generate` call ends
/// without completing, including when the caller drops the future.
struct PhaseReset<'a> {
    phase_tx: &'a watch::Sender<GenerationPhase>,
    armed: bool,
}

impl Drop for PhaseReset<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.phase_tx.send_replace(GenerationPhase::Idle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::provider::ProviderError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that always fails and counts how often it was asked.
    struct FailingProvider {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl GenerationProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn generate(&self, _: &GenerationRequest) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Unavailable("down".to_string()))
        }
    }

    /// Provider returning a fixed response.
    struct CannedProvider(String);

    #[async_trait]
    impl GenerationProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        async fn generate(&self, _: &GenerationRequest) -> Result<String, ProviderError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_empty_question_fails_before_providers_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let generator = CardGenerator::new(vec![Arc::new(FailingProvider {
            calls: calls.clone(),
        })]);

        let err = generator.generate("Japan", "   ").await.unwrap_err();
        assert_eq!(err, GenerateError::EmptyQuestion);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failing_chain_falls_through_to_offline() {
        let calls = Arc::new(AtomicUsize::new(0));
        let generator = CardGenerator::new(vec![Arc::new(FailingProvider {
            calls: calls.clone(),
        })]);

        let card = generator
            .generate("Japan", "How do I greet colleagues?")
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(card.is_ai_generated);
        assert_eq!(card.key_knowledge.as_ref().unwrap().len(), KEY_KNOWLEDGE_LEN);
        assert!(card.category.is_some());
        assert_eq!(card.destination.as_deref(), Some("Japan"));
    }

    #[tokio::test]
    async fn test_structured_response_passes_through() {
        let raw = r#"{
            "title": "Bowing Etiquette",
            "category": "Greeting Customs & Personal Space",
            "nameCard": "Respect\n尊敬",
            "keyKnowledge": ["🙇 a", "👴 b", "⏱️ c", "🤝 d"],
            "culturalInsights": "Bowing matters."
        }"#;
        let generator = CardGenerator::new(vec![Arc::new(CannedProvider(raw.to_string()))]);

        let card = generator.generate("Japan", "How do I bow?").await.unwrap();

        assert_eq!(card.title, "Bowing Etiquette");
        assert_eq!(card.category, Some(CulturalCategory::GreetingCustoms));
        assert_eq!(card.name_card_app.as_deref(), Some("Respect"));
        assert_eq!(card.name_card_local.as_deref(), Some("尊敬"));
        assert_eq!(card.cultural_insights.as_deref(), Some("Bowing matters."));
        assert_eq!(card.question.as_deref(), Some("How do I bow?"));
    }

    #[tokio::test]
    async fn test_prose_response_gets_defaults() {
        let raw = "Bowing shows respect in Japan and is expected in formal settings.";
        let generator = CardGenerator::new(vec![Arc::new(CannedProvider(raw.to_string()))]);

        let card = generator.generate("Japan", "How do I bow?").await.unwrap();

        assert_eq!(card.title, DEFAULT_TITLE);
        assert_eq!(card.category, Some(CulturalCategory::SocialCustoms));
        assert_eq!(card.cultural_insights.as_deref(), Some(raw));
        assert_eq!(card.key_knowledge.as_ref().unwrap().len(), KEY_KNOWLEDGE_LEN);
        // Default concept for the defaulted category, localized
        assert_eq!(card.name_card_app.as_deref(), Some("Courtesy"));
        assert_eq!(card.name_card_local.as_deref(), Some("礼節"));
    }

    #[tokio::test]
    async fn test_short_key_knowledge_is_padded() {
        let raw = r#"{
            "title": "Dining",
            "category": "Dining Etiquette & Food Culture",
            "nameCard": "Dining",
            "keyKnowledge": ["🍽️ Wait for the host"],
            "culturalInsights": "Meals build trust."
        }"#;
        let generator = CardGenerator::new(vec![Arc::new(CannedProvider(raw.to_string()))]);

        let card = generator.generate("Germany", "dinner etiquette?").await.unwrap();

        let bullets = card.key_knowledge.as_ref().unwrap();
        assert_eq!(bullets.len(), KEY_KNOWLEDGE_LEN);
        assert_eq!(bullets[0], "🍽️ Wait for the host");
        assert_eq!(bullets[1], GENERIC_BULLETS[1]);
        // Single-line name card gets its local half from the lookup table
        assert_eq!(card.name_card_local.as_deref(), Some("Speisen"));
    }

    /// Provider that never returns.
    struct StallingProvider;

    #[async_trait]
    impl GenerationProvider for StallingProvider {
        fn name(&self) -> &str {
            "stalling"
        }

        async fn generate(&self, _: &GenerationRequest) -> Result<String, ProviderError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_dropping_generate_resets_phase_to_idle() {
        let generator = CardGenerator::new(vec![Arc::new(StallingProvider)])
            .with_provider_timeout(Duration::from_secs(60));
        let phase = generator.phase();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(100),
            generator.generate("Japan", "greetings?"),
        )
        .await;
        assert!(abandoned.is_err());

        assert_eq!(*phase.borrow(), GenerationPhase::Idle);
    }

    #[tokio::test]
    async fn test_phases_reach_complete() {
        let generator = CardGenerator::offline();
        let phase = generator.phase();

        generator
            .generate("Japan", "How do I greet colleagues?")
            .await
            .unwrap();

        assert_eq!(*phase.borrow(), GenerationPhase::Complete);
    }

    #[tokio::test]
    async fn test_error_message_records_last_failure() {
        let generator = CardGenerator::new(vec![Arc::new(FailingProvider {
            calls: Arc::new(AtomicUsize::new(0)),
        })]);
        let errors = generator.error_message();

        generator.generate("Japan", "greetings?").await.unwrap();

        let msg = errors.borrow().clone().unwrap();
        assert!(msg.contains("unavailable"));
    }
}
