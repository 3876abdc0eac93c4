//! Command-line interface for lancards.
//!
//! Provides commands for asking cultural questions, listing destinations
//! and their cards, managing destinations, and checking store consistency.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use crate::capture::transcribe_file;
use crate::config::{self, ResolvedConfig};
use crate::domain::{CulturalCard, Destination};
use crate::generate::{
    CardGenerator, GenerationProvider, OllamaProvider, OpenAiChatProvider, OpenAiReasoningProvider,
};
use crate::store::ContentStore;

/// lancards - voice-to-cultural-insight card generator
#[derive(Parser, Debug)]
#[command(name = "lancards")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a cultural question about a destination and save the card
    Ask {
        /// Destination name (must exist in the store)
        destination: String,

        /// The question, as free words
        question: Vec<String>,

        /// Transcribe this audio file and use it as the question
        #[arg(long)]
        audio: Option<PathBuf>,

        /// Whisper model to use with --audio
        #[arg(long, default_value = "base")]
        model: String,

        /// Generate without saving to the store
        #[arg(long)]
        dry_run: bool,
    },

    /// List destinations, or the cards of one destination
    List {
        /// Destination name
        destination: Option<String>,
    },

    /// Manage destinations
    Destinations {
        #[command(subcommand)]
        command: DestinationCommands,
    },

    /// Check the store for duplicate ids and incomplete cards
    Validate,

    /// Show resolved configuration (debug)
    Config,
}

#[derive(Subcommand, Debug)]
pub enum DestinationCommands {
    /// Add a new destination
    Add {
        /// Display name
        name: String,

        /// Flag glyph
        #[arg(long, default_value = "🌍")]
        flag: String,

        /// Country key for localization (defaults to the name)
        #[arg(long)]
        country: Option<String>,
    },

    /// Remove a destination and all its cards
    Remove {
        /// Destination name
        name: String,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Ask {
                destination,
                question,
                audio,
                model,
                dry_run,
            } => ask(&destination, question, audio, &model, dry_run).await,
            Commands::List { destination } => list(destination.as_deref()),
            Commands::Destinations { command } => match command {
                DestinationCommands::Add {
                    name,
                    flag,
                    country,
                } => add_destination(&name, &flag, country),
                DestinationCommands::Remove { name } => remove_destination(&name),
            },
            Commands::Validate => validate(),
            Commands::Config => show_config(),
        }
    }
}

fn open_store() -> Result<ContentStore> {
    let path = config::destinations_path()?;
    ContentStore::open(&path)
        .with_context(|| format!("Failed to open destination store: {}", path.display()))
}

/// Build the provider chain named in the configuration. Unknown names are
/// skipped with a warning; the generator appends the offline tier itself.
fn build_chain(config: &ResolvedConfig) -> Vec<Arc<dyn GenerationProvider>> {
    let mut chain: Vec<Arc<dyn GenerationProvider>> = Vec::new();
    for name in &config.provider_chain {
        match name.as_str() {
            "ollama" => chain.push(Arc::new(OllamaProvider::with_base_url(
                &config.ollama_endpoint,
                &config.ollama_model,
            ))),
            "openai-chat" => chain.push(Arc::new(OpenAiChatProvider::with_base_url(
                &config.openai_endpoint,
                &config.openai_chat_model,
            ))),
            "openai-reasoning" => chain.push(Arc::new(OpenAiReasoningProvider::with_base_url(
                &config.openai_endpoint,
                &config.openai_reasoning_model,
                &config.openai_reasoning_effort,
            ))),
            "offline" => {} // always appended by the generator
            other => warn!(provider = other, "Unknown provider in chain, skipping"),
        }
    }
    chain
}

async fn ask(
    destination: &str,
    question: Vec<String>,
    audio: Option<PathBuf>,
    model: &str,
    dry_run: bool,
) -> Result<()> {
    let mut store = open_store()?;
    let dest = store
        .find(destination)
        .with_context(|| format!("Unknown destination: {destination}"))?
        .clone();

    let question = match audio {
        Some(path) => {
            let transcript = transcribe_file(&path, model, None).await?;
            println!("Transcribed: \"{}\"", transcript.text);
            transcript.text
        }
        None => question.join(" "),
    };

    let config = config::config()?;
    let generator = CardGenerator::new(build_chain(config))
        .with_provider_timeout(Duration::from_secs(config.generation_timeout_secs));

    let card = generator.generate(&dest.country, &question).await?;
    print_card(&card);

    if dry_run {
        println!("(dry run - card not saved)");
    } else {
        store.add_card(&dest.name, card)?;
        println!("Saved to {}", dest.name);
    }
    Ok(())
}

fn list(destination: Option<&str>) -> Result<()> {
    let store = open_store()?;

    match destination {
        Some(name) => {
            let dest = store
                .find(name)
                .with_context(|| format!("Unknown destination: {name}"))?;
            println!("{} {} - {} cards", dest.flag, dest.name, dest.cultural_cards.len());
            for card in &dest.cultural_cards {
                print_card(card);
            }
        }
        None => {
            for dest in store.destinations() {
                println!(
                    "{} {:<12} {} cards  (updated {})",
                    dest.flag,
                    dest.name,
                    dest.cultural_cards.len(),
                    dest.last_updated.format("%Y-%m-%d")
                );
            }
        }
    }
    Ok(())
}

fn add_destination(name: &str, flag: &str, country: Option<String>) -> Result<()> {
    let mut store = open_store()?;
    store.add_destination(Destination::new(name, flag, country))?;
    println!("Added destination: {name}");
    Ok(())
}

fn remove_destination(name: &str) -> Result<()> {
    let mut store = open_store()?;
    let removed = store.remove_destination(name)?;
    println!(
        "Removed {} ({} cards)",
        removed.name,
        removed.cultural_cards.len()
    );
    Ok(())
}

fn validate() -> Result<()> {
    let store = open_store()?;
    let report = store.validate();

    if report.is_clean() {
        println!("Store is consistent.");
        return Ok(());
    }

    for id in &report.duplicate_destination_ids {
        println!("Duplicate destination id: {id}");
    }
    for id in &report.duplicate_card_ids {
        println!("Duplicate card id: {id}");
    }
    for id in &report.ai_cards_missing_fields {
        println!("AI card missing structured fields: {id}");
    }
    Ok(())
}

fn show_config() -> Result<()> {
    let config = config::config()?;

    println!("Home:            {}", config.home.display());
    println!("Store:           {}", config.home.join("destinations.json").display());
    println!("Provider chain:  {} + offline", config.provider_chain.join(" → "));
    println!("Ollama:          {} @ {}", config.ollama_model, config.ollama_endpoint);
    println!(
        "OpenAI:          {} / {} ({})",
        config.openai_chat_model, config.openai_reasoning_model, config.openai_reasoning_effort
    );
    println!("Timeout:         {}s", config.generation_timeout_secs);
    match &config.config_file {
        Some(path) => println!("Config file:     {}", path.display()),
        None => println!("Config file:     (none, using defaults)"),
    }
    Ok(())
}

fn print_card(card: &CulturalCard) {
    let category = card
        .category
        .map(|c| format!("{} {}", c.emoji(), c.label()))
        .unwrap_or_else(|| card.card_type.title().to_string());

    println!();
    println!("━━━ {} ━━━", card.title);
    println!("{category}");
    if let (Some(app), Some(local)) = (&card.name_card_app, &card.name_card_local) {
        println!("{app} / {local}");
    } else if let Some(app) = &card.name_card_app {
        println!("{app}");
    }
    if let Some(bullets) = &card.key_knowledge {
        for bullet in bullets {
            println!("  {bullet}");
        }
    }
    if let Some(insight) = &card.cultural_insights {
        println!();
        println!("{insight}");
    }
    if let Some(question) = &card.question {
        println!();
        println!("Asked: \"{question}\"");
    }
}
