//! Configuration for lancards paths and providers.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (LANCARDS_HOME)
//! 2. Config file (.lancards/config.yaml)
//! 3. Defaults (~/.lancards)
//!
//! Config file discovery:
//! - Searches current directory and parents for .lancards/config.yaml
//! - Paths in config file are relative to the config file's parent directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<std::result::Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub providers: Option<ProvidersConfig>,
    #[serde(default)]
    pub generation: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to config file)
    pub home: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvidersConfig {
    /// Ordered fallback chain, e.g. ["ollama", "openai-chat"]
    pub chain: Option<Vec<String>>,
    pub ollama: Option<OllamaConfig>,
    pub openai: Option<OpenAiConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OllamaConfig {
    pub model: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    pub chat_model: Option<String>,
    pub reasoning_model: Option<String>,
    pub reasoning_effort: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    pub timeout_secs: Option<u64>,
}

/// Resolved configuration with absolute paths and defaults applied
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to lancards home (state directory)
    pub home: PathBuf,
    /// Ordered provider chain (offline is appended at build time)
    pub provider_chain: Vec<String>,
    pub ollama_model: String,
    pub ollama_endpoint: String,
    pub openai_chat_model: String,
    pub openai_reasoning_model: String,
    pub openai_reasoning_effort: String,
    pub openai_endpoint: String,
    /// Per-provider generation deadline
    pub generation_timeout_secs: u64,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            home: PathBuf::from(".lancards"),
            provider_chain: default_chain(),
            ollama_model: "llama3.2".to_string(),
            ollama_endpoint: "http://localhost:11434".to_string(),
            openai_chat_model: "gpt-4o-mini".to_string(),
            openai_reasoning_model: "o4-mini".to_string(),
            openai_reasoning_effort: "medium".to_string(),
            openai_endpoint: "https://api.openai.com/v1".to_string(),
            generation_timeout_secs: 60,
            config_file: None,
        }
    }
}

fn default_chain() -> Vec<String> {
    vec![
        "ollama".to_string(),
        "openai-chat".to_string(),
        "openai-reasoning".to_string(),
    ]
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".lancards").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".lancards");

    let config_file = find_config_file();
    let mut resolved = ResolvedConfig {
        home: default_home.clone(),
        config_file: config_file.clone(),
        ..ResolvedConfig::default()
    };

    if let Some(ref config_path) = config_file {
        let config = load_config_file(config_path)?;

        if let Some(ref home_path) = config.paths.home {
            // home is relative to the .lancards/ directory
            let lancards_dir = config_path.parent().unwrap_or(Path::new("."));
            resolved.home = resolve_path(lancards_dir, home_path);
        }

        if let Some(providers) = config.providers {
            if let Some(chain) = providers.chain {
                resolved.provider_chain = chain;
            }
            if let Some(ollama) = providers.ollama {
                if let Some(model) = ollama.model {
                    resolved.ollama_model = model;
                }
                if let Some(endpoint) = ollama.endpoint {
                    resolved.ollama_endpoint = endpoint;
                }
            }
            if let Some(openai) = providers.openai {
                if let Some(model) = openai.chat_model {
                    resolved.openai_chat_model = model;
                }
                if let Some(model) = openai.reasoning_model {
                    resolved.openai_reasoning_model = model;
                }
                if let Some(effort) = openai.reasoning_effort {
                    resolved.openai_reasoning_effort = effort;
                }
                if let Some(endpoint) = openai.endpoint {
                    resolved.openai_endpoint = endpoint;
                }
            }
        }

        if let Some(generation) = config.generation {
            if let Some(secs) = generation.timeout_secs {
                resolved.generation_timeout_secs = secs;
            }
        }
    }

    // Env var wins over file and defaults
    if let Ok(env_home) = std::env::var("LANCARDS_HOME") {
        resolved.home = PathBuf::from(env_home);
    }

    Ok(resolved)
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

/// Get the lancards home directory.
pub fn lancards_home() -> Result<PathBuf> {
    Ok(config()?.home.clone())
}

/// Get the destination store path ($LANCARDS_HOME/destinations.json)
pub fn destinations_path() -> Result<PathBuf> {
    Ok(config()?.home.join("destinations.json"))
}
