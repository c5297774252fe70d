use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::pathfinding::SearchOptions;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub wikibacon: WikibaconConfig,
    #[serde(default)]
    pub wiki: WikiConfig,
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Local storage and game settings
#[derive(Debug, Clone, Deserialize)]
pub struct WikibaconConfig {
    /// SQLite file holding the page link cache.
    pub db_path: PathBuf,
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,
    /// Word list the game draws random start pages from.
    #[serde(default = "default_dictionary_path")]
    pub dictionary_path: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Encyclopedia API settings
#[derive(Debug, Clone, Deserialize)]
pub struct WikiConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// How many full-text search hits to try when an exact lookup fails.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            search_limit: default_search_limit(),
        }
    }
}

/// Embeddings configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    pub provider: String,
    pub model: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    pub api_key_env: String,
    pub batch_size: usize,
    pub dimensions: usize,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

/// Path search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Links-only traversal (no category edges).
    #[serde(default)]
    pub hard_mode: bool,
    /// Upper bound on candidates scored per frontier per round.
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            timeout_secs: default_timeout_secs(),
            hard_mode: false,
            candidate_limit: default_candidate_limit(),
        }
    }
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("migrations")
}

fn default_dictionary_path() -> PathBuf {
    PathBuf::from("dictionary.txt")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_url() -> String {
    "https://en.wikipedia.org/w/api.php".to_string()
}

fn default_user_agent() -> String {
    format!(
        "wikibacon/{} (https://github.com/peye-labs/wikibacon)",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_search_limit() -> usize {
    10
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_max_depth() -> usize {
    15
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_candidate_limit() -> usize {
    50
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in WIKIBACON_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = std::env::var("WIKIBACON_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        Self::from_file(&config_path)
    }

    /// Parse and validate a specific config file.
    pub fn from_file(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.embeddings.provider != "openai" {
            anyhow::bail!(
                "embeddings.provider must be \"openai\" (OpenAI-compatible endpoint), got \"{}\"",
                self.embeddings.provider
            );
        }

        std::env::var(&self.embeddings.api_key_env).with_context(|| {
            format!(
                "Environment variable {} not set. Set it in your .env file or as an environment variable with your embeddings API key.",
                self.embeddings.api_key_env
            )
        })?;

        if self.embeddings.dimensions == 0 {
            anyhow::bail!("embeddings.dimensions must be greater than 0");
        }

        if self.embeddings.batch_size == 0 {
            anyhow::bail!("embeddings.batch_size must be greater than 0");
        }

        if self.wiki.search_limit == 0 {
            anyhow::bail!("wiki.search_limit must be greater than 0");
        }

        if self.search.max_depth == 0 {
            anyhow::bail!("search.max_depth must be greater than 0");
        }

        if self.search.candidate_limit == 0 {
            anyhow::bail!("search.candidate_limit must be greater than 0");
        }

        Ok(())
    }

    /// Get database path
    pub fn db_path(&self) -> &Path {
        &self.wikibacon.db_path
    }

    /// Get migrations directory
    pub fn migrations_dir(&self) -> &Path {
        &self.wikibacon.migrations_dir
    }

    /// Search options derived from the `[search]` section.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            max_depth: self.search.max_depth,
            timeout: Duration::from_secs(self.search.timeout_secs),
            hard_mode: self.search.hard_mode,
        }
    }
}
