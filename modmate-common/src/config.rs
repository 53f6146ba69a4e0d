//! Configuration loading and config file resolution
//!
//! Startup configuration is a TOML file with a `[bot]` section for engine
//! settings and a `[responses]` table holding the opaque key -> string
//! response templates (see `templates`).
//!
//! The config file path is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. `MODMATE_CONFIG` environment variable
//! 3. OS config directory (`<config_dir>/modmate/config.toml`)

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "MODMATE_CONFIG";

/// Engine settings from the `[bot]` section
#[derive(Debug, Clone, Deserialize)]
pub struct BotSection {
    /// Identity the platform collaborator is signed in as; events authored
    /// by this identity are skipped
    pub username: String,

    /// Subreddits whose moderator sets are loaded at startup
    pub subreddits: Vec<String>,

    /// Path of the alias/reference dataset document (hot-reloaded on mtime)
    pub aliases_path: PathBuf,

    /// Name of the leaderboard backing document on the platform
    pub leaderboard_document: String,

    /// Fixed delay before resuming the feed after a transient failure
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,

    /// When false, actions are logged instead of submitted (dry run)
    #[serde(default = "default_send_responses")]
    pub send_responses: bool,

    /// Product brand word stripped from accessory lookups before resolution
    #[serde(default)]
    pub brand_word: Option<String>,
}

fn default_backoff_secs() -> u64 {
    30
}

fn default_send_responses() -> bool {
    true
}

/// Full startup configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub bot: BotSection,
    /// Opaque key -> string response templates
    #[serde(default)]
    pub responses: BTreeMap<String, String>,
}

impl BotConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("invalid config file: {e}")))
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(
            subreddits = config.bot.subreddits.len(),
            responses = config.responses.len(),
            "configuration loaded"
        );
        Ok(config)
    }
}

/// Resolve the config file path following the documented priority order
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    // Priority 3: OS config directory
    dirs::config_dir()
        .map(|d| d.join("modmate").join("config.toml"))
        .ok_or_else(|| Error::Config("could not determine config directory".to_string()))
}
