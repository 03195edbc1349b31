use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::chat::intellichat::{ChatEndpoint, DEFAULT_CHAT_HOST, DEFAULT_CHAT_URL};
use crate::creativity::Creativity;

/// Environment variable that overrides the configured API key
pub const API_KEY_ENV: &str = "RAPIDAPI_KEY";

/// Startup settings. The file is only ever read; changes made in the UI
/// last for the session.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub endpoint: Option<String>,
    pub api_host: Option<String>,
    pub api_key: Option<String>,
    pub creativity: Option<String>,
    pub username: Option<String>,
    pub placeholder_delay_ms: Option<u64>,
    pub keep_orphaned_replies: Option<bool>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Invalid config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("regen").join("config.json"))
    }

    /// Creativity from the file, ignoring values outside the supported set
    pub fn creativity(&self) -> Option<Creativity> {
        self.creativity.as_deref().and_then(Creativity::from_str)
    }

    /// Endpoint settings with `env_key` (usually `$RAPIDAPI_KEY`) taking
    /// precedence over the stored key
    pub fn chat_endpoint(&self, env_key: Option<String>) -> ChatEndpoint {
        ChatEndpoint {
            url: self.endpoint.clone().unwrap_or_else(|| DEFAULT_CHAT_URL.to_string()),
            host: self.api_host.clone().unwrap_or_else(|| DEFAULT_CHAT_HOST.to_string()),
            api_key: env_key
                .filter(|k| !k.trim().is_empty())
                .or_else(|| self.api_key.clone()),
        }
    }
}
