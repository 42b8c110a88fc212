//! Application configuration
//!
//! Settings come from an optional TOML file in the user config directory,
//! then environment variables override individual fields.

use crate::llm::ChatConfig;
use crate::speech::SpeechConfig;
use crate::{Result, SampuranaError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Configuration for the whole application
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote chat service
    pub chat: ChatConfig,

    /// Local speech recognition
    pub speech: SpeechConfig,
}

impl AppConfig {
    /// `$CONFIG_DIR/sampurana/config.toml`, when the platform has a config dir
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sampurana").join("config.toml"))
    }

    /// Read the config file if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.is_file() => Self::from_file(&path)?,
            Some(path) => {
                debug!("No config file at {}", path.display());
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SampuranaError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content).map_err(|e| {
            SampuranaError::ConfigError(format!("{}: {}", path.display(), e))
        })?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SampuranaError::ConfigError(format!("Invalid configuration: {}", e)))
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from any variable lookup
    ///
    /// `GEMINI_API_KEY` wins over `API_KEY`. Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(key) = get("GEMINI_API_KEY").or_else(|| get("API_KEY")) {
            self.chat.api_key = Some(key);
        }
        if let Some(model) = get("SAMPURANA_MODEL") {
            self.chat.model = model;
        }
        if let Some(base_url) = get("SAMPURANA_BASE_URL") {
            self.chat.base_url = base_url;
        }
        if let Some(path) = get("SAMPURANA_WHISPER_MODEL") {
            self.speech.model_path = PathBuf::from(path);
        }
        if let Some(language) = get("SAMPURANA_LANGUAGE") {
            self.speech.language = match language.as_str() {
                "auto" => None,
                _ => Some(language),
            };
        }
    }
}
