//! Configuration for the remote chat service

use crate::llm::prompts::{GREETING, SYSTEM_INSTRUCTION};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for chat sessions
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Gemini API key; sessions refuse to open without one
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Model name, e.g. `gemini-2.5-flash`
    pub model: String,

    /// API root, without the `/models/...` suffix
    pub base_url: String,

    /// System instruction sent with every request
    pub system_instruction: String,

    /// Opening model message of each session
    pub greeting: String,

    /// Sampling temperature (server default when unset)
    pub temperature: Option<f32>,

    /// Longest wait for the server in seconds, applied to connecting and to
    /// each gap between streamed chunks
    pub request_timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            greeting: GREETING.to_string(),
            temperature: None,
            request_timeout_secs: 120,
        }
    }
}

impl ChatConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// The API key, if one is present and not blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}
