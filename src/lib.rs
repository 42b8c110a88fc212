//! Sampurana - a voice-enabled chat client for Google Gemini
//!
//! Renders the conversation, accepts typed or spoken input, forwards turns
//! to the Gemini chat endpoint and streams the reply back into the UI.

pub mod audio;
pub mod config;
pub mod llm;
pub mod messages;
pub mod speech;
pub mod ui;
pub mod utils;

pub use config::AppConfig;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SampuranaError {
    #[error("API_KEY environment variable not set.")]
    MissingCredential,

    #[error("Request failed: {0}")]
    RequestError(String),

    #[error("{0}")]
    ApiError(String),

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Model load error: {0}")]
    ModelLoadError(String),

    #[error("Transcription error: {0}")]
    TranscriptionError(String),

    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for SampuranaError {
    fn from(e: std::io::Error) -> Self {
        SampuranaError::IOError(e.to_string())
    }
}

impl SampuranaError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Needs the user to provide a key and restart or reset
            SampuranaError::MissingCredential => false,
            // Network hiccups, server errors and broken streams are retried by the user
            SampuranaError::RequestError(_) => true,
            SampuranaError::ApiError(_) => true,
            SampuranaError::StreamError(_) => true,
            // Hardware/device errors may require user intervention
            SampuranaError::AudioDeviceError(_) => false,
            SampuranaError::ModelLoadError(_) => false,
            SampuranaError::TranscriptionError(_) => true,
            SampuranaError::AudioProcessingError(_) => true,
            SampuranaError::ConfigError(_) => false,
            SampuranaError::ChannelError(_) => false,
            SampuranaError::IOError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            SampuranaError::MissingCredential => {
                "Failed to initialize the chat service. Please check your API key.".to_string()
            }
            SampuranaError::RequestError(_) => {
                "Could not reach the chat service. Please check your connection.".to_string()
            }
            SampuranaError::ApiError(_) => {
                "The chat service rejected the request. Please try again.".to_string()
            }
            SampuranaError::StreamError(_) => {
                "The response stream was interrupted. Please try again.".to_string()
            }
            SampuranaError::AudioDeviceError(_) => {
                "Audio device error. Please check your microphone.".to_string()
            }
            SampuranaError::ModelLoadError(_) => {
                "Failed to load the speech model. Please verify the model file is present."
                    .to_string()
            }
            SampuranaError::TranscriptionError(_) => {
                "Speech recognition failed. Please try again.".to_string()
            }
            SampuranaError::AudioProcessingError(_) => {
                "Audio processing failed. Please try again.".to_string()
            }
            SampuranaError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            SampuranaError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            SampuranaError::IOError(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SampuranaError>;
