//! Speech input: a recognizer abstraction, the mic-button session and the
//! local Whisper-backed recognizer

pub mod recognizer;
pub mod session;
pub mod stt;

pub use recognizer::{
    PermissionState, SpeechErrorKind, SpeechEvent, SpeechRecognizer, SpeechState,
    UnsupportedRecognizer,
};
pub use session::{
    error_message, SpeechSession, SpeechUpdate, PERMISSION_DENIED_MESSAGE, START_FAILED_MESSAGE,
    UNSUPPORTED_MESSAGE,
};
pub use stt::{SpeechConfig, WhisperEngine};

#[cfg(feature = "audio-io")]
pub use stt::WhisperRecognizer;

/// The recognizer this build can offer
pub fn default_recognizer(config: &SpeechConfig) -> Box<dyn SpeechRecognizer> {
    #[cfg(feature = "audio-io")]
    {
        if !config.model_available() {
            tracing::warn!(
                "Whisper model not found at {:?}; voice input disabled",
                config.model_path
            );
        }
        Box::new(WhisperRecognizer::new(config.clone()))
    }

    #[cfg(not(feature = "audio-io"))]
    {
        tracing::info!(
            "Built without audio I/O; ignoring speech model {:?}",
            config.model_path
        );
        Box::new(UnsupportedRecognizer)
    }
}
