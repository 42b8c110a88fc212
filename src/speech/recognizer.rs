//! The speech-recognition surface the input control drives

use crate::utils::EventSink;
use crate::Result;

/// Lifecycle of the single recognition session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechState {
    /// Not listening
    Idle,
    /// Capturing and waiting for a result
    Listening,
    /// The last attempt failed; the next start begins a fresh attempt
    Error,
}

/// Answer to "may we use the microphone?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    /// Not decided yet; starting will ask
    Prompt,
}

/// Why a recognition attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechErrorKind {
    NotAllowed,
    ServiceNotAllowed,
    NoSpeech,
    AudioCapture,
    Aborted,
    Network,
    ModelUnavailable,
    TranscriptionFailed,
    Other(String),
}

impl SpeechErrorKind {
    /// Short machine-style code shown inside error messages
    pub fn code(&self) -> &str {
        match self {
            SpeechErrorKind::NotAllowed => "not-allowed",
            SpeechErrorKind::ServiceNotAllowed => "service-not-allowed",
            SpeechErrorKind::NoSpeech => "no-speech",
            SpeechErrorKind::AudioCapture => "audio-capture",
            SpeechErrorKind::Aborted => "aborted",
            SpeechErrorKind::Network => "network",
            SpeechErrorKind::ModelUnavailable => "model-unavailable",
            SpeechErrorKind::TranscriptionFailed => "transcription-failed",
            SpeechErrorKind::Other(code) => code,
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            SpeechErrorKind::NotAllowed | SpeechErrorKind::ServiceNotAllowed
        )
    }
}

/// Callbacks from an active recognition attempt, in order:
/// `Started`, then any `Result`/`Error`, then exactly one `End`.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    Started,
    Result(String),
    Error(SpeechErrorKind),
    End,
}

/// A speech-to-text engine with start/stop controls
pub trait SpeechRecognizer: Send {
    /// Whether recognition can work at all on this machine
    fn is_supported(&self) -> bool;

    /// Current microphone permission; an `Err` means it could not be queried
    fn permission_state(&self) -> Result<PermissionState>;

    /// Begin one recognition attempt, reporting through `events`
    fn start(&mut self, events: EventSink<SpeechEvent>) -> Result<()>;

    /// Ask the active attempt to finish; its `End` event follows
    fn stop(&mut self);

    /// Free per-attempt resources once `End` has been seen
    fn release(&mut self) {}
}

/// Recognizer for builds or machines without speech support
#[derive(Debug, Default)]
pub struct UnsupportedRecognizer;

impl SpeechRecognizer for UnsupportedRecognizer {
    fn is_supported(&self) -> bool {
        false
    }

    fn permission_state(&self) -> Result<PermissionState> {
        Ok(PermissionState::Denied)
    }

    fn start(&mut self, _events: EventSink<SpeechEvent>) -> Result<()> {
        Err(crate::SampuranaError::AudioDeviceError(
            "Speech recognition is not available".into(),
        ))
    }

    fn stop(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SpeechErrorKind::NotAllowed.code(), "not-allowed");
        assert_eq!(SpeechErrorKind::Other("bad-grammar".into()).code(), "bad-grammar");
        assert!(SpeechErrorKind::ServiceNotAllowed.is_permission_denied());
        assert!(!SpeechErrorKind::NoSpeech.is_permission_denied());
    }

    #[test]
    fn test_unsupported_recognizer() {
        let recognizer = UnsupportedRecognizer;
        assert!(!recognizer.is_supported());
    }
}
