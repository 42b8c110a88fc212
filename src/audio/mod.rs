//! Microphone capture, voice activity detection and preparation of
//! recordings for transcription

#[cfg(feature = "audio-io")]
pub mod input;
pub mod preprocessor;
pub mod utterance;
pub mod vad;

#[cfg(feature = "audio-io")]
pub use input::{probe_default_input, AudioInput, DeviceAccess};
pub use preprocessor::{prepare_for_whisper, resample, StreamResampler, WHISPER_SAMPLE_RATE};
pub use utterance::{UtteranceDetector, UtteranceLimits, UtteranceStatus};
pub use vad::{VoiceActivityDetector, VAD_CHUNK_SIZE};
