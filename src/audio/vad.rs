use crate::{Result, SampuranaError};
use tracing::info;
use voice_activity_detector::VoiceActivityDetector as VadDetector;

/// Samples per VAD decision at 16 kHz (32 ms)
pub const VAD_CHUNK_SIZE: usize = 512;

const VAD_SAMPLE_RATE: u32 = 16000;

/// Voice Activity Detection using Silero VAD
pub struct VoiceActivityDetector {
    detector: VadDetector,
    threshold: f32,
}

impl VoiceActivityDetector {
    /// Create a 16 kHz detector
    ///
    /// `threshold` is the speech probability (0.0-1.0) a chunk must reach.
    pub fn new(threshold: f32) -> Result<Self> {
        let detector = VadDetector::builder()
            .sample_rate(VAD_SAMPLE_RATE as i32)
            .chunk_size(VAD_CHUNK_SIZE)
            .build()
            .map_err(|e| {
                SampuranaError::AudioProcessingError(format!("Failed to create VAD: {:?}", e))
            })?;

        info!("Initialized VAD with threshold {}", threshold);

        Ok(Self {
            detector,
            threshold: threshold.clamp(0.0, 1.0),
        })
    }

    /// Speech probability for one chunk of 16 kHz mono samples
    pub fn probability(&mut self, chunk: &[f32]) -> f32 {
        self.detector.predict(chunk.iter().copied())
    }

    pub fn is_speech(&mut self, chunk: &[f32]) -> bool {
        self.probability(chunk) >= self.threshold
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Duration of one chunk in seconds
    pub fn chunk_secs() -> f32 {
        VAD_CHUNK_SIZE as f32 / VAD_SAMPLE_RATE as f32
    }
}
