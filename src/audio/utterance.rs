//! End-of-utterance bookkeeping
//!
//! Recognition runs in single-utterance mode: capture ends on its own once
//! the speaker has been quiet for a moment after talking, when nobody talks
//! at all, or when the utterance gets too long. Whether a chunk holds
//! speech is decided by the VAD; this only keeps time.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceStatus {
    /// Keep capturing
    Continue,
    /// Speech was heard and has ended (or hit the length cap)
    Complete,
    /// No speech arrived in time
    NoSpeech,
}

/// Timing limits for [`UtteranceDetector`]
#[derive(Debug, Clone, Copy)]
pub struct UtteranceLimits {
    /// Trailing silence that ends an utterance, in seconds
    pub end_silence_secs: f32,
    /// Give up if no speech starts within this many seconds
    pub no_speech_timeout_secs: f32,
    /// Hard cap on utterance length, in seconds
    pub max_utterance_secs: f32,
}

impl Default for UtteranceLimits {
    fn default() -> Self {
        Self {
            end_silence_secs: 1.2,
            no_speech_timeout_secs: 8.0,
            max_utterance_secs: 30.0,
        }
    }
}

/// Tracks speech and silence across VAD decisions
#[derive(Debug, Clone)]
pub struct UtteranceDetector {
    limits: UtteranceLimits,
    heard_speech: bool,
    silence_secs: f32,
    elapsed_secs: f32,
}

impl UtteranceDetector {
    pub fn new(limits: UtteranceLimits) -> Self {
        Self {
            limits,
            heard_speech: false,
            silence_secs: 0.0,
            elapsed_secs: 0.0,
        }
    }

    pub fn heard_speech(&self) -> bool {
        self.heard_speech
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed_secs
    }

    /// Account for one chunk of `chunk_secs` the VAD classified
    pub fn push(&mut self, is_speech: bool, chunk_secs: f32) -> UtteranceStatus {
        self.elapsed_secs += chunk_secs;

        if is_speech {
            self.heard_speech = true;
            self.silence_secs = 0.0;
        } else {
            self.silence_secs += chunk_secs;
        }

        if self.heard_speech {
            if self.silence_secs >= self.limits.end_silence_secs
                || self.elapsed_secs >= self.limits.max_utterance_secs
            {
                return UtteranceStatus::Complete;
            }
        } else if self.elapsed_secs >= self.limits.no_speech_timeout_secs {
            return UtteranceStatus::NoSpeech;
        }

        UtteranceStatus::Continue
    }
}
