use crate::audio::UtteranceLimits;
use crate::{Result, SampuranaError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

#[cfg(feature = "audio-io")]
pub use capture::WhisperRecognizer;

/// Configuration for local speech recognition
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechConfig {
    /// Path to the Whisper model file
    pub model_path: PathBuf,

    /// Language to transcribe (None for auto-detection)
    pub language: Option<String>,

    /// Number of threads to use for transcription
    pub n_threads: i32,

    /// VAD speech probability (0.0-1.0) a chunk must reach to count as speech
    pub vad_threshold: f32,

    /// Trailing silence that ends an utterance (seconds)
    pub end_silence_secs: f32,

    /// Give up when nobody speaks for this long (seconds)
    pub no_speech_timeout_secs: f32,

    /// Maximum utterance length (seconds)
    pub max_utterance_secs: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        let limits = UtteranceLimits::default();
        Self {
            model_path: PathBuf::from("models/ggml-base.en.bin"),
            language: Some("en".to_string()),
            n_threads: 4,
            vad_threshold: 0.5,
            end_silence_secs: limits.end_silence_secs,
            no_speech_timeout_secs: limits.no_speech_timeout_secs,
            max_utterance_secs: limits.max_utterance_secs,
        }
    }
}

impl SpeechConfig {
    pub fn limits(&self) -> UtteranceLimits {
        UtteranceLimits {
            end_silence_secs: self.end_silence_secs,
            no_speech_timeout_secs: self.no_speech_timeout_secs,
            max_utterance_secs: self.max_utterance_secs,
        }
    }

    /// Whether a model file is present to transcribe with
    pub fn model_available(&self) -> bool {
        self.model_path.is_file()
    }
}

/// Whisper speech-to-text engine
pub struct WhisperEngine {
    config: SpeechConfig,
    context: WhisperContext,
}

impl WhisperEngine {
    /// Load the model named in `config`
    pub fn new(config: SpeechConfig) -> Result<Self> {
        info!("Loading Whisper model from: {:?}", config.model_path);

        if !config.model_available() {
            return Err(SampuranaError::ModelLoadError(format!(
                "Model file not found: {:?}",
                config.model_path
            )));
        }

        let path = config
            .model_path
            .to_str()
            .ok_or_else(|| SampuranaError::ModelLoadError("Invalid model path".to_string()))?;

        let context = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .map_err(|e| {
                SampuranaError::ModelLoadError(format!("Failed to load Whisper model: {:?}", e))
            })?;

        info!("Whisper model loaded successfully");
        Ok(Self { config, context })
    }

    /// Transcribe 16 kHz mono samples into trimmed text
    pub fn transcribe(&self, samples: &[f32]) -> Result<String> {
        if samples.is_empty() {
            return Err(SampuranaError::TranscriptionError(
                "Empty audio segment".to_string(),
            ));
        }

        debug!(
            "Transcribing {} samples ({:.2}s)",
            samples.len(),
            samples.len() as f32 / crate::audio::WHISPER_SAMPLE_RATE as f32
        );

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_n_threads(self.config.n_threads);
        params.set_translate(false);
        params.set_print_timestamps(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_single_segment(true);

        if let Some(ref lang) = self.config.language {
            params.set_language(Some(lang));
        }

        let mut state = self.context.create_state().map_err(|e| {
            SampuranaError::TranscriptionError(format!("Failed to create state: {:?}", e))
        })?;

        state.full(params, samples).map_err(|e| {
            SampuranaError::TranscriptionError(format!("Transcription failed: {:?}", e))
        })?;

        let num_segments = state.full_n_segments().map_err(|e| {
            SampuranaError::TranscriptionError(format!("Failed to get segments: {:?}", e))
        })?;

        let mut text = String::new();
        for i in 0..num_segments {
            let segment_text = state.full_get_segment_text(i).map_err(|e| {
                SampuranaError::TranscriptionError(format!("Failed to get segment text: {:?}", e))
            })?;
            text.push_str(&segment_text);
        }

        let text = text.trim().to_string();
        debug!("Transcription result: '{}'", text);
        Ok(text)
    }
}

#[cfg(feature = "audio-io")]
mod capture {
    use super::{SpeechConfig, WhisperEngine};
    use crate::audio::{
        prepare_for_whisper, probe_default_input, AudioInput, DeviceAccess, StreamResampler,
        UtteranceDetector, UtteranceLimits, UtteranceStatus, VoiceActivityDetector,
        VAD_CHUNK_SIZE, WHISPER_SAMPLE_RATE,
    };
    use crate::speech::recognizer::{
        PermissionState, SpeechErrorKind, SpeechEvent, SpeechRecognizer,
    };
    use crate::utils::EventSink;
    use crate::{Result, SampuranaError};
    use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread::{self, JoinHandle};
    use std::time::Duration;
    use tracing::{debug, error, info, warn};

    /// A finished recording waiting for the model
    struct TranscriptionJob {
        samples: Vec<f32>,
        sample_rate: u32,
        events: EventSink<SpeechEvent>,
    }

    /// Whisper-backed recognizer listening on the default microphone
    ///
    /// Each attempt records a single utterance on its own capture thread,
    /// which opens the device and owns the audio stream for its whole life.
    /// The finished recording goes to a long-lived transcription thread
    /// that owns the model, so the model loads once on first use.
    pub struct WhisperRecognizer {
        config: SpeechConfig,
        stop_requested: Arc<AtomicBool>,
        capture_worker: Option<JoinHandle<()>>,
        transcriber: Option<Sender<TranscriptionJob>>,
    }

    impl WhisperRecognizer {
        pub fn new(config: SpeechConfig) -> Self {
            Self {
                config,
                stop_requested: Arc::new(AtomicBool::new(false)),
                capture_worker: None,
                transcriber: None,
            }
        }

        fn transcriber(&mut self) -> Result<Sender<TranscriptionJob>> {
            if let Some(tx) = &self.transcriber {
                return Ok(tx.clone());
            }

            let (tx, rx) = bounded::<TranscriptionJob>(4);
            let config = self.config.clone();
            thread::Builder::new()
                .name("speech-transcriber".into())
                .spawn(move || run_transcriber(config, rx))
                .map_err(|e| {
                    SampuranaError::ChannelError(format!("Failed to spawn transcriber: {}", e))
                })?;

            self.transcriber = Some(tx.clone());
            Ok(tx)
        }
    }

    impl SpeechRecognizer for WhisperRecognizer {
        fn is_supported(&self) -> bool {
            self.config.model_available()
        }

        fn permission_state(&self) -> Result<PermissionState> {
            match probe_default_input() {
                DeviceAccess::Available => Ok(PermissionState::Granted),
                DeviceAccess::Blocked => Ok(PermissionState::Denied),
                DeviceAccess::Missing => Err(SampuranaError::AudioDeviceError(
                    "No input device available".into(),
                )),
            }
        }

        fn start(&mut self, events: EventSink<SpeechEvent>) -> Result<()> {
            self.release();

            let stop = Arc::new(AtomicBool::new(false));
            let setup = CaptureSetup {
                limits: self.config.limits(),
                vad_threshold: self.config.vad_threshold,
                stop: Arc::clone(&stop),
                transcriber: self.transcriber()?,
                events,
            };

            let (ready_tx, ready_rx) = bounded::<Result<()>>(1);
            let worker = thread::Builder::new()
                .name("speech-capture".into())
                .spawn(move || match CaptureJob::open(setup) {
                    Ok((input, job)) => {
                        let _ = ready_tx.send(Ok(()));
                        job.run(input);
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                })
                .map_err(|e| {
                    SampuranaError::ChannelError(format!("Failed to spawn capture worker: {}", e))
                })?;

            match ready_rx.recv() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    let _ = worker.join();
                    return Err(e);
                }
                Err(_) => {
                    return Err(SampuranaError::AudioDeviceError(
                        "Capture worker exited before starting".into(),
                    ))
                }
            }

            self.stop_requested = stop;
            self.capture_worker = Some(worker);
            Ok(())
        }

        fn stop(&mut self) {
            self.stop_requested.store(true, Ordering::SeqCst);
        }

        fn release(&mut self) {
            self.stop_requested.store(true, Ordering::SeqCst);
            if let Some(worker) = self.capture_worker.take() {
                // An unfinished worker notices the stop flag within one poll
                if worker.is_finished() {
                    let _ = worker.join();
                }
            }
        }
    }

    impl Drop for WhisperRecognizer {
        fn drop(&mut self) {
            self.release();
        }
    }

    /// What the capture thread needs from the recognizer
    struct CaptureSetup {
        limits: UtteranceLimits,
        vad_threshold: f32,
        stop: Arc<AtomicBool>,
        transcriber: Sender<TranscriptionJob>,
        events: EventSink<SpeechEvent>,
    }

    enum CaptureOutcome {
        Stopped,
        Utterance,
        NoSpeech,
        Failed,
    }

    struct CaptureJob {
        sample_rate: u32,
        audio_rx: Receiver<Vec<f32>>,
        resampler: StreamResampler,
        vad: VoiceActivityDetector,
        vad_buffer: Vec<f32>,
        detector: UtteranceDetector,
        stop: Arc<AtomicBool>,
        transcriber: Sender<TranscriptionJob>,
        events: EventSink<SpeechEvent>,
    }

    impl CaptureJob {
        /// Open the microphone and the VAD on the calling thread
        fn open(setup: CaptureSetup) -> Result<(AudioInput, Self)> {
            let mut input = AudioInput::new()?;
            let sample_rate = input.sample_rate();
            let vad = VoiceActivityDetector::new(setup.vad_threshold)?;
            let resampler = StreamResampler::new(sample_rate, WHISPER_SAMPLE_RATE)?;

            let (audio_tx, audio_rx) = bounded(512);
            input.start(audio_tx)?;

            let job = Self {
                sample_rate,
                audio_rx,
                resampler,
                vad,
                vad_buffer: Vec::with_capacity(VAD_CHUNK_SIZE * 2),
                detector: UtteranceDetector::new(setup.limits),
                stop: setup.stop,
                transcriber: setup.transcriber,
                events: setup.events,
            };
            Ok((input, job))
        }

        /// Run the VAD over one capture block
        fn detect(&mut self, block: &[f32]) -> Result<UtteranceStatus> {
            let resampled = self.resampler.push(block)?;
            self.vad_buffer.extend_from_slice(&resampled);

            while self.vad_buffer.len() >= VAD_CHUNK_SIZE {
                let chunk: Vec<f32> = self.vad_buffer.drain(..VAD_CHUNK_SIZE).collect();
                let is_speech = self.vad.is_speech(&chunk);
                match self
                    .detector
                    .push(is_speech, VoiceActivityDetector::chunk_secs())
                {
                    UtteranceStatus::Continue => {}
                    status => return Ok(status),
                }
            }
            Ok(UtteranceStatus::Continue)
        }

        fn run(mut self, input: AudioInput) {
            self.events.send(SpeechEvent::Started);
            let mut recording = Vec::new();

            let outcome = loop {
                if self.stop.load(Ordering::SeqCst) {
                    break CaptureOutcome::Stopped;
                }
                match self.audio_rx.recv_timeout(Duration::from_millis(50)) {
                    Ok(block) => {
                        recording.extend_from_slice(&block);
                        match self.detect(&block) {
                            Ok(UtteranceStatus::Continue) => {}
                            Ok(UtteranceStatus::Complete) => break CaptureOutcome::Utterance,
                            Ok(UtteranceStatus::NoSpeech) => break CaptureOutcome::NoSpeech,
                            Err(e) => {
                                warn!("Voice activity detection failed: {}", e);
                                break CaptureOutcome::Failed;
                            }
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => {
                        warn!("Audio stream closed during capture");
                        break CaptureOutcome::Failed;
                    }
                }
            };

            drop(input);
            debug!(
                "Capture finished after {:.2}s, speech heard: {}",
                self.detector.elapsed_secs(),
                self.detector.heard_speech()
            );

            match outcome {
                CaptureOutcome::NoSpeech => {
                    self.events.send(SpeechEvent::Error(SpeechErrorKind::NoSpeech));
                }
                CaptureOutcome::Failed => {
                    self.events
                        .send(SpeechEvent::Error(SpeechErrorKind::AudioCapture));
                }
                CaptureOutcome::Stopped | CaptureOutcome::Utterance => {
                    if self.detector.heard_speech() {
                        let job = TranscriptionJob {
                            samples: recording,
                            sample_rate: self.sample_rate,
                            events: self.events.clone(),
                        };
                        // The transcriber sends End once it has a result
                        match self.transcriber.send(job) {
                            Ok(()) => return,
                            Err(e) => {
                                error!("Transcriber unavailable: {}", e);
                                self.events
                                    .send(SpeechEvent::Error(SpeechErrorKind::ModelUnavailable));
                            }
                        }
                    }
                }
            }

            self.events.send(SpeechEvent::End);
        }
    }

    fn run_transcriber(config: SpeechConfig, jobs: Receiver<TranscriptionJob>) {
        info!("Transcription worker started");
        let mut engine: Option<WhisperEngine> = None;

        while let Ok(job) = jobs.recv() {
            if engine.is_none() {
                match WhisperEngine::new(config.clone()) {
                    Ok(loaded) => engine = Some(loaded),
                    Err(e) => error!("Failed to initialize Whisper engine: {}", e),
                }
            }

            let outcome = match engine.as_ref() {
                None => Err(SpeechErrorKind::ModelUnavailable),
                Some(engine) => transcribe_job(engine, &job),
            };

            match outcome {
                Ok(text) if text.is_empty() => {
                    job.events.send(SpeechEvent::Error(SpeechErrorKind::NoSpeech));
                }
                Ok(text) => {
                    job.events.send(SpeechEvent::Result(text));
                }
                Err(kind) => {
                    job.events.send(SpeechEvent::Error(kind));
                }
            }
            job.events.send(SpeechEvent::End);
        }

        info!("Transcription worker stopped");
    }

    fn transcribe_job(
        engine: &WhisperEngine,
        job: &TranscriptionJob,
    ) -> std::result::Result<String, SpeechErrorKind> {
        let samples = prepare_for_whisper(&job.samples, job.sample_rate).map_err(|e| {
            warn!("Failed to prepare recording: {}", e);
            SpeechErrorKind::AudioCapture
        })?;

        engine.transcribe(&samples).map_err(|e| {
            warn!("Transcription error: {}", e);
            SpeechErrorKind::TranscriptionFailed
        })
    }
}
