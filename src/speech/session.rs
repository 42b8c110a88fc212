use super::recognizer::{
    PermissionState, SpeechErrorKind, SpeechEvent, SpeechRecognizer, SpeechState,
};
use crate::utils::{event_channel, EventSink, RepaintSignal};
use crossbeam_channel::Receiver;
use tracing::{debug, info, warn};

pub const UNSUPPORTED_MESSAGE: &str = "Sorry, your platform doesn't support speech recognition.";

pub const PERMISSION_DENIED_MESSAGE: &str = "Microphone access is blocked. To use voice input, \
     please allow this application to use the microphone in your system's privacy settings.";

pub const START_FAILED_MESSAGE: &str =
    "Could not start voice recognition. Please ensure your microphone is working correctly.";

/// Text shown for a recognition error reported mid-session
pub fn error_message(kind: &SpeechErrorKind) -> String {
    if kind.is_permission_denied() {
        PERMISSION_DENIED_MESSAGE.to_string()
    } else {
        format!("An error occurred: {}. Please try again.", kind.code())
    }
}

/// What the input control has to react to after draining events
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechUpdate {
    /// Capture began; the text box should be cleared
    Started,
    /// A non-blank transcript ready to submit as a user turn
    Transcript(String),
}

/// The single speech-recognition session behind the mic button
///
/// Every attempt gets its own event channel. Starting a new attempt drops
/// the previous receiver, so late events from an older attempt never reach
/// the current one.
pub struct SpeechSession {
    recognizer: Box<dyn SpeechRecognizer>,
    repaint: RepaintSignal,
    state: SpeechState,
    error: Option<String>,
    attempt: Option<Receiver<SpeechEvent>>,
}

impl SpeechSession {
    pub fn new(recognizer: Box<dyn SpeechRecognizer>, repaint: RepaintSignal) -> Self {
        Self {
            recognizer,
            repaint,
            state: SpeechState::Idle,
            error: None,
            attempt: None,
        }
    }

    pub fn state(&self) -> SpeechState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == SpeechState::Listening
    }

    pub fn is_supported(&self) -> bool {
        self.recognizer.is_supported()
    }

    /// Message for the mic error banner, if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Mic button: stop when listening, otherwise try to start
    pub fn toggle(&mut self) {
        if self.is_listening() {
            self.stop();
            return;
        }

        self.error = None;

        if !self.recognizer.is_supported() {
            info!("Speech recognition unavailable");
            self.error = Some(UNSUPPORTED_MESSAGE.to_string());
            return;
        }

        match self.recognizer.permission_state() {
            Ok(PermissionState::Denied) => {
                warn!("Microphone permission denied");
                self.error = Some(PERMISSION_DENIED_MESSAGE.to_string());
                return;
            }
            Ok(state) => debug!("Microphone permission: {:?}", state),
            Err(e) => warn!("Could not query microphone permission: {}", e),
        }

        let (events, attempt): (EventSink<SpeechEvent>, _) =
            event_channel(64, self.repaint.clone());
        self.attempt = None;
        match self.recognizer.start(events) {
            Ok(()) => {
                info!("Speech recognition started");
                self.attempt = Some(attempt);
                self.state = SpeechState::Listening;
            }
            Err(e) => {
                warn!("Failed to start speech recognition: {}", e);
                self.error = Some(START_FAILED_MESSAGE.to_string());
                self.state = SpeechState::Idle;
            }
        }
    }

    /// Ask the active attempt to finish
    pub fn stop(&mut self) {
        if self.is_listening() {
            debug!("Stopping speech recognition");
            self.recognizer.stop();
        }
    }

    /// Drain the current attempt's events and update the session state
    pub fn poll(&mut self) -> Vec<SpeechUpdate> {
        let mut updates = Vec::new();
        let events: Vec<SpeechEvent> = match &self.attempt {
            Some(rx) => rx.try_iter().collect(),
            None => return updates,
        };

        for event in events {
            match event {
                SpeechEvent::Started => {
                    self.state = SpeechState::Listening;
                    updates.push(SpeechUpdate::Started);
                }
                SpeechEvent::Result(transcript) => {
                    let transcript = transcript.trim();
                    if transcript.is_empty() {
                        debug!("Ignoring blank transcript");
                    } else {
                        updates.push(SpeechUpdate::Transcript(transcript.to_string()));
                    }
                }
                SpeechEvent::Error(kind) => {
                    warn!("Speech recognition error: {}", kind.code());
                    self.error = Some(error_message(&kind));
                    self.state = SpeechState::Error;
                }
                SpeechEvent::End => {
                    debug!("Speech recognition ended");
                    self.state = SpeechState::Idle;
                    self.attempt = None;
                    self.recognizer.release();
                    break;
                }
            }
        }

        updates
    }
}

impl Drop for SpeechSession {
    fn drop(&mut self) {
        self.recognizer.stop();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::{Result, SampuranaError};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Shared view of what a [`FakeRecognizer`] was asked to do
    #[derive(Default)]
    pub struct FakeControls {
        pub starts: Mutex<usize>,
        pub stops: Mutex<usize>,
        pub releases: Mutex<usize>,
        pub sink: Mutex<Option<EventSink<SpeechEvent>>>,
    }

    impl FakeControls {
        pub fn emit(&self, event: SpeechEvent) {
            if let Some(sink) = self.sink.lock().as_ref() {
                sink.send(event);
            }
        }
    }

    pub struct FakeRecognizer {
        pub supported: bool,
        pub permission: Result<PermissionState>,
        pub fail_start: bool,
        pub controls: Arc<FakeControls>,
    }

    impl FakeRecognizer {
        pub fn working() -> (Self, Arc<FakeControls>) {
            let controls = Arc::new(FakeControls::default());
            (
                Self {
                    supported: true,
                    permission: Ok(PermissionState::Granted),
                    fail_start: false,
                    controls: Arc::clone(&controls),
                },
                controls,
            )
        }
    }

    impl SpeechRecognizer for FakeRecognizer {
        fn is_supported(&self) -> bool {
            self.supported
        }

        fn permission_state(&self) -> Result<PermissionState> {
            self.permission.clone()
        }

        fn start(&mut self, events: EventSink<SpeechEvent>) -> Result<()> {
            if self.fail_start {
                return Err(SampuranaError::AudioDeviceError("busy".into()));
            }
            *self.controls.starts.lock() += 1;
            events.send(SpeechEvent::Started);
            *self.controls.sink.lock() = Some(events);
            Ok(())
        }

        fn stop(&mut self) {
            *self.controls.stops.lock() += 1;
            self.controls.emit(SpeechEvent::End);
        }

        fn release(&mut self) {
            *self.controls.releases.lock() += 1;
        }
    }
}
