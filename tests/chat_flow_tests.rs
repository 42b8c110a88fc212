//! End-to-end chat flow through the real pipeline worker
//!
//! A scripted `ChatBackend` stands in for Gemini and a scripted recognizer
//! stands in for the microphone.

use futures::{stream, StreamExt};
use parking_lot::Mutex;
use sampurana::llm::{
    ChatBackend, ChatConfig, ChatRequest, FragmentStream, LLMEvent, LLMPipeline, SessionHandle,
    GREETING,
};
use sampurana::messages::Role;
use sampurana::speech::{
    PermissionState, SpeechEvent, SpeechRecognizer, SpeechSession, UnsupportedRecognizer,
};
use sampurana::ui::AppState;
use sampurana::utils::{EventSink, RepaintSignal};
use sampurana::{Result, SampuranaError};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct ScriptedBackend {
    fragments: Vec<String>,
    failure: Option<SampuranaError>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    fn replying(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing_after(fragments: &[&str], error: SampuranaError) -> Self {
        Self {
            failure: Some(error),
            ..Self::replying(fragments)
        }
    }
}

impl ChatBackend for ScriptedBackend {
    fn stream_reply(&self, request: ChatRequest) -> FragmentStream {
        self.requests.lock().push(request);
        let mut items: Vec<Result<String>> = self.fragments.iter().cloned().map(Ok).collect();
        if let Some(error) = &self.failure {
            items.push(Err(error.clone()));
        }
        stream::iter(items).boxed()
    }
}

/// Recognizer that "hears" a fixed phrase as soon as it starts
struct ScriptedRecognizer {
    transcript: String,
    starts: Arc<Mutex<usize>>,
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn is_supported(&self) -> bool {
        true
    }

    fn permission_state(&self) -> Result<PermissionState> {
        Ok(PermissionState::Granted)
    }

    fn start(&mut self, events: EventSink<SpeechEvent>) -> Result<()> {
        *self.starts.lock() += 1;
        events.send(SpeechEvent::Started);
        events.send(SpeechEvent::Result(self.transcript.clone()));
        events.send(SpeechEvent::End);
        Ok(())
    }

    fn stop(&mut self) {}
}

fn quiet_speech() -> SpeechSession {
    SpeechSession::new(Box::new(UnsupportedRecognizer), RepaintSignal::new())
}

fn connected_state(backend: Option<ScriptedBackend>, speech: SpeechSession) -> AppState {
    let config = ChatConfig::default();
    let mut pipeline = LLMPipeline::new(config.clone(), RepaintSignal::new());
    if let Some(backend) = backend {
        pipeline = pipeline.with_backend(Arc::new(backend));
    }
    let commands = pipeline.command_sender();
    let events = pipeline.event_receiver();
    pipeline.start_worker().unwrap();

    let mut state = AppState::new(config.greeting, speech);
    state.connect(commands, events);
    state.initialize_chat();
    state
}

/// Poll until `done` holds or the deadline passes
fn pump(state: &mut AppState, done: impl Fn(&AppState) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        state.poll_events();
        if done(state) {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("condition not reached before timeout");
}

fn contents(state: &AppState) -> Vec<String> {
    state.messages.iter().map(|m| m.content.clone()).collect()
}

#[test]
fn test_streamed_reply_is_concatenation_of_fragments() {
    let backend = ScriptedBackend::replying(&["Hel", "lo", " wor", "ld"]);
    let mut state = connected_state(Some(backend), quiet_speech());
    pump(&mut state, AppState::session_ready);

    assert!(state.send_message("Hi there"));
    pump(&mut state, |s| !s.is_loading);

    assert_eq!(contents(&state), vec![GREETING, "Hi there", "Hello world"]);
    assert_eq!(state.messages.last().unwrap().role, Role::Model);
    assert!(state.error.is_none());
}

#[test]
fn test_history_grows_with_each_turn() {
    let backend = Arc::new(ScriptedBackend::replying(&["ok"]));
    let mut pipeline = LLMPipeline::new(ChatConfig::default(), RepaintSignal::new())
        .with_backend(Arc::clone(&backend) as Arc<dyn ChatBackend>);
    let commands = pipeline.command_sender();
    let events = pipeline.event_receiver();
    pipeline.start_worker().unwrap();

    let mut state = AppState::new("hi", quiet_speech());
    state.connect(commands, events);
    state.initialize_chat();
    pump(&mut state, AppState::session_ready);

    state.send_message("first");
    pump(&mut state, |s| !s.is_loading);
    state.send_message("second");
    pump(&mut state, |s| !s.is_loading);

    let requests = backend.requests.lock();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].turns.len(), 1);
    let texts: Vec<&str> = requests[1].turns.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "ok", "second"]);
}

#[test]
fn test_whitespace_input_is_a_no_op() {
    let backend = ScriptedBackend::replying(&["unused"]);
    let mut state = connected_state(Some(backend), quiet_speech());
    pump(&mut state, AppState::session_ready);

    state.input_text = "   \n\t ".to_string();
    assert!(!state.submit_input());
    assert!(!state.send_message(""));
    assert_eq!(state.messages.len(), 1);
    assert!(!state.is_loading);
    assert_eq!(state.input_text, "   \n\t ");
}

#[test]
fn test_submit_clears_input() {
    let backend = ScriptedBackend::replying(&["sure"]);
    let mut state = connected_state(Some(backend), quiet_speech());
    pump(&mut state, AppState::session_ready);

    state.input_text = "  tell me a story ".to_string();
    assert!(state.submit_input());
    assert!(state.input_text.is_empty());
    assert_eq!(state.messages.get_all()[1].content, "  tell me a story ");
    pump(&mut state, |s| !s.is_loading);
}

#[test]
fn test_stream_error_shows_banner_and_inline_message() {
    let backend = ScriptedBackend::failing_after(
        &["Partial"],
        SampuranaError::ApiError("UNAVAILABLE: overloaded".into()),
    );
    let mut state = connected_state(Some(backend), quiet_speech());
    pump(&mut state, AppState::session_ready);

    state.send_message("hello");
    pump(&mut state, |s| !s.is_loading);

    let expected =
        "Sorry, I encountered an error. Please try again. Error: UNAVAILABLE: overloaded";
    assert_eq!(state.error.as_deref(), Some(expected));
    assert_eq!(contents(&state), vec![GREETING, "hello", "Partial", expected]);

    // Still usable afterwards
    assert!(state.can_send());
}

#[test]
fn test_empty_reply_is_reported_and_not_sent_back() {
    let backend = Arc::new(ScriptedBackend::replying(&[]));
    let mut pipeline = LLMPipeline::new(ChatConfig::default(), RepaintSignal::new())
        .with_backend(Arc::clone(&backend) as Arc<dyn ChatBackend>);
    let commands = pipeline.command_sender();
    let events = pipeline.event_receiver();
    pipeline.start_worker().unwrap();

    let mut state = AppState::new(GREETING, quiet_speech());
    state.connect(commands, events);
    state.initialize_chat();
    pump(&mut state, AppState::session_ready);

    state.send_message("one");
    pump(&mut state, |s| !s.is_loading);

    let expected = "Sorry, I encountered an error. Please try again. Error: Empty response";
    assert_eq!(state.error.as_deref(), Some(expected));
    assert_eq!(contents(&state), vec![GREETING, "one", expected]);

    state.send_message("two");
    pump(&mut state, |s| !s.is_loading);

    let requests = backend.requests.lock();
    let texts: Vec<&str> = requests[1].turns.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["two"]);
}

#[test]
fn test_missing_api_key_disables_sending() {
    let mut state = connected_state(None, quiet_speech());
    pump(&mut state, |s| s.error.is_some());

    assert_eq!(
        state.error.as_deref(),
        Some("API_KEY environment variable not set.")
    );
    assert!(!state.can_send());
    assert!(!state.send_message("hello?"));
    assert_eq!(contents(&state), vec![GREETING]);
}

#[test]
fn test_reset_replaces_everything_with_one_greeting() {
    let backend = ScriptedBackend::replying(&["one"]);
    let mut state = connected_state(Some(backend), quiet_speech());
    pump(&mut state, AppState::session_ready);

    state.send_message("a");
    pump(&mut state, |s| !s.is_loading);
    assert_eq!(state.messages.len(), 3);

    let old_session = state.session().unwrap();
    state.request_reset();
    state.confirm_reset();

    assert_eq!(contents(&state), vec![GREETING]);
    assert_ne!(state.session(), Some(old_session));
    pump(&mut state, AppState::session_ready);
    assert_eq!(state.messages.len(), 1);
}

#[test]
fn test_events_for_discarded_session_are_ignored() {
    let backend = ScriptedBackend::replying(&["one"]);
    let mut state = connected_state(Some(backend), quiet_speech());
    pump(&mut state, AppState::session_ready);

    let stale = state.session().unwrap();
    state.initialize_chat();

    state.handle_llm_event(LLMEvent::Fragment {
        session: stale,
        request_id: uuid::Uuid::new_v4(),
        text: "ghost".into(),
    });
    state.handle_llm_event(LLMEvent::SessionFailed {
        session: stale,
        error: SampuranaError::MissingCredential,
    });
    state.handle_llm_event(LLMEvent::SessionReady {
        session: SessionHandle::new(),
    });

    assert_eq!(contents(&state), vec![GREETING]);
    assert!(state.error.is_none());
}

#[test]
fn test_voice_transcript_is_sent_as_user_turn() {
    let starts = Arc::new(Mutex::new(0));
    let recognizer = ScriptedRecognizer {
        transcript: " what's the weather ".into(),
        starts: Arc::clone(&starts),
    };
    let speech = SpeechSession::new(Box::new(recognizer), RepaintSignal::new());
    let backend = ScriptedBackend::replying(&["Sunny"]);
    let mut state = connected_state(Some(backend), speech);
    pump(&mut state, AppState::session_ready);

    state.toggle_speech();
    pump(&mut state, |s| s.messages.len() == 3 && !s.is_loading);

    assert_eq!(*starts.lock(), 1);
    assert_eq!(
        contents(&state),
        vec![GREETING, "what's the weather", "Sunny"]
    );
    assert!(!state.speech.is_listening());
    assert!(state.input_text.is_empty());
}
