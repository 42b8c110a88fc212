//! UI automation tests using egui_kittest and AccessKit
//!
//! The real components are rendered against an `AppState` whose pipeline
//! channels are held by the test, so pipeline events can be injected by hand.

use crossbeam_channel::{unbounded, Receiver, Sender};
use egui_kittest::kittest::Queryable;
use egui_kittest::Harness;
use sampurana::llm::{LLMCommand, LLMEvent, GREETING};
use sampurana::speech::{SpeechSession, UnsupportedRecognizer, UNSUPPORTED_MESSAGE};
use sampurana::ui::components::{Header, InputBar, MessageList, ResetDialog, SUBTITLE, TITLE};
use sampurana::ui::{AppState, Theme};
use sampurana::utils::RepaintSignal;
use sampurana::SampuranaError;
use uuid::Uuid;

struct TestApp {
    state: AppState,
    theme: Theme,
    commands: Receiver<LLMCommand>,
    _events: Sender<LLMEvent>,
}

impl TestApp {
    fn new() -> Self {
        let speech = SpeechSession::new(Box::new(UnsupportedRecognizer), RepaintSignal::new());
        let mut state = AppState::new(GREETING, speech);
        let (cmd_tx, cmd_rx) = unbounded();
        let (evt_tx, evt_rx) = unbounded();
        state.connect(cmd_tx, evt_rx);
        state.initialize_chat();
        Self {
            state,
            theme: Theme::dark(),
            commands: cmd_rx,
            _events: evt_tx,
        }
    }

    /// Mark the pending session as opened
    fn ready(mut self) -> Self {
        let session = self.state.session().unwrap();
        self.state
            .handle_llm_event(LLMEvent::SessionReady { session });
        self
    }

    fn sent_request(&self) -> Option<(Uuid, String)> {
        self.commands.try_iter().find_map(|command| match command {
            LLMCommand::Send {
                request_id, text, ..
            } => Some((request_id, text)),
            _ => None,
        })
    }
}

fn render(ctx: &egui::Context, app: &mut TestApp) {
    egui::TopBottomPanel::top("header").show(ctx, |ui| {
        Header::new(&mut app.state, &app.theme).show(ui);
    });
    egui::TopBottomPanel::bottom("input_area").show(ctx, |ui| {
        InputBar::new(&mut app.state, &app.theme).show(ui);
    });
    egui::CentralPanel::default().show(ctx, |ui| {
        MessageList::new(&app.state, &app.theme).show(ui);
    });
    ResetDialog::new(&mut app.state, &app.theme).show(ctx);
}

fn harness(app: TestApp) -> Harness<'static, TestApp> {
    let mut harness = Harness::builder()
        .with_size(egui::Vec2::new(600.0, 700.0))
        .build_state(render, app);
    harness.run();
    harness
}

fn type_message(harness: &mut Harness<'_, TestApp>, text: &str) {
    harness.get_by_label("Message input").focus();
    harness.run();
    harness.get_by_label("Message input").type_text(text);
    harness.run();
}

#[test]
fn test_header_is_rendered() {
    let harness = harness(TestApp::new());

    let _title = harness.get_by_label(TITLE);
    let _subtitle = harness.get_by_label(SUBTITLE);
    let _button = harness.get_by_label("New chat");
}

#[test]
fn test_greeting_is_first_message() {
    let harness = harness(TestApp::new());

    let label = format!("Model message: {}", GREETING);
    let _greeting = harness.get_by_label(&label);
    assert_eq!(harness.state().state.messages.len(), 1);
}

#[test]
fn test_type_and_send_message() {
    let mut harness = harness(TestApp::new().ready());

    type_message(&mut harness, "Hello Gemini");
    assert_eq!(harness.state().state.input_text, "Hello Gemini");

    harness.get_by_label("Send message").click();
    harness.run();

    let app = harness.state();
    let messages = app.state.messages.get_all();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].content, "Hello Gemini");
    assert!(app.state.is_loading);
    assert!(app.state.input_text.is_empty());
    assert_eq!(app.sent_request().map(|(_, text)| text).as_deref(), Some("Hello Gemini"));
}

#[test]
fn test_enter_submits_message() {
    let mut harness = harness(TestApp::new().ready());

    type_message(&mut harness, "Quick question");
    harness.input_mut().events.push(egui::Event::Key {
        key: egui::Key::Enter,
        physical_key: None,
        pressed: true,
        repeat: false,
        modifiers: egui::Modifiers::NONE,
    });
    harness.run();

    let messages = harness.state().state.messages.get_all();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].content, "Quick question");
}

#[test]
fn test_send_ignored_without_session() {
    let mut harness = harness(TestApp::new());

    type_message(&mut harness, "Anyone there?");
    harness.get_by_label("Send message").click();
    harness.run();

    assert_eq!(harness.state().state.messages.len(), 1);
    assert_eq!(harness.state().state.input_text, "Anyone there?");
}

#[test]
fn test_streamed_fragments_render_as_one_bubble() {
    let mut harness = harness(TestApp::new().ready());

    type_message(&mut harness, "Count to three");
    harness.get_by_label("Send message").click();
    harness.run();

    let (request_id, _) = harness.state().sent_request().unwrap();
    let session = harness.state().state.session().unwrap();
    for text in ["One, ", "two, ", "three."] {
        harness.state_mut().state.handle_llm_event(LLMEvent::Fragment {
            session,
            request_id,
            text: text.into(),
        });
    }
    harness.state_mut().state.handle_llm_event(LLMEvent::Complete {
        session,
        request_id,
        full_response: "One, two, three.".into(),
        first_fragment_ms: Some(5),
        total_ms: 20,
    });
    harness.run();

    let _reply = harness.get_by_label("Model message: One, two, three.");
    let _user = harness.get_by_label("User message: Count to three");
    assert!(!harness.state().state.is_loading);
}

#[test]
fn test_error_banner_is_shown() {
    let mut harness = harness(TestApp::new());

    let session = harness.state().state.session().unwrap();
    harness.state_mut().state.handle_llm_event(LLMEvent::SessionFailed {
        session,
        error: SampuranaError::MissingCredential,
    });
    harness.run();

    let _banner = harness.get_by_label("Error: API_KEY environment variable not set.");
}

#[test]
fn test_new_chat_confirm_clears_conversation() {
    let mut harness = harness(TestApp::new().ready());

    type_message(&mut harness, "Remember this");
    harness.get_by_label("Send message").click();
    harness.run();
    assert_eq!(harness.state().state.messages.len(), 3);

    harness.get_by_label("New chat").click();
    harness.run();
    assert!(harness.state().state.confirm_reset);

    harness.get_by_label("Confirm").click();
    harness.run();

    let state = &harness.state().state;
    assert!(!state.confirm_reset);
    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.messages.get_all()[0].content, GREETING);
    assert!(!state.is_loading);
}

#[test]
fn test_new_chat_cancel_keeps_conversation() {
    let mut harness = harness(TestApp::new().ready());

    type_message(&mut harness, "Keep me");
    harness.get_by_label("Send message").click();
    harness.run();

    harness.get_by_label("New chat").click();
    harness.run();
    harness.get_by_label("Cancel").click();
    harness.run();

    let state = &harness.state().state;
    assert!(!state.confirm_reset);
    assert_eq!(state.messages.len(), 3);
}

#[test]
fn test_mic_without_speech_support_shows_message() {
    let mut harness = harness(TestApp::new().ready());

    harness.get_by_label("Start recording").click();
    harness.run();

    let label = format!("Microphone error: {}", UNSUPPORTED_MESSAGE);
    let _error = harness.get_by_label(&label);
    assert!(!harness.state().state.speech.is_listening());

    // Typing clears the mic error
    type_message(&mut harness, "x");
    assert!(harness.state().state.speech.error().is_none());
}
