//! Application state management
//!
//! This module provides the central state for the chat UI. It is only ever
//! touched from the UI thread; workers reach it through event channels.

use crate::llm::{stream_error_message, LLMCommand, LLMEvent, SessionHandle, PLACEHOLDER};
use crate::messages::{Conversation, Message, Role};
use crate::speech::{SpeechSession, SpeechUpdate};
use crate::SampuranaError;
use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// The model reply currently streaming in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingReply {
    request_id: Uuid,
    /// Whether the placeholder has been replaced by real text yet
    received: bool,
}

/// Central application state
pub struct AppState {
    /// The conversation shown in the message list
    pub messages: Conversation,

    /// Current text input
    pub input_text: String,

    /// A reply is in flight
    pub is_loading: bool,

    /// Chat error banner
    pub error: Option<String>,

    /// The "start a new chat?" dialog is open
    pub confirm_reset: bool,

    /// Mic button session
    pub speech: SpeechSession,

    /// Time to first fragment of the last completed reply
    pub last_first_fragment_ms: Option<u64>,

    greeting: String,
    session: Option<SessionHandle>,
    session_ready: bool,
    pending: Option<PendingReply>,

    llm_command_tx: Option<Sender<LLMCommand>>,
    llm_event_rx: Option<Receiver<LLMEvent>>,
}

impl AppState {
    pub fn new(greeting: impl Into<String>, speech: SpeechSession) -> Self {
        Self {
            messages: Conversation::new(),
            input_text: String::new(),
            is_loading: false,
            error: None,
            confirm_reset: false,
            speech,
            last_first_fragment_ms: None,
            greeting: greeting.into(),
            session: None,
            session_ready: false,
            pending: None,
            llm_command_tx: None,
            llm_event_rx: None,
        }
    }

    /// Attach the chat pipeline channels
    pub fn connect(&mut self, commands: Sender<LLMCommand>, events: Receiver<LLMEvent>) {
        self.llm_command_tx = Some(commands);
        self.llm_event_rx = Some(events);
    }

    pub fn session(&self) -> Option<SessionHandle> {
        self.session
    }

    pub fn session_ready(&self) -> bool {
        self.session_ready
    }

    /// Start over: fresh session, greeting only, no error
    pub fn initialize_chat(&mut self) {
        let handle = SessionHandle::new();
        if let Some(old) = self.session.replace(handle) {
            debug!("Discarding session {}", old);
        }
        self.session_ready = false;
        self.pending = None;
        self.is_loading = false;
        self.error = None;
        self.messages.reset_with(Message::model(self.greeting.clone()));

        if let Err(e) = self.dispatch(LLMCommand::NewSession(handle)) {
            self.error = Some(e.user_message());
        } else {
            info!("Opening chat session {}", handle);
        }
    }

    /// Whether a new user turn would be accepted right now
    pub fn can_send(&self) -> bool {
        self.session_ready && !self.is_loading
    }

    /// Send a user turn; returns whether it was dispatched
    ///
    /// Does nothing without a ready session, while a reply is loading, or
    /// for blank text. Non-blank text is sent as typed.
    pub fn send_message(&mut self, text: &str) -> bool {
        if text.trim().is_empty() || !self.can_send() {
            return false;
        }
        let Some(session) = self.session else {
            return false;
        };

        let request_id = Uuid::new_v4();
        let command = LLMCommand::Send {
            session,
            request_id,
            text: text.to_string(),
        };
        if let Err(e) = self.dispatch(command) {
            self.error = Some(e.user_message());
            return false;
        }

        self.is_loading = true;
        self.error = None;
        self.messages.push(Message::user(text));
        self.messages.push(Message::model(PLACEHOLDER));
        self.pending = Some(PendingReply {
            request_id,
            received: false,
        });
        true
    }

    /// Submit the text box contents
    pub fn submit_input(&mut self) -> bool {
        let text = self.input_text.clone();
        let sent = self.send_message(&text);
        if sent {
            self.input_text.clear();
            self.speech.clear_error();
        }
        sent
    }

    /// Whether the text box should be enabled
    pub fn input_enabled(&self) -> bool {
        !self.is_loading && !self.speech.is_listening()
    }

    /// Whether the send button should be enabled
    pub fn send_enabled(&self) -> bool {
        self.input_enabled() && self.session_ready && !self.input_text.trim().is_empty()
    }

    /// Open the confirmation dialog for a new chat
    pub fn request_reset(&mut self) {
        self.confirm_reset = true;
    }

    pub fn confirm_reset(&mut self) {
        self.confirm_reset = false;
        self.speech.stop();
        self.initialize_chat();
    }

    pub fn cancel_reset(&mut self) {
        self.confirm_reset = false;
    }

    /// Mic button
    pub fn toggle_speech(&mut self) {
        if self.is_loading && !self.speech.is_listening() {
            return;
        }
        self.speech.toggle();
    }

    /// Drain pipeline and recognizer events
    pub fn poll_events(&mut self) {
        let events: Vec<LLMEvent> = match &self.llm_event_rx {
            Some(rx) => rx.try_iter().collect(),
            None => Vec::new(),
        };
        for event in events {
            self.handle_llm_event(event);
        }

        for update in self.speech.poll() {
            match update {
                SpeechUpdate::Started => self.input_text.clear(),
                SpeechUpdate::Transcript(text) => {
                    self.input_text = text;
                    if !self.submit_input() {
                        debug!("Transcript kept in the input box");
                    }
                }
            }
        }
    }

    /// Apply one pipeline event
    pub fn handle_llm_event(&mut self, event: LLMEvent) {
        match event {
            LLMEvent::SessionReady { session } => {
                if self.is_current(session) {
                    debug!("Session {} ready", session);
                    self.session_ready = true;
                }
            }
            LLMEvent::SessionFailed { session, error } => {
                if self.is_current(session) {
                    warn!("Session {} failed: {}", session, error);
                    self.session_ready = false;
                    self.error = Some(error.to_string());
                }
            }
            LLMEvent::Fragment {
                session,
                request_id,
                text,
            } => {
                let Some(pending) = self.pending_for(session, request_id) else {
                    return;
                };
                if pending.received {
                    self.messages.append_to_last(&text);
                } else {
                    self.messages.replace_last(&text);
                    self.pending = Some(PendingReply {
                        received: true,
                        ..pending
                    });
                }
            }
            LLMEvent::Complete {
                session,
                request_id,
                full_response,
                first_fragment_ms,
                total_ms,
            } => {
                let Some(pending) = self.pending_for(session, request_id) else {
                    return;
                };
                debug!(
                    "Reply {} complete: {} chars, first fragment {:?}ms, total {}ms",
                    request_id,
                    full_response.len(),
                    first_fragment_ms,
                    total_ms
                );
                if !pending.received {
                    self.drop_placeholder();
                }
                self.last_first_fragment_ms = first_fragment_ms;
                self.finish_reply();
            }
            LLMEvent::Error {
                session,
                request_id,
                error,
            } => {
                let Some(pending) = self.pending_for(session, request_id) else {
                    return;
                };
                if !pending.received {
                    self.drop_placeholder();
                }
                self.show_stream_error(&error);
                self.finish_reply();
            }
            LLMEvent::Shutdown => {
                info!("Chat pipeline shut down");
                self.session_ready = false;
            }
        }
    }

    fn is_current(&self, session: SessionHandle) -> bool {
        let current = self.session == Some(session);
        if !current {
            debug!("Ignoring event for stale session {}", session);
        }
        current
    }

    fn pending_for(&self, session: SessionHandle, request_id: Uuid) -> Option<PendingReply> {
        if !self.is_current(session) {
            return None;
        }
        self.pending.filter(|pending| pending.request_id == request_id)
    }

    fn drop_placeholder(&mut self) {
        let is_placeholder = self
            .messages
            .last()
            .map(|m| m.role == Role::Model && m.content == PLACEHOLDER)
            .unwrap_or(false);
        if is_placeholder {
            self.messages.pop();
        }
    }

    fn show_stream_error(&mut self, error: &SampuranaError) {
        let message = stream_error_message(&error.to_string());
        self.messages.push(Message::model(message.clone()));
        self.error = Some(message);
    }

    fn finish_reply(&mut self) {
        self.pending = None;
        self.is_loading = false;
    }

    fn dispatch(&self, command: LLMCommand) -> crate::Result<()> {
        let tx = self
            .llm_command_tx
            .as_ref()
            .ok_or_else(|| SampuranaError::ChannelError("Chat pipeline not connected".into()))?;
        tx.send(command)
            .map_err(|e| SampuranaError::ChannelError(format!("Failed to send command: {}", e)))
    }
}
