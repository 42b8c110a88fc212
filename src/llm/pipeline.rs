//! Chat pipeline for managing sessions and streaming responses
//!
//! A worker thread owns the tokio runtime and the current [`ChatSession`].
//! The UI talks to it through a command channel and drains events from an
//! [`EventSink`]-backed receiver once per frame.

use crate::llm::client::ChatBackend;
use crate::llm::config::ChatConfig;
use crate::llm::session::{ChatSession, SessionHandle};
use crate::utils::{event_channel, EventSink, RepaintSignal};
use crate::{Result, SampuranaError};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Commands that can be sent to the chat pipeline
#[derive(Debug, Clone)]
pub enum LLMCommand {
    /// Discard the current session and open a new one under this handle
    NewSession(SessionHandle),

    /// Send a user turn on the given session
    Send {
        session: SessionHandle,
        request_id: Uuid,
        text: String,
    },

    /// Shutdown the pipeline
    Shutdown,
}

/// Events emitted by the chat pipeline
#[derive(Debug, Clone)]
pub enum LLMEvent {
    /// The session is open and accepts messages
    SessionReady { session: SessionHandle },

    /// The session could not be opened
    SessionFailed {
        session: SessionHandle,
        error: SampuranaError,
    },

    /// A piece of the reply arrived
    Fragment {
        session: SessionHandle,
        request_id: Uuid,
        text: String,
    },

    /// The reply stream closed normally
    Complete {
        session: SessionHandle,
        request_id: Uuid,
        full_response: String,
        /// Time to first fragment in milliseconds
        first_fragment_ms: Option<u64>,
        /// Total stream time in milliseconds
        total_ms: u64,
    },

    /// The request or stream failed
    Error {
        session: SessionHandle,
        request_id: Uuid,
        error: SampuranaError,
    },

    /// Pipeline has shut down
    Shutdown,
}

/// Chat pipeline with channel-based communication
pub struct LLMPipeline {
    config: ChatConfig,
    backend: Option<Arc<dyn ChatBackend>>,
    command_tx: Sender<LLMCommand>,
    command_rx: Receiver<LLMCommand>,
    event_sink: EventSink<LLMEvent>,
    event_rx: Receiver<LLMEvent>,
}

impl LLMPipeline {
    /// Create a pipeline that opens Gemini sessions from `config`
    pub fn new(config: ChatConfig, repaint: RepaintSignal) -> Self {
        let (command_tx, command_rx) = bounded(100);
        let (event_sink, event_rx) = event_channel(256, repaint);

        Self {
            config,
            backend: None,
            command_tx,
            command_rx,
            event_sink,
            event_rx,
        }
    }

    /// Serve every session from `backend` instead of the Gemini API
    ///
    /// No credential check is made in this mode.
    pub fn with_backend(mut self, backend: Arc<dyn ChatBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Get a sender for commands
    pub fn command_sender(&self) -> Sender<LLMCommand> {
        self.command_tx.clone()
    }

    /// Get a receiver for events
    pub fn event_receiver(&self) -> Receiver<LLMEvent> {
        self.event_rx.clone()
    }

    /// Start the pipeline worker thread
    pub fn start_worker(self) -> Result<JoinHandle<()>> {
        let Self {
            config,
            backend,
            command_rx,
            event_sink,
            ..
        } = self;

        std::thread::Builder::new()
            .name("chat-pipeline".into())
            .spawn(move || Worker::new(config, backend, event_sink).run(command_rx))
            .map_err(|e| SampuranaError::ChannelError(format!("Failed to spawn chat worker: {}", e)))
    }
}

struct Worker {
    config: ChatConfig,
    backend: Option<Arc<dyn ChatBackend>>,
    events: EventSink<LLMEvent>,
    session: Option<ChatSession>,
}

impl Worker {
    fn new(
        config: ChatConfig,
        backend: Option<Arc<dyn ChatBackend>>,
        events: EventSink<LLMEvent>,
    ) -> Self {
        Self {
            config,
            backend,
            events,
            session: None,
        }
    }

    fn run(mut self, command_rx: Receiver<LLMCommand>) {
        info!("Chat pipeline worker starting");

        let runtime = match Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                error!("Failed to create tokio runtime: {}", e);
                self.events.send(LLMEvent::Shutdown);
                return;
            }
        };

        loop {
            match command_rx.recv() {
                Ok(LLMCommand::NewSession(handle)) => self.open_session(handle),

                Ok(LLMCommand::Send {
                    session,
                    request_id,
                    text,
                }) => self.send(&runtime, session, request_id, &text),

                Ok(LLMCommand::Shutdown) => {
                    info!("Chat pipeline worker shutting down");
                    self.events.send(LLMEvent::Shutdown);
                    break;
                }

                Err(e) => {
                    debug!("Command channel closed: {}", e);
                    break;
                }
            }
        }

        info!("Chat pipeline worker stopped");
    }

    fn open_session(&mut self, handle: SessionHandle) {
        // The old context is dropped first, even if the new one fails to open.
        if let Some(old) = self.session.take() {
            debug!("Discarding session {}", old.handle());
        }

        let opened = match &self.backend {
            Some(backend) => Ok(ChatSession::with_backend(
                handle,
                Arc::clone(backend),
                Some(self.config.system_instruction.clone()),
            )),
            None => ChatSession::new(&self.config, handle),
        };

        match opened {
            Ok(session) => {
                self.session = Some(session);
                self.events.send(LLMEvent::SessionReady { session: handle });
            }
            Err(error) => {
                warn!("Failed to open chat session: {}", error);
                self.events.send(LLMEvent::SessionFailed {
                    session: handle,
                    error,
                });
            }
        }
    }

    fn send(&mut self, runtime: &Runtime, handle: SessionHandle, request_id: Uuid, text: &str) {
        let session = match self.session.as_mut() {
            Some(session) if session.handle() == handle => session,
            _ => {
                warn!("Dropping request {} for inactive session {}", request_id, handle);
                self.events.send(LLMEvent::Error {
                    session: handle,
                    request_id,
                    error: SampuranaError::ChannelError("Chat session is not active".into()),
                });
                return;
            }
        };

        debug!("Processing request {} on session {}", request_id, handle);

        let start_time = Instant::now();
        let mut first_fragment_ms = None;
        let events = self.events.clone();

        let result = runtime.block_on(session.send_message_stream(text, |fragment| {
            if first_fragment_ms.is_none() {
                first_fragment_ms = Some(start_time.elapsed().as_millis() as u64);
            }
            events.send(LLMEvent::Fragment {
                session: handle,
                request_id,
                text: fragment.to_string(),
            });
        }));

        let total_ms = start_time.elapsed().as_millis() as u64;

        match result {
            Ok(full_response) => {
                debug!(
                    "Generation complete: {} chars in {}ms",
                    full_response.len(),
                    total_ms
                );
                self.events.send(LLMEvent::Complete {
                    session: handle,
                    request_id,
                    full_response,
                    first_fragment_ms,
                    total_ms,
                });
            }
            Err(error) => {
                error!("Generation failed: {}", error);
                self.events.send(LLMEvent::Error {
                    session: handle,
                    request_id,
                    error,
                });
            }
        }
    }
}
