//! A remote conversation context and the handle that names it

use crate::llm::client::{empty_reply_error, ChatBackend, ChatRequest, GeminiClient, Turn};
use crate::llm::config::ChatConfig;
use crate::Result;
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Opaque name of one chat session
///
/// A fresh handle is minted at startup and on every reset; old handles are
/// never reused, so events tagged with one can be recognised as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(Uuid);

impl SessionHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Conversation state held on the client side of the API
///
/// The service is stateless, so every request carries the system
/// instruction and all completed turns.
pub struct ChatSession {
    handle: SessionHandle,
    backend: Arc<dyn ChatBackend>,
    system_instruction: Option<String>,
    temperature: Option<f32>,
    history: Vec<Turn>,
}

impl ChatSession {
    /// Open a session against the Gemini API
    ///
    /// Fails with `MissingCredential` when no API key is configured.
    pub fn new(config: &ChatConfig, handle: SessionHandle) -> Result<Self> {
        let client = GeminiClient::new(config)?;
        info!("Opened chat session {} on {}", handle, client.model());

        let mut session = Self::with_backend(
            handle,
            Arc::new(client),
            Some(config.system_instruction.clone()),
        );
        session.temperature = config.temperature;
        Ok(session)
    }

    /// Open a session on an arbitrary backend
    pub fn with_backend(
        handle: SessionHandle,
        backend: Arc<dyn ChatBackend>,
        system_instruction: Option<String>,
    ) -> Self {
        Self {
            handle,
            backend,
            system_instruction,
            temperature: None,
            history: Vec::new(),
        }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle
    }

    /// Completed turns, oldest first
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    fn request_for(&self, text: &str) -> ChatRequest {
        let mut turns = self.history.clone();
        turns.push(Turn::user(text));
        ChatRequest {
            system_instruction: self.system_instruction.clone(),
            turns,
            temperature: self.temperature,
        }
    }

    /// Send a user turn and stream the reply
    ///
    /// `on_fragment` sees each fragment as it arrives. The turn pair joins
    /// the history only when the stream ends without error and with some
    /// text; an empty reply is reported as an error.
    pub async fn send_message_stream<F>(&mut self, text: &str, mut on_fragment: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        let mut stream = self.backend.stream_reply(self.request_for(text));
        let mut reply = String::new();

        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            reply.push_str(&fragment);
            on_fragment(&fragment);
        }

        if reply.is_empty() {
            return Err(empty_reply_error(None));
        }

        debug!(
            "Session {}: reply complete, {} chars",
            self.handle,
            reply.len()
        );

        self.history.push(Turn::user(text));
        self.history.push(Turn::model(reply.clone()));
        Ok(reply)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::llm::client::{ChatBackend, ChatRequest, FragmentStream};
    use crate::{Result, SampuranaError};
    use futures::stream;
    use futures::StreamExt;
    use parking_lot::Mutex;

    /// Backend that replays a fixed script and records what it was asked
    pub struct ScriptedBackend {
        script: Vec<Result<String>>,
        pub requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedBackend {
        pub fn replying(fragments: &[&str]) -> Self {
            Self {
                script: fragments.iter().map(|f| Ok(f.to_string())).collect(),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing_after(fragments: &[&str], error: SampuranaError) -> Self {
            let mut backend = Self::replying(fragments);
            backend.script.push(Err(error));
            backend
        }
    }

    impl ChatBackend for ScriptedBackend {
        fn stream_reply(&self, request: ChatRequest) -> FragmentStream {
            self.requests.lock().push(request);
            stream::iter(self.script.clone()).boxed()
        }
    }
}
