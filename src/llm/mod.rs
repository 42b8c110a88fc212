//! Remote chat integration with the Gemini API
//!
//! - **config**: model, endpoint and credential settings
//! - **client**: the `ChatBackend` seam and the Gemini REST client
//! - **sse**: incremental Server-Sent-Events decoding
//! - **session**: conversation history and session handles
//! - **pipeline**: worker thread bridging sessions to the UI
//! - **prompts**: system instruction, greeting and status strings
//!
//! # Usage
//!
//! ```rust,ignore
//! use sampurana::llm::{ChatConfig, LLMCommand, LLMEvent, LLMPipeline, SessionHandle};
//! use sampurana::utils::RepaintSignal;
//! use uuid::Uuid;
//!
//! let pipeline = LLMPipeline::new(ChatConfig::new(api_key), RepaintSignal::new());
//! let cmd_tx = pipeline.command_sender();
//! let event_rx = pipeline.event_receiver();
//! pipeline.start_worker()?;
//!
//! let session = SessionHandle::new();
//! cmd_tx.send(LLMCommand::NewSession(session))?;
//! cmd_tx.send(LLMCommand::Send {
//!     session,
//!     request_id: Uuid::new_v4(),
//!     text: "Hello!".to_string(),
//! })?;
//!
//! while let Ok(event) = event_rx.recv() {
//!     match event {
//!         LLMEvent::Fragment { text, .. } => print!("{}", text),
//!         LLMEvent::Complete { .. } | LLMEvent::Error { .. } => break,
//!         _ => {}
//!     }
//! }
//! ```

pub mod client;
pub mod config;
pub mod pipeline;
pub mod prompts;
pub mod session;
pub mod sse;

pub use client::{ChatBackend, ChatRequest, FragmentStream, GeminiClient, Turn};
pub use config::ChatConfig;
pub use pipeline::{LLMCommand, LLMEvent, LLMPipeline};
pub use prompts::{stream_error_message, GREETING, PLACEHOLDER, SYSTEM_INSTRUCTION};
pub use session::{ChatSession, SessionHandle};
pub use sse::SseDecoder;
