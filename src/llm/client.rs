//! Gemini REST client with streamed responses
//!
//! Requests go to `models/{model}:streamGenerateContent?alt=sse`; the body
//! comes back as Server-Sent Events, one `GenerateContentResponse` JSON
//! object per event.

use crate::llm::config::ChatConfig;
use crate::llm::sse::SseDecoder;
use crate::messages::Role;
use crate::{Result, SampuranaError};
use async_stream::try_stream;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Stream of response text fragments, in generation order
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// One prior or pending turn of a conversation
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Everything the service needs to produce the next reply
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub system_instruction: Option<String>,
    /// Prior turns followed by the new user turn
    pub turns: Vec<Turn>,
    pub temperature: Option<f32>,
}

/// Something that can turn a request into a stream of reply fragments
pub trait ChatBackend: Send + Sync {
    fn stream_reply(&self, request: ChatRequest) -> FragmentStream;
}

/// Backend talking to the hosted Gemini API
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
    idle_timeout: Duration,
}

impl GeminiClient {
    /// Build a client; fails when no API key is configured
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let api_key = config
            .api_key()
            .ok_or(SampuranaError::MissingCredential)?
            .to_string();

        // Connect timeout only; the streamed body is guarded per chunk
        let http = Client::builder()
            .connect_timeout(config.request_timeout())
            .build()
            .map_err(|e| SampuranaError::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            idle_timeout: config.request_timeout(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl ChatBackend for GeminiClient {
    fn stream_reply(&self, request: ChatRequest) -> FragmentStream {
        let body = GenerateContentRequest::from(&request);
        debug!(
            "Streaming {} turn(s) to {}",
            request.turns.len(),
            self.model
        );
        fragment_stream(
            self.http.clone(),
            self.endpoint(),
            self.api_key.clone(),
            body,
            self.idle_timeout,
        )
        .boxed()
    }
}

fn fragment_stream(
    http: Client,
    url: String,
    api_key: String,
    body: GenerateContentRequest,
    idle_timeout: Duration,
) -> impl Stream<Item = Result<String>> + Send + 'static {
    try_stream! {
        let response = timeout(
            idle_timeout,
            http.post(&url).header("x-goog-api-key", api_key).json(&body).send(),
        )
        .await
        .map_err(|_| SampuranaError::RequestError("request timed out".to_string()))?
        .map_err(map_request_error)?;
        let response = check_status(response).await?;

        let mut bytes = Box::pin(response.bytes_stream());
        let mut decoder = SseDecoder::new();
        let mut finish_reason = None;
        let mut yielded = false;

        loop {
            let next = timeout(idle_timeout, bytes.next()).await.map_err(|_| {
                SampuranaError::StreamError(format!(
                    "no data received for {}s",
                    idle_timeout.as_secs()
                ))
            })?;
            let Some(chunk) = next else {
                break;
            };
            let chunk = chunk.map_err(|e| SampuranaError::StreamError(e.to_string()))?;
            for payload in decoder.feed(&chunk) {
                let event = parse_event(&payload)?;
                finish_reason = event.finish_reason.or(finish_reason);
                for fragment in event.fragments {
                    yielded = true;
                    yield fragment;
                }
            }
        }

        if let Some(payload) = decoder.finish() {
            let event = parse_event(&payload)?;
            finish_reason = event.finish_reason.or(finish_reason);
            for fragment in event.fragments {
                yielded = true;
                yield fragment;
            }
        }

        if !yielded {
            Err::<(), SampuranaError>(empty_reply_error(finish_reason.as_deref()))?;
        }
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    Err(map_http_error(status, &text))
}

/// Error for a reply that finished without any visible text
pub(crate) fn empty_reply_error(finish_reason: Option<&str>) -> SampuranaError {
    match finish_reason {
        Some(reason) => SampuranaError::ApiError(format!("Empty response (finish reason: {})", reason)),
        None => SampuranaError::ApiError("Empty response".to_string()),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl From<&ChatRequest> for GenerateContentRequest {
    fn from(request: &ChatRequest) -> Self {
        let contents = request
            .turns
            .iter()
            .map(|turn| Content {
                role: turn.role,
                parts: vec![Part {
                    text: turn.text.clone(),
                }],
            })
            .collect();

        let system_instruction = request
            .system_instruction
            .as_ref()
            .filter(|text| !text.trim().is_empty())
            .map(|text| SystemContent {
                parts: vec![Part { text: text.clone() }],
            });

        Self {
            contents,
            system_instruction,
            generation_config: request
                .temperature
                .map(|temperature| GenerationConfig { temperature }),
        }
    }
}

#[derive(Serialize)]
struct Content {
    role: Role,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct SystemContent {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    code: Option<i32>,
    message: Option<String>,
    status: Option<String>,
}

/// Visible text and finish state of one streamed event
#[derive(Debug, Default, PartialEq)]
struct ParsedEvent {
    fragments: Vec<String>,
    finish_reason: Option<String>,
}

fn parse_event(payload: &str) -> Result<ParsedEvent> {
    if let Ok(wrapper) = serde_json::from_str::<ErrorWrapper>(payload) {
        return Err(SampuranaError::ApiError(describe_error(wrapper.error, payload)));
    }

    let chunk: StreamChunk = serde_json::from_str(payload)
        .map_err(|e| SampuranaError::StreamError(format!("Malformed stream event: {}", e)))?;

    if chunk.candidates.is_empty() {
        if let Some(reason) = chunk.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(SampuranaError::ApiError(format!(
                "Response blocked: {}",
                reason
            )));
        }
    }

    let mut event = ParsedEvent::default();
    if let Some(candidate) = chunk.candidates.into_iter().next() {
        if let Some(reason) = candidate.finish_reason.as_deref() {
            if reason != "STOP" {
                warn!("Generation finished early: {}", reason);
            }
        }
        event.finish_reason = candidate.finish_reason;
        if let Some(content) = candidate.content {
            event.fragments.extend(
                content
                    .parts
                    .into_iter()
                    .filter(|part| !part.thought)
                    .filter_map(|part| part.text)
                    .filter(|text| !text.is_empty()),
            );
        }
    }
    Ok(event)
}

fn describe_error(error: ErrorBody, raw: &str) -> String {
    let message = error.message.unwrap_or_else(|| raw.to_string());
    match error.status.filter(|status| !status.is_empty()) {
        Some(status) => format!("{}: {}", status, message),
        None => message,
    }
}

fn map_http_error(status: StatusCode, body: &str) -> SampuranaError {
    match serde_json::from_str::<ErrorWrapper>(body) {
        Ok(wrapper) => SampuranaError::ApiError(describe_error(wrapper.error, body)),
        Err(_) => SampuranaError::ApiError(format!("HTTP {}: {}", status.as_u16(), body.trim())),
    }
}

fn map_request_error(e: reqwest::Error) -> SampuranaError {
    if e.is_timeout() {
        SampuranaError::RequestError("request timed out".to_string())
    } else {
        SampuranaError::RequestError(e.to_string())
    }
}
