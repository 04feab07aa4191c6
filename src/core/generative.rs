//! Generative Response Path
//!
//! Free-text prompts that no command matcher claims end up here: a
//! cache-checked call to a text-generation backend, raced against a fixed
//! timeout, with the streamed reply normalized before it is cached.

use crate::cache::MessageCache;
use crate::config::Config;
use crate::core::text_normalizer::normalize;
use crate::error::{AssistantError, AssistantResult};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Persona prefix prepended to every user prompt
const PERSONA_PREFIX: &str = "Responde de manera natural como EndyOS, con personalidad humana: ";

/// Finite sequence of text chunks produced by a backend
pub type TextStream = BoxStream<'static, AssistantResult<String>>;

/// A single generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// External text-generation backend
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Start a generation; chunks are concatenated by the caller
    async fn stream(&self, request: &GenerationRequest) -> AssistantResult<TextStream>;

    /// Whether credentials/config allow calling this backend at all
    fn is_available(&self) -> bool;

    fn provider(&self) -> &str;
}

/// Model currently used by the responder
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    pub provider: String,
    pub available: bool,
}

/// Cache-checked, timeout-bounded access to the generative backend
pub struct GenerativeResponder {
    backend: Arc<dyn TextGenerator>,
    cache: Arc<MessageCache>,
    model: RwLock<String>,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl GenerativeResponder {
    pub fn new(config: &Config, backend: Arc<dyn TextGenerator>, cache: Arc<MessageCache>) -> Self {
        Self {
            backend,
            cache,
            model: RwLock::new(config.model.clone()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.generation_timeout(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    pub fn model(&self) -> String {
        self.model
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            name: self.model(),
            provider: self.backend.provider().to_string(),
            available: self.is_available(),
        }
    }

    /// Switch models at runtime; blank names are ignored
    pub fn set_model(&self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        *self
            .model
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = name.to_string();
        info!("🧠 Model switched to: {}", name);
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cached_responses(&self) -> usize {
        self.cache.len()
    }

    /// Produce a reply for a free-text prompt
    ///
    /// Identical prompts (case-insensitive) are answered from the message
    /// cache without a backend call. On timeout the in-flight generation
    /// future is dropped.
    pub async fn respond(&self, prompt: &str) -> AssistantResult<String> {
        if prompt.trim().is_empty() {
            return Err(AssistantError::InputInvalid);
        }

        let cache_key = prompt.to_lowercase();
        if let Some(cached) = self.cache.get(&cache_key) {
            debug!("📦 Answering from message cache");
            return Ok(cached);
        }

        if !self.backend.is_available() {
            return Err(AssistantError::BackendUnavailable(format!(
                "{} credentials not configured",
                self.backend.provider()
            )));
        }

        let request = GenerationRequest {
            model: self.model(),
            prompt: format!("{PERSONA_PREFIX}{prompt}"),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let full_text = match tokio::time::timeout(self.timeout, self.collect(&request)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("⏱️ Generation exceeded {:?}", self.timeout);
                return Err(AssistantError::TimedOut(self.timeout));
            }
        };

        let cleaned = normalize(&full_text);
        if cleaned.is_empty() {
            return Err(AssistantError::EmptyResponse);
        }

        self.cache.set(&cache_key, cleaned.clone());
        Ok(cleaned)
    }

    /// Prefix the prompt with extra context before responding
    pub async fn respond_with_context(&self, prompt: &str, context: &str) -> AssistantResult<String> {
        if context.trim().is_empty() {
            return self.respond(prompt).await;
        }
        self.respond(&format!("Contexto: {context}\n\nUsuario: {prompt}"))
            .await
    }

    async fn collect(&self, request: &GenerationRequest) -> AssistantResult<String> {
        let mut chunks = self.backend.stream(request).await?;
        let mut full_text = String::new();
        while let Some(chunk) = chunks.next().await {
            full_text.push_str(&chunk?);
        }
        debug!("🧠 Generated {} chars", full_text.len());
        Ok(full_text)
    }
}

/// OpenRouter chat-completions client (server-sent events)
#[derive(Clone)]
pub struct OpenRouterClient {
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenRouterClient {
    pub fn new(config: &Config) -> Self {
        Self {
            url: config.openrouter_url.trim_end_matches('/').to_string(),
            api_key: config.openrouter_api_key.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TextGenerator for OpenRouterClient {
    async fn stream(&self, request: &GenerationRequest) -> AssistantResult<TextStream> {
        if self.api_key.is_empty() {
            return Err(AssistantError::BackendUnavailable(
                "OpenRouter API key not configured".into(),
            ));
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": request.model,
                "messages": [{ "role": "user", "content": request.prompt }],
                "temperature": request.temperature,
                "max_tokens": request.max_tokens,
                "stream": true
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("❌ OpenRouter API Error ({}): {}", status, body);
            return Err(AssistantError::Transport(format!("HTTP {status}")));
        }

        Ok(sse_text_stream(Box::pin(response.bytes_stream())))
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn provider(&self) -> &str {
        "OpenRouter"
    }
}

/// One parsed server-sent-events line
#[derive(Debug, PartialEq)]
enum SseEvent {
    Chunk(String),
    Done,
    Skip,
}

#[derive(Deserialize)]
struct StreamFrame {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<StreamError>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamError {
    message: String,
}

fn parse_sse_line(line: &str) -> AssistantResult<SseEvent> {
    let Some(data) = line.strip_prefix("data:") else {
        // Comments (": OPENROUTER PROCESSING"), event names, blank separators
        return Ok(SseEvent::Skip);
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(SseEvent::Done);
    }

    let frame: StreamFrame = serde_json::from_str(data)
        .map_err(|e| AssistantError::MalformedResponse(format!("stream frame: {e}")))?;
    if let Some(error) = frame.error {
        return Err(AssistantError::Transport(error.message));
    }

    let content: String = frame
        .choices
        .into_iter()
        .filter_map(|choice| choice.delta.content)
        .collect();
    if content.is_empty() {
        Ok(SseEvent::Skip)
    } else {
        Ok(SseEvent::Chunk(content))
    }
}

struct SseState<S> {
    bytes: S,
    buffer: Vec<u8>,
    pending: VecDeque<String>,
    finished: bool,
}

impl<S> SseState<S> {
    fn drain_lines(&mut self, flush: bool) -> AssistantResult<()> {
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.handle_line(&line)?;
        }
        if flush && !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.handle_line(&line)?;
        }
        Ok(())
    }

    fn handle_line(&mut self, line: &[u8]) -> AssistantResult<()> {
        if self.finished {
            return Ok(());
        }
        match parse_sse_line(String::from_utf8_lossy(line).trim())? {
            SseEvent::Chunk(text) => self.pending.push_back(text),
            SseEvent::Done => self.finished = true,
            SseEvent::Skip => {}
        }
        Ok(())
    }
}

/// Turn a raw SSE byte stream into text chunks
///
/// Lines are split on raw bytes so multi-byte characters survive chunk
/// boundaries.
fn sse_text_stream<S, B>(bytes: S) -> TextStream
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = SseState {
        bytes,
        buffer: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(chunk) = state.pending.pop_front() {
                return Some((Ok(chunk), state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(bytes)) => {
                    state.buffer.extend_from_slice(bytes.as_ref());
                    if let Err(e) = state.drain_lines(false) {
                        state.finished = true;
                        return Some((Err(e), state));
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e.into()), state));
                }
                None => {
                    let flushed = state.drain_lines(true);
                    state.finished = true;
                    if let Err(e) = flushed {
                        return Some((Err(e), state));
                    }
                }
            }
        }
    })
    .boxed()
}
