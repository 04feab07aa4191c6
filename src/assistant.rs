//! Application root
//!
//! Owns the dispatcher, the generative responder and the speech engine,
//! and serializes submissions with a processing flag: a prompt submitted
//! while another is in flight is dropped, not queued.

use crate::cache::MessageCache;
use crate::config::Config;
use crate::core::generative::{GenerativeResponder, ModelInfo};
use crate::core::text_normalizer::normalize;
use crate::error::AssistantError;
use crate::messages::{random_message, THINKING_MESSAGES, WELCOME_MESSAGES};
use crate::processor::Processor;
use crate::services::Backends;
use crate::tts::TtsEngine;
use chrono::{DateTime, Local};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What happened to a submitted prompt
#[derive(Debug)]
pub enum SubmitOutcome {
    /// A command matcher handled it
    Command(String),
    /// The generative backend answered (possibly from cache)
    Generated(String),
    /// Rejected or failed; `message` is what was spoken
    Failed {
        message: String,
        error: AssistantError,
    },
    /// Another submission was still in flight
    Busy,
}

impl SubmitOutcome {
    /// The text spoken for this outcome, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            SubmitOutcome::Command(text) | SubmitOutcome::Generated(text) => Some(text),
            SubmitOutcome::Failed { message, .. } => Some(message),
            SubmitOutcome::Busy => None,
        }
    }
}

/// Point-in-time view of the assistant
#[derive(Debug, Clone)]
pub struct AssistantStatus {
    pub processing: bool,
    pub generator_available: bool,
    pub model: ModelInfo,
    pub cached_messages: usize,
    pub timestamp: DateTime<Local>,
}

/// Clears the processing flag when a submission ends, however it ends
struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Assistant {
    processor: Processor,
    generative: GenerativeResponder,
    tts: Arc<dyn TtsEngine>,
    processing: AtomicBool,
}

impl Assistant {
    pub fn new(config: &Config, backends: Backends, tts: Arc<dyn TtsEngine>) -> Self {
        let cache = Arc::new(MessageCache::new(config.message_cache_capacity));
        Self {
            processor: Processor::new(config, &backends),
            generative: GenerativeResponder::new(config, backends.generator, cache),
            tts,
            processing: AtomicBool::new(false),
        }
    }

    pub fn generative(&self) -> &GenerativeResponder {
        &self.generative
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    /// Speak a random welcome message and return it
    pub async fn greet(&self) -> String {
        let greeting = random_message(WELCOME_MESSAGES).to_string();
        self.speak(&greeting).await;
        greeting
    }

    /// Handle one user prompt end to end
    pub async fn submit(&self, prompt: &str) -> SubmitOutcome {
        if self
            .processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Submission dropped, another is in flight");
            return SubmitOutcome::Busy;
        }
        let _guard = ProcessingGuard(&self.processing);

        let prompt = prompt.trim();
        if prompt.is_empty() {
            return self.fail(AssistantError::InputInvalid).await;
        }
        info!("📝 Prompt: '{}'", prompt);

        if let Some(reply) = self.processor.dispatch(prompt).await {
            self.speak(&reply).await;
            return SubmitOutcome::Command(reply);
        }

        self.speak(random_message(THINKING_MESSAGES)).await;
        match self.generative.respond(prompt).await {
            Ok(reply) => {
                self.speak(&reply).await;
                SubmitOutcome::Generated(reply)
            }
            Err(e) => self.fail(e).await,
        }
    }

    pub fn status(&self) -> AssistantStatus {
        AssistantStatus {
            processing: self.is_processing(),
            generator_available: self.generative.is_available(),
            model: self.generative.model_info(),
            cached_messages: self.generative.cached_responses(),
            timestamp: Local::now(),
        }
    }

    /// Clear every cache and the processing flag
    pub fn reset(&self) {
        self.processor.clear_caches();
        self.generative.clear_cache();
        self.processing.store(false, Ordering::Release);
        info!("🔄 Assistant reset");
    }

    async fn fail(&self, error: AssistantError) -> SubmitOutcome {
        warn!("❌ Submission failed: {}", error);
        let message = error.user_message().to_string();
        self.speak(&message).await;
        SubmitOutcome::Failed { message, error }
    }

    async fn speak(&self, text: &str) {
        let text = normalize(text);
        if text.is_empty() {
            return;
        }
        if let Err(e) = self.tts.speak(&text).await {
            warn!("TTS error ({}): {}", self.tts.name(), e);
        }
    }
}
