//! TTS (Text-to-Speech) Module
//!
//! Provides a unified interface for the speech output backends.

use crate::config::Config;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub mod console;
pub mod system;

/// Trait for TTS engines
#[async_trait]
pub trait TtsEngine: Send + Sync + std::fmt::Debug {
    /// Speak the given text
    async fn speak(&self, text: &str) -> Result<()>;

    /// Get the engine name
    fn name(&self) -> &str;
}

/// Factory to create the configured TTS engine
///
/// `mute` forces the console engine regardless of configuration.
pub fn create_engine(config: &Config, mute: bool) -> Arc<dyn TtsEngine> {
    let requested = if mute { "console" } else { config.tts_engine.as_str() };
    info!("🛠️ Creating TTS engine: {}", requested);

    let engine: Arc<dyn TtsEngine> = match requested {
        "system" => Arc::new(system::SystemEngine::new(config.voice.clone())),
        "console" | "none" => Arc::new(console::ConsoleEngine),
        other => {
            warn!("  - Unknown engine '{}', falling back to System", other);
            Arc::new(system::SystemEngine::new(config.voice.clone()))
        }
    };
    info!("✅ TTS engine '{}' initialized", engine.name());
    engine
}
