//! System TTS engine (speech-dispatcher, espeak-ng fallback)

use super::TtsEngine;
use crate::config::VoiceConfig;
use anyhow::Result;
use async_trait::async_trait;
use std::process::Command;
use tracing::debug;

/// espeak-ng words per minute at rate 1.0
const ESPEAK_BASE_WPM: f32 = 175.0;

#[derive(Debug)]
pub struct SystemEngine {
    voice: VoiceConfig,
}

impl Default for SystemEngine {
    fn default() -> Self {
        Self::new(VoiceConfig::default())
    }
}

impl SystemEngine {
    pub fn new(voice: VoiceConfig) -> Self {
        Self { voice }
    }

    /// Primary language subtag: "es-ES" -> "es"
    fn language(&self) -> &str {
        self.voice
            .lang
            .split(['-', '_'])
            .next()
            .filter(|l| !l.is_empty())
            .unwrap_or("es")
    }

    /// Arguments for spd-say, whose knobs all span -100..=100
    pub fn spd_say_args(&self, text: &str) -> Vec<String> {
        let scale = |factor: f32| (((factor - 1.0) * 100.0).round() as i32).clamp(-100, 100);
        let volume = ((self.voice.volume * 200.0 - 100.0).round() as i32).clamp(-100, 100);
        vec![
            "-l".to_string(),
            self.language().to_string(),
            "-r".to_string(),
            scale(self.voice.rate).to_string(),
            "-p".to_string(),
            scale(self.voice.pitch).to_string(),
            "-i".to_string(),
            volume.to_string(),
            text.to_string(),
        ]
    }

    pub fn espeak_args(&self, text: &str) -> Vec<String> {
        let speed = (ESPEAK_BASE_WPM * self.voice.rate).round().max(80.0) as u32;
        let pitch = ((self.voice.pitch * 50.0).round() as i32).clamp(0, 99);
        let amplitude = ((self.voice.volume * 100.0).round() as i32).clamp(0, 200);
        vec![
            "-v".to_string(),
            self.language().to_string(),
            "-s".to_string(),
            speed.to_string(),
            "-p".to_string(),
            pitch.to_string(),
            "-a".to_string(),
            amplitude.to_string(),
            text.to_string(),
        ]
    }
}

#[async_trait]
impl TtsEngine for SystemEngine {
    async fn speak(&self, text: &str) -> Result<()> {
        debug!("System speaking: {}", text);

        if Command::new("spd-say").args(self.spd_say_args(text)).spawn().is_ok() {
            return Ok(());
        }

        if Command::new("espeak-ng").args(self.espeak_args(text)).spawn().is_ok() {
            return Ok(());
        }

        Err(anyhow::anyhow!(
            "No system TTS command found (tried spd-say, espeak-ng)"
        ))
    }

    fn name(&self) -> &str {
        "system"
    }
}
