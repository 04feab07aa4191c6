use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Speech synthesis parameters handed to the TTS engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceConfig {
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            lang: "es-ES".to_string(),
            rate: 0.9,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

/// Coordinates the user agreed to share with the assistant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Generative backend
    pub openrouter_api_key: String,
    pub openrouter_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub generation_timeout_secs: u64,
    pub message_cache_capacity: usize,

    // Data APIs
    pub youtube_api_key: String,
    pub http_timeout_secs: u64,
    pub weather_ttl_secs: u64,
    pub crypto_ttl_secs: u64,
    pub media_ttl_secs: u64,
    pub location_ttl_secs: u64,
    pub default_city: String,
    pub default_coins: Vec<String>,
    pub device_coordinates: Option<Coordinates>,

    // Speech
    pub tts_engine: String,
    pub voice: VoiceConfig,

    // Meta
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openrouter_api_key: String::new(),
            openrouter_url: "https://openrouter.ai/api/v1".to_string(),
            model: "deepseek/deepseek-chat-v3.1:free".to_string(),
            temperature: 1.0,
            max_tokens: 500,
            generation_timeout_secs: 30,
            message_cache_capacity: 50,
            youtube_api_key: String::new(),
            http_timeout_secs: 10,
            weather_ttl_secs: 600,
            crypto_ttl_secs: 300,
            media_ttl_secs: 3600,
            location_ttl_secs: 3600,
            default_city: "Cancun".to_string(),
            default_coins: vec!["bitcoin".to_string(), "ethereum".to_string()],
            device_coordinates: None,
            tts_engine: "system".to_string(),
            voice: VoiceConfig::default(),
            log_level: "INFO".to_string(),
        }
    }
}

impl Config {
    /// Load config from the default location, or fall back to defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load config from an explicit path
    ///
    /// A missing file yields defaults. A corrupt file is moved aside to
    /// `config.json.corrupt` and defaults are used.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                    let backup_path = path.with_extension("json.corrupt");
                    let _ = std::fs::rename(path, &backup_path);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path())
    }

    /// Save config to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Fill empty API keys from the environment
    fn apply_env_overrides(&mut self) {
        if self.openrouter_api_key.is_empty() {
            if let Ok(key) = std::env::var("OPENROUTER_API_KEY") {
                self.openrouter_api_key = key;
            }
        }
        if self.youtube_api_key.is_empty() {
            if let Ok(key) = std::env::var("YOUTUBE_API_KEY") {
                self.youtube_api_key = key;
            }
        }
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("endyos")
        .join("config.json")
}
