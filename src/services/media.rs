//! Media search and playback (YouTube)

use super::browser::BrowserService;
use crate::cache::TtlCache;
use crate::commands::PlaybackMode;
use crate::config::Config;
use crate::error::{AssistantError, AssistantResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const MEDIA_HOME: &str = "https://www.youtube.com";

/// First search hit for a media query
#[derive(Debug, Clone, PartialEq)]
pub struct MediaVideo {
    pub id: String,
    pub title: String,
}

impl MediaVideo {
    pub fn watch_url(&self) -> String {
        format!("{MEDIA_HOME}/watch?v={}&autoplay=1", self.id)
    }

    pub fn embed_url(&self) -> String {
        format!("{MEDIA_HOME}/embed/{}?autoplay=1&rel=0", self.id)
    }
}

pub fn results_url(query: &str) -> String {
    format!(
        "{MEDIA_HOME}/results?search_query={}",
        urlencoding::encode(query)
    )
}

/// External media-search backend
#[async_trait]
pub trait MediaSearchBackend: Send + Sync {
    /// First result for a free-text query, `None` when nothing matched
    async fn search(&self, query: &str) -> AssistantResult<Option<MediaVideo>>;

    /// Without credentials the backend is skipped entirely
    fn is_configured(&self) -> bool;
}

#[derive(Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: SearchSnippet,
}

#[derive(Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: String,
}

#[derive(Deserialize)]
struct SearchSnippet {
    title: String,
}

/// YouTube Data API v3 search client
pub struct YouTubeClient {
    api_key: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl YouTubeClient {
    pub fn new(config: &Config) -> Self {
        Self {
            api_key: config.youtube_api_key.clone(),
            timeout: config.http_timeout(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MediaSearchBackend for YouTubeClient {
    async fn search(&self, query: &str) -> AssistantResult<Option<MediaVideo>> {
        if self.api_key.is_empty() {
            return Err(AssistantError::BackendUnavailable(
                "YouTube API key not configured".into(),
            ));
        }

        let response = self
            .client
            .get("https://www.googleapis.com/youtube/v3/search")
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("type", "video"),
                ("maxResults", "1"),
                ("key", self.api_key.as_str()),
            ])
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AssistantError::Transport(format!(
                "YouTube search HTTP {}",
                response.status()
            )));
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.items.into_iter().next().map(|item| MediaVideo {
            id: item.id.video_id,
            title: item.snippet.title,
        }))
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Media commands with a per-query lookup cache
pub struct MediaService {
    backend: Arc<dyn MediaSearchBackend>,
    browser: BrowserService,
    cache: TtlCache<MediaVideo>,
    ttl: Duration,
}

impl MediaService {
    pub fn new(backend: Arc<dyn MediaSearchBackend>, browser: BrowserService, ttl: Duration) -> Self {
        Self {
            backend,
            browser,
            cache: TtlCache::new("media"),
            ttl,
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Look up the first video for a query; failures degrade to `None`
    pub async fn find_video(&self, query: &str) -> Option<MediaVideo> {
        let cache_key = format!("youtube_{}", query.to_lowercase());
        if let Some(video) = self.cache.get(&cache_key) {
            return Some(video);
        }

        if !self.backend.is_configured() {
            debug!("Media search backend not configured, skipping lookup");
            return None;
        }

        match self.backend.search(query).await {
            Ok(Some(video)) => {
                self.cache.set(cache_key, video.clone(), self.ttl);
                Some(video)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("❌ Media search failed for '{}': {}", query, e);
                None
            }
        }
    }

    pub fn open_home(&self) -> String {
        match self.browser.open_silently(MEDIA_HOME) {
            Ok(()) => "EndyOS abriendo YouTube".to_string(),
            Err(e) => {
                warn!("❌ Could not open YouTube: {}", e);
                "EndyOS no pudo abrir YouTube".to_string()
            }
        }
    }

    pub fn show_results(&self, query: &str) -> String {
        if let Err(e) = self.browser.open_silently(&results_url(query)) {
            warn!("❌ Could not open media results: {}", e);
        }
        format!("EndyOS buscando \"{query}\" en YouTube")
    }

    /// Play the first hit; without one, fall back to the results page
    pub async fn play(&self, query: &str, mode: PlaybackMode) -> String {
        let video = self.find_video(query).await;

        if let (PlaybackMode::Embedded, Some(video)) = (mode, &video) {
            if self.browser.open_silently(&video.embed_url()).is_ok() {
                info!("🎵 Embedded playback: {}", video.title);
                return format!("EndyOS reproduciendo \"{}\" en reproductor integrado", video.title);
            }
        }

        match video {
            Some(video) if self.browser.open_silently(&video.watch_url()).is_ok() => {
                info!("🎵 Playing: {}", video.title);
                format!("EndyOS reproduciendo \"{}\" en YouTube", video.title)
            }
            _ => {
                if let Err(e) = self.browser.open_silently(&results_url(query)) {
                    warn!("❌ Could not open media results: {}", e);
                }
                format!(
                    "EndyOS buscando \"{query}\" en YouTube. Haz clic en el primer video para reproducir."
                )
            }
        }
    }
}
