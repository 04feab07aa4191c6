//! Mock backends for Testing
//!
//! Every backend counts its calls so tests can assert on cache hits.

use async_trait::async_trait;
use endyos::config::Coordinates;
use endyos::core::generative::{GenerationRequest, TextGenerator, TextStream};
use endyos::error::{AssistantError, AssistantResult};
use endyos::services::browser::Browser;
use endyos::services::crypto::{CoinPrice, CryptoBackend};
use endyos::services::location::{GeoBackend, Location};
use endyos::services::media::{MediaSearchBackend, MediaVideo};
use endyos::services::trivia::TriviaBackend;
use endyos::services::weather::{WeatherBackend, WeatherReport};
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Records opened URLs instead of launching a browser
#[derive(Debug, Default)]
pub struct RecordingBrowser {
    pub opened: Mutex<Vec<String>>,
}

impl RecordingBrowser {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl Browser for RecordingBrowser {
    fn open(&self, url: &str) -> anyhow::Result<()> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// Streams a fixed reply in small chunks, optionally after a delay
pub struct MockGenerator {
    pub reply: &'static str,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl MockGenerator {
    pub fn new(reply: &'static str) -> Self {
        Self {
            reply,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn stream(&self, _request: &GenerationRequest) -> AssistantResult<TextStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let chunks: Vec<AssistantResult<String>> = self
            .reply
            .split_inclusive(' ')
            .map(|c| Ok(c.to_string()))
            .collect();
        Ok(stream::iter(chunks).boxed())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn provider(&self) -> &str {
        "mock"
    }
}

/// Always reports 20°C and clear skies, echoing the city back
#[derive(Default)]
pub struct MockWeather {
    pub calls: AtomicUsize,
}

#[async_trait]
impl WeatherBackend for MockWeather {
    async fn current(&self, city: &str) -> AssistantResult<WeatherReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(WeatherReport {
            location: city.to_string(),
            temperature_c: "20".into(),
            feels_like_c: "19".into(),
            description: "Despejado".into(),
            humidity: "55".into(),
            wind_speed_kmph: "8".into(),
            wind_direction: "N".into(),
            pressure_mb: "1016".into(),
            visibility_km: "10".into(),
            uv_index: Some("5".into()),
        })
    }
}

/// Media search that never has credentials
#[derive(Default)]
pub struct UnconfiguredMedia {
    pub calls: AtomicUsize,
}

#[async_trait]
impl MediaSearchBackend for UnconfiguredMedia {
    async fn search(&self, _query: &str) -> AssistantResult<Option<MediaVideo>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }

    fn is_configured(&self) -> bool {
        false
    }
}

/// Crypto, trivia and geolocation backends with no network
pub struct Offline;

#[async_trait]
impl CryptoBackend for Offline {
    async fn prices(&self, _coins: &[String]) -> AssistantResult<Vec<CoinPrice>> {
        Err(AssistantError::Transport("offline".into()))
    }
}

#[async_trait]
impl TriviaBackend for Offline {
    async fn fact(&self, _kind: &str) -> AssistantResult<String> {
        Err(AssistantError::Transport("offline".into()))
    }
}

#[async_trait]
impl GeoBackend for Offline {
    async fn reverse_geocode(&self, _coords: Coordinates) -> AssistantResult<Option<String>> {
        Err(AssistantError::Transport("offline".into()))
    }

    async fn ip_lookup(&self) -> AssistantResult<Location> {
        Err(AssistantError::Transport("offline".into()))
    }
}
