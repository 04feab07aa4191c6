//! Command Processor
//!
//! Routes a prompt through the command matchers in fixed priority order
//! (media, browser, data APIs) and executes the first command produced.
//! Returns `None` when no matcher claims the prompt so the caller can fall
//! through to the generative path.

use crate::commands::{BrowserMatcher, Command, DataApiMatcher, Matcher, MediaMatcher, Prompt};
use crate::config::Config;
use crate::services::browser::BrowserService;
use crate::services::crypto::CryptoService;
use crate::services::location::LocationService;
use crate::services::media::MediaService;
use crate::services::trivia::TriviaService;
use crate::services::weather::WeatherService;
use crate::services::Backends;
use std::time::Duration;
use tracing::{debug, info};

pub struct Processor {
    /// Evaluated in order; first match wins
    matchers: Vec<Box<dyn Matcher>>,
    browser: BrowserService,
    media: MediaService,
    weather: WeatherService,
    crypto: CryptoService,
    trivia: TriviaService,
    location: LocationService,
}

impl Processor {
    pub fn new(config: &Config, backends: &Backends) -> Self {
        let ttl = Duration::from_secs;
        let browser = BrowserService::new(backends.browser.clone());

        Self {
            matchers: vec![
                Box::new(MediaMatcher),
                Box::new(BrowserMatcher),
                Box::new(DataApiMatcher::new(
                    &config.default_city,
                    &config.default_coins,
                )),
            ],
            media: MediaService::new(
                backends.media.clone(),
                browser.clone(),
                ttl(config.media_ttl_secs),
            ),
            browser,
            weather: WeatherService::new(backends.weather.clone(), ttl(config.weather_ttl_secs)),
            crypto: CryptoService::new(backends.crypto.clone(), ttl(config.crypto_ttl_secs)),
            trivia: TriviaService::new(backends.trivia.clone()),
            location: LocationService::new(
                backends.geo.clone(),
                config.device_coordinates,
                ttl(config.location_ttl_secs),
            ),
        }
    }

    /// Names of the matcher families in evaluation order
    pub fn matcher_names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }

    /// Classify a prompt without executing anything
    pub fn classify(&self, text: &str) -> Option<(&'static str, Command)> {
        let prompt = Prompt::new(text);
        self.matchers
            .iter()
            .find_map(|m| m.match_prompt(&prompt).map(|cmd| (m.name(), cmd)))
    }

    /// Execute the first matching command, or `None` for "not a command"
    pub async fn dispatch(&self, text: &str) -> Option<String> {
        debug!("Processing command: '{}'", text.trim());

        let Some((family, command)) = self.classify(text) else {
            debug!("No matcher claimed the prompt");
            return None;
        };

        info!("🎯 Matched {} command: {}", family, command.kind());
        Some(self.execute(command).await)
    }

    /// Run a command; backend failures come back as apologetic text
    pub async fn execute(&self, command: Command) -> String {
        match command {
            Command::BrowserOpen { url } => self.browser.open_url(&url),
            Command::BrowserSearch { query } => self.browser.search(&query),
            Command::MediaOpen => self.media.open_home(),
            Command::MediaSearch { query } => self.media.show_results(&query),
            Command::MediaPlay { query, mode } => self.media.play(&query, mode).await,
            Command::WeatherQuery { city } => self.weather.describe(&city).await,
            Command::CryptoQuery { coins } => self.crypto.describe(&coins).await,
            Command::TriviaQuery => self.trivia.describe().await,
            Command::LocationQuery => self.location.describe().await,
        }
    }

    /// Drop every data-API result cache
    pub fn clear_caches(&self) {
        self.media.clear_cache();
        self.weather.clear_cache();
        self.crypto.clear_cache();
        self.location.clear_cache();
        info!("🧹 Command caches cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::PlaybackMode;
    use crate::core::generative::{GenerationRequest, TextGenerator, TextStream};
    use crate::error::{AssistantError, AssistantResult};
    use crate::services::browser::Browser;
    use crate::services::crypto::{CoinPrice, CryptoBackend};
    use crate::services::location::{GeoBackend, Location};
    use crate::services::media::{MediaSearchBackend, MediaVideo};
    use crate::services::trivia::TriviaBackend;
    use crate::services::weather::{WeatherBackend, WeatherReport};
    use crate::config::Coordinates;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl Browser for Recorder {
        fn open(&self, url: &str) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    struct Offline;

    #[async_trait]
    impl MediaSearchBackend for Offline {
        async fn search(&self, _query: &str) -> AssistantResult<Option<MediaVideo>> {
            Ok(None)
        }
        fn is_configured(&self) -> bool {
            false
        }
    }

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
            Ok(None)
        }
        async fn ip_lookup(&self) -> AssistantResult<Location> {
            Err(AssistantError::Transport("offline".into()))
        }
    }

    #[async_trait]
    impl TextGenerator for Offline {
        async fn stream(&self, _request: &GenerationRequest) -> AssistantResult<TextStream> {
            Err(AssistantError::BackendUnavailable("offline".into()))
        }
        fn is_available(&self) -> bool {
            false
        }
        fn provider(&self) -> &str {
            "offline"
        }
    }

    #[derive(Default)]
    struct CountingWeather(AtomicUsize);

    #[async_trait]
    impl WeatherBackend for CountingWeather {
        async fn current(&self, city: &str) -> AssistantResult<WeatherReport> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(WeatherReport {
                location: city.to_string(),
                temperature_c: "28".into(),
                feels_like_c: "31".into(),
                description: "Soleado".into(),
                humidity: "70".into(),
                wind_speed_kmph: "15".into(),
                wind_direction: "E".into(),
                pressure_mb: "1012".into(),
                visibility_km: "10".into(),
                uv_index: Some("9".into()),
            })
        }
    }

    fn processor() -> (Processor, Arc<Recorder>, Arc<CountingWeather>) {
        let browser = Arc::new(Recorder::default());
        let weather = Arc::new(CountingWeather::default());
        let backends = Backends {
            browser: browser.clone(),
            media: Arc::new(Offline),
            weather: weather.clone(),
            crypto: Arc::new(Offline),
            trivia: Arc::new(Offline),
            geo: Arc::new(Offline),
            generator: Arc::new(Offline),
        };
        (Processor::new(&Config::default(), &backends), browser, weather)
    }

    #[test]
    fn test_matcher_priority_order() {
        let (processor, _, _) = processor();
        assert_eq!(processor.matcher_names(), vec!["media", "browser", "data_api"]);
    }

    #[test]
    fn test_media_search_beats_weather_keyword() {
        let (processor, _, _) = processor();
        let (family, command) = processor.classify("busca en youtube el clima de hoy").unwrap();
        assert_eq!(family, "media");
        assert_eq!(
            command,
            Command::MediaSearch {
                query: "el clima de hoy".into()
            }
        );
    }

    #[test]
    fn test_unrecognized_prompt_is_not_a_command() {
        let (processor, _, _) = processor();
        assert!(processor.classify("cuéntame un chiste").is_none());
    }

    #[tokio::test]
    async fn test_dispatch_media_search_opens_results() {
        let (processor, browser, _) = processor();
        let reply = processor.dispatch("busca en youtube lofi").await.unwrap();
        assert_eq!(reply, "EndyOS buscando \"lofi\" en YouTube");

        let opened = browser.0.lock().unwrap();
        assert_eq!(
            opened.as_slice(),
            ["https://www.youtube.com/results?search_query=lofi"]
        );
    }

    #[tokio::test]
    async fn test_play_without_lookup_falls_back_to_results() {
        let (processor, _, _) = processor();
        let reply = processor
            .execute(Command::MediaPlay {
                query: "lofi".into(),
                mode: PlaybackMode::Embedded,
            })
            .await;
        assert!(reply.contains("Haz clic en el primer video"));
    }

    #[tokio::test]
    async fn test_weather_uses_default_city_and_cache() {
        let (processor, _, weather) = processor();
        let reply = processor.dispatch("clima hoy").await.unwrap();
        assert!(reply.contains("Cancun"));
        assert!(reply.contains("28°C"));

        processor.dispatch("clima hoy").await;
        assert_eq!(weather.0.load(Ordering::SeqCst), 1);

        processor.clear_caches();
        processor.dispatch("clima hoy").await;
        assert_eq!(weather.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_backend_failures_degrade_to_text() {
        let (processor, _, _) = processor();
        let reply = processor.dispatch("precio de bitcoin").await.unwrap();
        assert_eq!(
            reply,
            "No pude obtener los precios de criptomonedas en este momento."
        );

        let reply = processor.dispatch("dime un dato curioso").await.unwrap();
        assert!(reply.starts_with("Aquí tienes un dato curioso: "));

        let reply = processor.dispatch("¿cuál es mi ubicación?").await.unwrap();
        assert_eq!(reply, "No pude obtener tu información de ubicación.");
    }
}
