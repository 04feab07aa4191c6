//! External collaborators behind the command handlers
//!
//! Each service pairs a narrow backend trait (one HTTP client in
//! production, a mock in tests) with the caching and message formatting
//! that turn a backend reply into spoken text.

pub mod browser;
pub mod crypto;
pub mod location;
pub mod media;
pub mod trivia;
pub mod weather;

use crate::config::Config;
use crate::core::generative::{OpenRouterClient, TextGenerator};
use browser::{Browser, SystemBrowser};
use crypto::{CoinGeckoClient, CryptoBackend};
use location::{GeoBackend, HttpGeoClient};
use media::{MediaSearchBackend, YouTubeClient};
use std::sync::Arc;
use trivia::{NumbersApiClient, TriviaBackend};
use weather::{WeatherBackend, WttrClient};

/// The full set of backends an assistant talks to
#[derive(Clone)]
pub struct Backends {
    pub browser: Arc<dyn Browser>,
    pub media: Arc<dyn MediaSearchBackend>,
    pub weather: Arc<dyn WeatherBackend>,
    pub crypto: Arc<dyn CryptoBackend>,
    pub trivia: Arc<dyn TriviaBackend>,
    pub geo: Arc<dyn GeoBackend>,
    pub generator: Arc<dyn TextGenerator>,
}

impl Backends {
    /// Production backends talking to the real HTTP services
    pub fn http(config: &Config) -> Self {
        Self {
            browser: Arc::new(SystemBrowser),
            media: Arc::new(YouTubeClient::new(config)),
            weather: Arc::new(WttrClient::new(config)),
            crypto: Arc::new(CoinGeckoClient::new(config)),
            trivia: Arc::new(NumbersApiClient::new(config)),
            geo: Arc::new(HttpGeoClient::new(config)),
            generator: Arc::new(OpenRouterClient::new(config)),
        }
    }
}
