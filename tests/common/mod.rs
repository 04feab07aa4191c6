#![allow(dead_code)]

pub mod mock_backends;
pub mod mock_tts;

use endyos::assistant::Assistant;
use endyos::config::Config;
use endyos::services::Backends;
use mock_backends::{MockGenerator, MockWeather, Offline, RecordingBrowser, UnconfiguredMedia};
use mock_tts::MockTts;
use std::sync::Arc;

/// An assistant wired to mocks, with handles on each mock
pub struct TestContext {
    pub assistant: Arc<Assistant>,
    pub tts: Arc<MockTts>,
    pub browser: Arc<RecordingBrowser>,
    pub weather: Arc<MockWeather>,
    pub media: Arc<UnconfiguredMedia>,
    pub generator: Arc<MockGenerator>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_generator(MockGenerator::new("Hola, soy **EndyOS**."))
    }

    pub fn with_generator(generator: MockGenerator) -> Self {
        let tts = Arc::new(MockTts::new());
        let browser = Arc::new(RecordingBrowser::default());
        let weather = Arc::new(MockWeather::default());
        let media = Arc::new(UnconfiguredMedia::default());
        let generator = Arc::new(generator);

        let backends = Backends {
            browser: browser.clone(),
            media: media.clone(),
            weather: weather.clone(),
            crypto: Arc::new(Offline),
            trivia: Arc::new(Offline),
            geo: Arc::new(Offline),
            generator: generator.clone(),
        };
        let assistant = Arc::new(Assistant::new(&Config::default(), backends, tts.clone()));

        Self {
            assistant,
            tts,
            browser,
            weather,
            media,
            generator,
        }
    }
}
