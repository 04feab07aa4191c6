//! Command matching module
//!
//! Classifies a raw prompt into a structured [`Command`]. Each matcher owns
//! an ordered rule list (first matching rule wins) and the dispatcher tries
//! matchers in a fixed global priority. Matching is case-insensitive and
//! substring based: a prompt with several trigger words resolves by that
//! priority, not by specificity.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

/// Fallback city when a weather prompt names none
pub const DEFAULT_CITY: &str = "Cancun";

/// Coins reported when the prompt does not single one out
pub const DEFAULT_COINS: &[&str] = &["bitcoin", "ethereum"];

const PLAY_VERBS: &str = "reproduce|reproducir|pon|poner|play";

const MEDIA_OPEN_PHRASES: &[&str] = &["abre youtube", "abrir youtube"];
const EMBEDDED_QUALIFIERS: &[&str] = &["aquí", "integrado", "embebido"];
const WEATHER_KEYWORDS: &[&str] = &["clima", "tiempo"];
const CRYPTO_KEYWORDS: &[&str] = &["bitcoin", "crypto", "ethereum"];
const TRIVIA_KEYWORDS: &[&str] = &["dato curioso", "curiosidad", "sorpréndeme"];
const LOCATION_KEYWORDS: &[&str] = &["mi ubicación", "donde estoy", "mi ip"];

/// Popular sites that can be opened by name
const KNOWN_SITES: &[(&str, &str)] = &[
    ("facebook", "https://facebook.com"),
    ("twitter", "https://twitter.com"),
    ("instagram", "https://instagram.com"),
    ("linkedin", "https://linkedin.com"),
    ("github", "https://github.com"),
    ("stackoverflow", "https://stackoverflow.com"),
    ("reddit", "https://reddit.com"),
    ("netflix", "https://netflix.com"),
    ("amazon", "https://amazon.com"),
    ("gmail", "https://gmail.com"),
    ("google drive", "https://drive.google.com"),
    ("whatsapp", "https://web.whatsapp.com"),
    ("telegram", "https://web.telegram.org"),
    ("discord", "https://discord.com/app"),
    ("spotify", "https://open.spotify.com"),
    ("twitch", "https://twitch.tv"),
];

lazy_static! {
    static ref MEDIA_PLAY: [Regex; 2] = [
        Regex::new(&format!(r"(?:{PLAY_VERBS}).*?(?:en youtube|youtube)\s+(.+)")).unwrap(),
        Regex::new(&format!(r"(?:youtube).*?(?:{PLAY_VERBS})\s+(.+)")).unwrap(),
    ];
    static ref MEDIA_SEARCH: [Regex; 2] = [
        Regex::new(r"(?:busca en youtube|buscar en youtube)\s+(.+)").unwrap(),
        Regex::new(r"en youtube\s+(.+)").unwrap(),
    ];
    static ref BROWSER_OPEN: Regex = Regex::new(r"(?:abre|abrir)\s+(.+)").unwrap();
    static ref BROWSER_SEARCH: Regex = Regex::new(r"(?:busca|buscar)\s+(.+)").unwrap();
    static ref WORD_DOT_WORD: Regex = Regex::new(r"\w+\.\w+").unwrap();
    static ref BARE_URL: [Regex; 2] = [
        Regex::new(r"(https?://\S+)").unwrap(),
        Regex::new(r"([a-z0-9.-]+\.[a-z]{2,})").unwrap(),
    ];
    static ref CITY: [Regex; 2] = [
        Regex::new(r"(?i)(?:clima|tiempo).*?(?:en|de)\s+([a-záéíóúñ\s]+)").unwrap(),
        Regex::new(r"(?i)([a-záéíóúñ\s]+).*?(?:clima|tiempo)").unwrap(),
    ];
}

/// A user prompt in its original and lowercased forms
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub raw: String,
    pub lower: String,
}

impl Prompt {
    pub fn new(raw: &str) -> Self {
        let raw = raw.trim().to_string();
        let lower = raw.to_lowercase();
        Self { raw, lower }
    }

    fn contains_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|kw| self.lower.contains(kw))
    }
}

/// Where a media playback request should land
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    /// In-page player
    Embedded,
    /// New browser tab/window
    External,
}

/// A structured command extracted from a prompt
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Open a URL (scheme already normalized)
    BrowserOpen { url: String },
    /// Generic web search
    BrowserSearch { query: String },
    /// Open the media site's home page
    MediaOpen,
    /// Show media search results
    MediaSearch { query: String },
    /// Look up the first result and play it
    MediaPlay { query: String, mode: PlaybackMode },
    WeatherQuery { city: String },
    CryptoQuery { coins: Vec<String> },
    TriviaQuery,
    LocationQuery,
}

impl Command {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Command::BrowserOpen { .. } => "browser_open",
            Command::BrowserSearch { .. } => "browser_search",
            Command::MediaOpen => "media_open",
            Command::MediaSearch { .. } => "media_search",
            Command::MediaPlay { .. } => "media_play",
            Command::WeatherQuery { .. } => "weather",
            Command::CryptoQuery { .. } => "crypto",
            Command::TriviaQuery => "trivia",
            Command::LocationQuery => "location",
        }
    }
}

/// A family of prompt rules mapping text to a command
pub trait Matcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Return the command of the first rule that matches, if any
    fn match_prompt(&self, prompt: &Prompt) -> Option<Command>;
}

fn capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Media-site commands: open, play (embedded or external), search
pub struct MediaMatcher;

impl Matcher for MediaMatcher {
    fn name(&self) -> &'static str {
        "media"
    }

    fn match_prompt(&self, prompt: &Prompt) -> Option<Command> {
        let text = prompt.lower.as_str();

        if prompt.contains_any(MEDIA_OPEN_PHRASES) {
            return Some(Command::MediaOpen);
        }

        if let Some(query) = capture(MEDIA_PLAY.as_slice(), text) {
            let mode = if prompt.contains_any(EMBEDDED_QUALIFIERS) {
                PlaybackMode::Embedded
            } else {
                PlaybackMode::External
            };
            return Some(Command::MediaPlay { query, mode });
        }

        capture(MEDIA_SEARCH.as_slice(), text).map(|query| Command::MediaSearch { query })
    }
}

/// Generic browser commands: open a site/URL or search the web
pub struct BrowserMatcher;

impl Matcher for BrowserMatcher {
    fn name(&self) -> &'static str {
        "browser"
    }

    fn match_prompt(&self, prompt: &Prompt) -> Option<Command> {
        let text = prompt.lower.as_str();

        if let Some(target) = capture(std::slice::from_ref(&*BROWSER_OPEN), text) {
            if target.contains('.') || target.starts_with("http") {
                return Some(Command::BrowserOpen {
                    url: normalize_url(&target),
                });
            }
            if let Some(url) = known_site_url(&target) {
                return Some(Command::BrowserOpen {
                    url: url.to_string(),
                });
            }
            return Some(Command::BrowserSearch {
                query: format!("sitio {target}"),
            });
        }

        if let Some(query) = capture(std::slice::from_ref(&*BROWSER_SEARCH), text) {
            return Some(Command::BrowserSearch { query });
        }

        // Ellipses ("pues...bueno") are not domains
        if !text.contains("http") && !WORD_DOT_WORD.is_match(text) {
            return None;
        }
        capture(BARE_URL.as_slice(), text).map(|target| Command::BrowserOpen {
            url: normalize_url(&target),
        })
    }
}

/// Data-API commands: weather, crypto, trivia, location (in that order)
pub struct DataApiMatcher {
    default_city: String,
    default_coins: Vec<String>,
}

impl DataApiMatcher {
    pub fn new(default_city: &str, default_coins: &[String]) -> Self {
        Self {
            default_city: default_city.to_string(),
            default_coins: default_coins.to_vec(),
        }
    }
}

impl Default for DataApiMatcher {
    fn default() -> Self {
        let coins: Vec<String> = DEFAULT_COINS.iter().map(|c| c.to_string()).collect();
        Self::new(DEFAULT_CITY, &coins)
    }
}

impl Matcher for DataApiMatcher {
    fn name(&self) -> &'static str {
        "data_api"
    }

    fn match_prompt(&self, prompt: &Prompt) -> Option<Command> {
        if prompt.contains_any(WEATHER_KEYWORDS) {
            let city = extract_city(&prompt.raw).unwrap_or_else(|| {
                debug!("No city in weather prompt, using {}", self.default_city);
                self.default_city.clone()
            });
            return Some(Command::WeatherQuery { city });
        }

        if prompt.contains_any(CRYPTO_KEYWORDS) {
            return Some(Command::CryptoQuery {
                coins: extract_coins(&prompt.lower, &self.default_coins),
            });
        }

        if prompt.contains_any(TRIVIA_KEYWORDS) {
            return Some(Command::TriviaQuery);
        }

        if prompt.contains_any(LOCATION_KEYWORDS) {
            return Some(Command::LocationQuery);
        }

        None
    }
}

/// Extract a city from a weather prompt, preserving the user's casing
///
/// Tries "clima/tiempo ... en/de <city>" first, then "<city> ... clima/tiempo".
pub fn extract_city(prompt: &str) -> Option<String> {
    capture(CITY.as_slice(), prompt)
}

/// Pick the coins a crypto prompt asks about
///
/// Exactly one of bitcoin/ethereum mentioned selects that coin alone;
/// anything else falls back to `defaults`.
pub fn extract_coins(prompt_lower: &str, defaults: &[String]) -> Vec<String> {
    let bitcoin = prompt_lower.contains("bitcoin");
    let ethereum = prompt_lower.contains("ethereum");
    match (bitcoin, ethereum) {
        (true, false) => vec!["bitcoin".to_string()],
        (false, true) => vec!["ethereum".to_string()],
        _ => defaults.to_vec(),
    }
}

/// Look up a popular site by spoken name
pub fn known_site_url(name: &str) -> Option<&'static str> {
    let name = name.trim().to_lowercase();
    KNOWN_SITES
        .iter()
        .find(|(site, _)| *site == name)
        .map(|(_, url)| *url)
}

/// Prefix `https://` when the target carries no scheme
pub fn normalize_url(target: &str) -> String {
    if target.starts_with("http://") || target.starts_with("https://") {
        target.to_string()
    } else {
        format!("https://{target}")
    }
}
