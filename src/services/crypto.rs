//! Crypto prices (CoinGecko)

use crate::cache::TtlCache;
use crate::config::Config;
use crate::error::{AssistantError, AssistantResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Quote for a single coin
#[derive(Debug, Clone, PartialEq)]
pub struct CoinPrice {
    pub id: String,
    pub usd: f64,
    pub eur: f64,
    pub change_24h: f64,
}

impl CoinPrice {
    /// Coin id with its first letter capitalized
    pub fn display_name(&self) -> String {
        let mut chars = self.id.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    fn trend(&self) -> &'static str {
        if self.change_24h >= 0.0 {
            "al alza"
        } else {
            "a la baja"
        }
    }
}

/// Group thousands and keep at most two decimals: 67432.519 -> "67,432.52"
pub fn format_amount(amount: f64) -> String {
    let rendered = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));

    let mut grouped = String::new();
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let frac = frac_part.trim_end_matches('0');
    let sign = if amount < 0.0 && rendered != "0.00" { "-" } else { "" };
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}

/// External price backend
#[async_trait]
pub trait CryptoBackend: Send + Sync {
    async fn prices(&self, coins: &[String]) -> AssistantResult<Vec<CoinPrice>>;
}

#[derive(Deserialize)]
struct Quote {
    usd: Option<f64>,
    eur: Option<f64>,
    usd_24h_change: Option<f64>,
}

/// Validate a CoinGecko simple-price payload, keeping the requested order
pub fn parse_prices(body: &str, coins: &[String]) -> AssistantResult<Vec<CoinPrice>> {
    let mut quotes: HashMap<String, Quote> = serde_json::from_str(body)
        .map_err(|e| AssistantError::MalformedResponse(format!("crypto: {e}")))?;

    Ok(coins
        .iter()
        .filter_map(|coin| {
            quotes.remove(coin).map(|quote| CoinPrice {
                id: coin.clone(),
                usd: quote.usd.unwrap_or_default(),
                eur: quote.eur.unwrap_or_default(),
                change_24h: quote.usd_24h_change.unwrap_or_default(),
            })
        })
        .collect())
}

/// CoinGecko simple-price client
pub struct CoinGeckoClient {
    timeout: Duration,
    client: reqwest::Client,
}

impl CoinGeckoClient {
    pub fn new(config: &Config) -> Self {
        Self {
            timeout: config.http_timeout(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CryptoBackend for CoinGeckoClient {
    async fn prices(&self, coins: &[String]) -> AssistantResult<Vec<CoinPrice>> {
        let ids = coins.join(",");
        let response = self
            .client
            .get("https://api.coingecko.com/api/v3/simple/price")
            .query(&[
                ("ids", ids.as_str()),
                ("vs_currencies", "usd,eur"),
                ("include_24hr_change", "true"),
            ])
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::Transport(format!("crypto HTTP {status}")));
        }

        parse_prices(&response.text().await?, coins)
    }
}

/// Crypto command handler with a per-coin-set cache
pub struct CryptoService {
    backend: Arc<dyn CryptoBackend>,
    cache: TtlCache<Vec<CoinPrice>>,
    ttl: Duration,
}

impl CryptoService {
    pub fn new(backend: Arc<dyn CryptoBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            cache: TtlCache::new("crypto"),
            ttl,
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub async fn prices(&self, coins: &[String]) -> AssistantResult<Vec<CoinPrice>> {
        let cache_key = format!("crypto_{}", coins.join("_"));
        if let Some(prices) = self.cache.get(&cache_key) {
            return Ok(prices);
        }

        let prices = self.backend.prices(coins).await?;
        self.cache.set(cache_key, prices.clone(), self.ttl);
        Ok(prices)
    }

    /// Spoken answer for a crypto command
    pub async fn describe(&self, coins: &[String]) -> String {
        match self.prices(coins).await {
            Ok(prices) if !prices.is_empty() => {
                let mut reply = String::from("Precios de criptomonedas:");
                for coin in &prices {
                    reply.push_str(&format!(
                        " {}: ${} (€{}), cambio 24h: {:.2}% {}.",
                        coin.display_name(),
                        format_amount(coin.usd),
                        format_amount(coin.eur),
                        coin.change_24h,
                        coin.trend()
                    ));
                }
                reply
            }
            Ok(_) => "No pude obtener los precios de criptomonedas en este momento.".to_string(),
            Err(e) => {
                warn!("❌ Crypto lookup failed: {}", e);
                "No pude obtener los precios de criptomonedas en este momento.".to_string()
            }
        }
    }
}
