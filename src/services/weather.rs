//! Weather lookups (wttr.in)

use crate::cache::TtlCache;
use crate::config::Config;
use crate::error::{AssistantError, AssistantResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Current conditions for a location
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    /// "Area, Country"
    pub location: String,
    pub temperature_c: String,
    pub feels_like_c: String,
    pub description: String,
    pub humidity: String,
    pub wind_speed_kmph: String,
    pub wind_direction: String,
    pub pressure_mb: String,
    pub visibility_km: String,
    pub uv_index: Option<String>,
}

impl WeatherReport {
    /// Spoken summary of the report
    pub fn summary(&self) -> String {
        format!(
            "El clima en {}: {}°C (sensación {}°C), {}. Humedad {}%, viento {} km/h {}. Presión {} mb, visibilidad {} km, índice UV {}.",
            self.location,
            self.temperature_c,
            self.feels_like_c,
            self.description,
            self.humidity,
            self.wind_speed_kmph,
            self.wind_direction,
            self.pressure_mb,
            self.visibility_km,
            self.uv_index.as_deref().unwrap_or("N/A"),
        )
    }
}

/// External weather backend
#[async_trait]
pub trait WeatherBackend: Send + Sync {
    async fn current(&self, city: &str) -> AssistantResult<WeatherReport>;
}

#[derive(Deserialize)]
struct TextValue {
    value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NearestArea {
    area_name: Vec<TextValue>,
    country: Vec<TextValue>,
}

#[derive(Deserialize)]
struct CurrentCondition {
    #[serde(rename = "temp_C")]
    temp_c: String,
    #[serde(rename = "FeelsLikeC")]
    feels_like_c: String,
    #[serde(rename = "weatherDesc")]
    weather_desc: Vec<TextValue>,
    humidity: String,
    #[serde(rename = "windspeedKmph")]
    windspeed_kmph: String,
    #[serde(rename = "winddir16Point")]
    winddir_16_point: String,
    pressure: String,
    visibility: String,
    #[serde(rename = "uvIndex")]
    uv_index: Option<String>,
}

#[derive(Deserialize)]
struct WttrResponse {
    current_condition: Vec<CurrentCondition>,
    nearest_area: Vec<NearestArea>,
}

fn first<T>(items: Vec<T>, field: &str) -> AssistantResult<T> {
    items
        .into_iter()
        .next()
        .ok_or_else(|| AssistantError::MalformedResponse(format!("weather: empty '{field}'")))
}

/// Validate a wttr.in `format=j1` payload into a report
pub fn parse_wttr(body: &str) -> AssistantResult<WeatherReport> {
    let data: WttrResponse = serde_json::from_str(body)
        .map_err(|e| AssistantError::MalformedResponse(format!("weather: {e}")))?;

    let current = first(data.current_condition, "current_condition")?;
    let area = first(data.nearest_area, "nearest_area")?;
    let area_name = first(area.area_name, "areaName")?.value;
    let country = first(area.country, "country")?.value;
    let description = first(current.weather_desc, "weatherDesc")?.value;

    Ok(WeatherReport {
        location: format!("{area_name}, {country}"),
        temperature_c: current.temp_c,
        feels_like_c: current.feels_like_c,
        description,
        humidity: current.humidity,
        wind_speed_kmph: current.windspeed_kmph,
        wind_direction: current.winddir_16_point,
        pressure_mb: current.pressure,
        visibility_km: current.visibility,
        uv_index: current.uv_index,
    })
}

/// wttr.in JSON client
pub struct WttrClient {
    timeout: Duration,
    client: reqwest::Client,
}

impl WttrClient {
    pub fn new(config: &Config) -> Self {
        Self {
            timeout: config.http_timeout(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl WeatherBackend for WttrClient {
    async fn current(&self, city: &str) -> AssistantResult<WeatherReport> {
        let url = format!("https://wttr.in/{}?format=j1", urlencoding::encode(city));
        debug!("🌤️ Fetching weather: {}", url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, "EndyOS Weather Client")
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::Transport(format!("weather HTTP {status}")));
        }

        parse_wttr(&response.text().await?)
    }
}

/// Weather command handler with a per-city cache
pub struct WeatherService {
    backend: Arc<dyn WeatherBackend>,
    cache: TtlCache<WeatherReport>,
    ttl: Duration,
}

impl WeatherService {
    pub fn new(backend: Arc<dyn WeatherBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            cache: TtlCache::new("weather"),
            ttl,
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub async fn report(&self, city: &str) -> AssistantResult<WeatherReport> {
        let cache_key = format!("weather_{}", city.to_lowercase());
        if let Some(report) = self.cache.get(&cache_key) {
            return Ok(report);
        }

        let report = self.backend.current(city).await?;
        info!("✅ Weather fetched for {}", report.location);
        self.cache.set(cache_key, report.clone(), self.ttl);
        Ok(report)
    }

    /// Spoken answer for a weather command
    pub async fn describe(&self, city: &str) -> String {
        match self.report(city).await {
            Ok(report) => report.summary(),
            Err(e) => {
                warn!("❌ Weather lookup failed for '{}': {}", city, e);
                "No pude obtener información del clima en este momento.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKYO: &str = r#"{
        "current_condition": [{
            "temp_C": "20", "FeelsLikeC": "19", "humidity": "60",
            "weatherDesc": [{"value": "Clear"}],
            "windspeedKmph": "11", "winddir16Point": "NE",
            "pressure": "1015", "visibility": "10"
        }],
        "nearest_area": [{
            "areaName": [{"value": "Tokio"}],
            "country": [{"value": "Japón"}]
        }]
    }"#;

    #[test]
    fn test_parse_wttr() {
        let report = parse_wttr(TOKYO).unwrap();
        assert_eq!(report.location, "Tokio, Japón");
        assert_eq!(report.temperature_c, "20");
        assert_eq!(report.uv_index, None);

        let summary = report.summary();
        assert!(summary.contains("20°C"));
        assert!(summary.contains("Tokio"));
        assert!(summary.contains("índice UV N/A"));
    }

    #[test]
    fn test_missing_nested_fields_are_malformed() {
        let err = parse_wttr(r#"{"current_condition": [], "nearest_area": []}"#).unwrap_err();
        assert!(matches!(err, AssistantError::MalformedResponse(_)));

        let err = parse_wttr(r#"{"nearest_area": []}"#).unwrap_err();
        assert!(matches!(err, AssistantError::MalformedResponse(_)));
    }
}
