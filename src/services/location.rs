//! Two-tier geolocation
//!
//! Device coordinates (present only when the user shared them) are
//! reverse-geocoded to a city; otherwise the public IP is looked up. Each
//! tier is cached under its own key.

use crate::cache::TtlCache;
use crate::config::{Config, Coordinates};
use crate::error::{AssistantError, AssistantResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const DEVICE_KEY: &str = "location_device";
const IP_KEY: &str = "location_ip";
const UNKNOWN: &str = "Desconocida";

/// Where the user appears to be
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    Device {
        latitude: f64,
        longitude: f64,
        city: String,
    },
    Ip {
        ip: String,
        city: String,
        region: String,
        country: String,
        timezone: String,
        latitude: Option<f64>,
        longitude: Option<f64>,
    },
}

impl Location {
    pub fn city(&self) -> &str {
        match self {
            Location::Device { city, .. } | Location::Ip { city, .. } => city,
        }
    }

    /// Spoken summary of the location
    pub fn summary(&self) -> String {
        match self {
            Location::Device {
                latitude,
                longitude,
                city,
            } => format!(
                "Tu ubicación aproximada es: {city}. Coordenadas: {latitude}, {longitude} (obtenidas por GPS)"
            ),
            Location::Ip {
                ip,
                city,
                region,
                country,
                timezone,
                ..
            } => format!(
                "Tu IP es {ip}. Te encuentras en {city}, {region}, {country}. Zona horaria: {timezone}."
            ),
        }
    }
}

/// External geolocation services
#[async_trait]
pub trait GeoBackend: Send + Sync {
    /// City name for a coordinate pair, if the service knows one
    async fn reverse_geocode(&self, coords: Coordinates) -> AssistantResult<Option<String>>;

    /// Location of the caller's public IP
    async fn ip_lookup(&self) -> AssistantResult<Location>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReverseGeocode {
    city: Option<String>,
    locality: Option<String>,
    principal_subdivision: Option<String>,
}

#[derive(Deserialize)]
struct IpInfo {
    ip: Option<String>,
    city: Option<String>,
    region: Option<String>,
    country_name: Option<String>,
    timezone: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn parse_reverse_geocode(body: &str) -> AssistantResult<Option<String>> {
    let data: ReverseGeocode = serde_json::from_str(body)
        .map_err(|e| AssistantError::MalformedResponse(format!("reverse geocode: {e}")))?;
    Ok(non_empty(data.city)
        .or_else(|| non_empty(data.locality))
        .or_else(|| non_empty(data.principal_subdivision)))
}

pub fn parse_ip_info(body: &str) -> AssistantResult<Location> {
    let data: IpInfo = serde_json::from_str(body)
        .map_err(|e| AssistantError::MalformedResponse(format!("ip lookup: {e}")))?;
    let or_unknown = |v: Option<String>| non_empty(v).unwrap_or_else(|| UNKNOWN.to_string());
    Ok(Location::Ip {
        ip: or_unknown(data.ip),
        city: or_unknown(data.city),
        region: or_unknown(data.region),
        country: non_empty(data.country_name).unwrap_or_else(|| "Desconocido".to_string()),
        timezone: or_unknown(data.timezone),
        latitude: data.latitude,
        longitude: data.longitude,
    })
}

/// BigDataCloud reverse geocoding + ipapi.co lookups
pub struct HttpGeoClient {
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpGeoClient {
    pub fn new(config: &Config) -> Self {
        Self {
            timeout: config.http_timeout(),
            client: reqwest::Client::new(),
        }
    }

    async fn get_text(&self, request: reqwest::RequestBuilder) -> AssistantResult<String> {
        let response = request.timeout(self.timeout).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::Transport(format!("geolocation HTTP {status}")));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl GeoBackend for HttpGeoClient {
    async fn reverse_geocode(&self, coords: Coordinates) -> AssistantResult<Option<String>> {
        let request = self
            .client
            .get("https://api.bigdatacloud.net/data/reverse-geocode-client")
            .query(&[
                ("latitude", coords.latitude.to_string()),
                ("longitude", coords.longitude.to_string()),
                ("localityLanguage", "es".to_string()),
            ]);
        parse_reverse_geocode(&self.get_text(request).await?)
    }

    async fn ip_lookup(&self) -> AssistantResult<Location> {
        let request = self.client.get("https://ipapi.co/json/");
        parse_ip_info(&self.get_text(request).await?)
    }
}

pub struct LocationService {
    backend: Arc<dyn GeoBackend>,
    device: Option<Coordinates>,
    cache: TtlCache<Location>,
    ttl: Duration,
}

impl LocationService {
    pub fn new(backend: Arc<dyn GeoBackend>, device: Option<Coordinates>, ttl: Duration) -> Self {
        Self {
            backend,
            device,
            cache: TtlCache::new("location"),
            ttl,
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Resolve the current location, device tier first
    pub async fn current(&self) -> Option<Location> {
        if let Some(coords) = self.device {
            return Some(self.device_location(coords).await);
        }
        self.ip_location().await
    }

    async fn device_location(&self, coords: Coordinates) -> Location {
        if let Some(location) = self.cache.get(DEVICE_KEY) {
            return location;
        }

        let city = match self.backend.reverse_geocode(coords).await {
            Ok(Some(city)) => city,
            Ok(None) => "Unknown".to_string(),
            Err(e) => {
                warn!("❌ Reverse geocoding failed: {}", e);
                "Unknown".to_string()
            }
        };
        debug!("📍 Device location resolved to {}", city);

        let location = Location::Device {
            latitude: coords.latitude,
            longitude: coords.longitude,
            city,
        };
        self.cache.set(DEVICE_KEY, location.clone(), self.ttl);
        location
    }

    async fn ip_location(&self) -> Option<Location> {
        if let Some(location) = self.cache.get(IP_KEY) {
            return Some(location);
        }

        match self.backend.ip_lookup().await {
            Ok(location) => {
                self.cache.set(IP_KEY, location.clone(), self.ttl);
                Some(location)
            }
            Err(e) => {
                warn!("❌ IP location lookup failed: {}", e);
                None
            }
        }
    }

    /// Spoken answer for a location command
    pub async fn describe(&self) -> String {
        match self.current().await {
            Some(location) => location.summary(),
            None => "No pude obtener tu información de ubicación.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingGeo {
        reverse_calls: AtomicUsize,
        ip_calls: AtomicUsize,
    }

    #[async_trait]
    impl GeoBackend for CountingGeo {
        async fn reverse_geocode(&self, _coords: Coordinates) -> AssistantResult<Option<String>> {
            self.reverse_calls.fetch_add(1, Ordering::SeqCst);
            Err(AssistantError::Transport("offline".into()))
        }

        async fn ip_lookup(&self) -> AssistantResult<Location> {
            self.ip_calls.fetch_add(1, Ordering::SeqCst);
            parse_ip_info(r#"{"ip": "203.0.113.7", "city": "Mérida", "region": "Yucatán", "country_name": "México", "timezone": "America/Merida"}"#)
        }
    }

    #[test]
    fn test_reverse_geocode_fallback_chain() {
        assert_eq!(
            parse_reverse_geocode(r#"{"city": "", "locality": "Tulum"}"#).unwrap(),
            Some("Tulum".into())
        );
        assert_eq!(
            parse_reverse_geocode(r#"{"principalSubdivision": "Quintana Roo"}"#).unwrap(),
            Some("Quintana Roo".into())
        );
        assert_eq!(parse_reverse_geocode("{}").unwrap(), None);
    }

    #[test]
    fn test_ip_info_defaults() {
        let location = parse_ip_info(r#"{"ip": "198.51.100.1"}"#).unwrap();
        assert_eq!(location.city(), "Desconocida");
        assert!(location.summary().contains("Desconocido."));
    }

    #[tokio::test]
    async fn test_device_tier_survives_geocode_failure() {
        let geo = Arc::new(CountingGeo::default());
        let coords = Coordinates {
            latitude: 21.16,
            longitude: -86.85,
        };
        let service = LocationService::new(geo.clone(), Some(coords), Duration::from_secs(3600));

        let location = service.current().await.unwrap();
        assert_eq!(location.city(), "Unknown");
        assert!(location.summary().contains("GPS"));

        service.current().await;
        assert_eq!(geo.reverse_calls.load(Ordering::SeqCst), 1);
        assert_eq!(geo.ip_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ip_tier_is_cached() {
        let geo = Arc::new(CountingGeo::default());
        let service = LocationService::new(geo.clone(), None, Duration::from_secs(3600));

        let reply = service.describe().await;
        assert!(reply.contains("Tu IP es 203.0.113.7"));
        assert!(reply.contains("Mérida, Yucatán, México"));

        service.describe().await;
        assert_eq!(geo.ip_calls.load(Ordering::SeqCst), 1);
    }
}
