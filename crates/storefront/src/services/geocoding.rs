//! Reverse geocoding for the profile location.
//!
//! Talks to a Nominatim-compatible `/reverse` endpoint. Lookups never fail
//! from the caller's point of view: anything short of a usable place name
//! falls back to the rounded coordinates.

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::GeocodingConfig;

/// Shown when neither coordinates nor a manual place were usable.
pub const LOCATION_UNAVAILABLE: &str = "Could not get location. Enter it manually.";

/// Address parts of a Nominatim reverse response.
#[derive(Debug, Default, Deserialize)]
pub struct Address {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Error)]
enum LookupError {
    #[error("invalid geocoding URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<Address>,
}

/// `city, state, country` with empty parts skipped. `None` if all are empty.
#[must_use]
pub fn format_place(address: &Address) -> Option<String> {
    let non_empty = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let locality = non_empty(&address.city)
        .or_else(|| non_empty(&address.town))
        .or_else(|| non_empty(&address.village))
        .or_else(|| non_empty(&address.county));

    let parts: Vec<String> = [locality, non_empty(&address.state), non_empty(&address.country)]
        .into_iter()
        .flatten()
        .collect();

    (!parts.is_empty()).then(|| parts.join(", "))
}

/// Coordinates rounded to four places.
#[must_use]
pub fn coordinate_fallback(lat: f64, lon: f64) -> String {
    format!("{lat:.4}, {lon:.4}")
}

/// Validate a manually entered place.
pub fn manual_location(input: &str) -> Result<String, &'static str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(LOCATION_UNAVAILABLE)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Reverse geocoding client.
#[derive(Clone)]
pub struct Geocoder {
    client: reqwest::Client,
    url: String,
}

impl Geocoder {
    #[must_use]
    pub fn new(config: &GeocodingConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: config.url.clone(),
        }
    }

    /// Place name for coordinates, or the coordinate fallback.
    #[instrument(skip(self))]
    pub async fn place_name(&self, lat: f64, lon: f64) -> String {
        match self.lookup(lat, lon).await {
            Ok(Some(place)) => place,
            Ok(None) => coordinate_fallback(lat, lon),
            Err(e) => {
                tracing::warn!(error = %e, "Reverse geocoding failed");
                coordinate_fallback(lat, lon)
            }
        }
    }

    fn reverse_url(&self, lat: f64, lon: f64) -> Result<Url, url::ParseError> {
        Url::parse_with_params(
            &self.url,
            [
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
            ],
        )
    }

    async fn lookup(&self, lat: f64, lon: f64) -> Result<Option<String>, LookupError> {
        let response: ReverseResponse = self
            .client
            .get(self.reverse_url(lat, lon)?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.address.as_ref().and_then(format_place))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address(city: Option<&str>, town: Option<&str>, state: &str, country: &str) -> Address {
        Address {
            city: city.map(str::to_string),
            town: town.map(str::to_string),
            state: Some(state.to_string()),
            country: Some(country.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_format_place_prefers_city() {
        let a = address(Some("Bengaluru"), Some("Yelahanka"), "Karnataka", "India");
        assert_eq!(format_place(&a).as_deref(), Some("Bengaluru, Karnataka, India"));
    }

    #[test]
    fn test_format_place_skips_empty_parts() {
        let a = address(None, Some("Manali"), " ", "India");
        assert_eq!(format_place(&a).as_deref(), Some("Manali, India"));
        assert_eq!(format_place(&Address::default()), None);
    }

    #[test]
    fn test_coordinate_fallback() {
        assert_eq!(coordinate_fallback(12.971_598_7, 77.594_562_7), "12.9716, 77.5946");
    }

    #[test]
    fn test_manual_location() {
        assert_eq!(manual_location("  Pune ").as_deref(), Ok("Pune"));
        assert_eq!(manual_location("   "), Err(LOCATION_UNAVAILABLE));
    }

    fn geocoder(url: &str) -> Geocoder {
        Geocoder::new(&GeocodingConfig {
            url: url.to_string(),
            user_agent: "test".to_string(),
        })
    }

    #[test]
    fn test_reverse_url_carries_coordinates() {
        let url = geocoder("https://nominatim.example.org/reverse")
            .reverse_url(12.5, 77.25)
            .unwrap();
        assert_eq!(url.path(), "/reverse");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            [
                ("lat".to_string(), "12.5".to_string()),
                ("lon".to_string(), "77.25".to_string()),
                ("format".to_string(), "json".to_string()),
                ("addressdetails".to_string(), "1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_falls_back_to_coordinates() {
        let geocoder = geocoder("http://127.0.0.1:9/reverse");
        assert_eq!(geocoder.place_name(1.5, -2.25).await, "1.5000, -2.2500");
    }

    #[tokio::test]
    async fn test_invalid_url_falls_back_to_coordinates() {
        let geocoder = geocoder("not a url");
        assert!(geocoder.reverse_url(1.5, -2.25).is_err());
        assert_eq!(geocoder.place_name(1.5, -2.25).await, "1.5000, -2.2500");
    }
}
