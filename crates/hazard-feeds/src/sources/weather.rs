// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! OpenWeatherMap current-conditions adapter for a single coordinate.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use serde::Deserialize;

use super::{read_body, ApiKey, FeedError, PointFeed};
use crate::location::{Hazard, UnifiedLocation};

const CURRENT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const CITY_URL: &str = "https://openweathermap.org/city";
const FRESHNESS: Duration = Duration::from_secs(600);

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    coord: Coord,
    weather: Vec<Condition>,
    main: MainReadings,
    name: String,
    /// Observation time, seconds since the epoch.
    dt: i64,
    /// City identifier.
    id: i64,
}

#[derive(Debug, Deserialize)]
struct Coord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
}

/// Parse an OpenWeatherMap `/weather` body (metric units) into one record.
pub fn parse_current_weather(body: &str) -> Result<UnifiedLocation, FeedError> {
    let current: CurrentWeather = serde_json::from_str(body)
        .map_err(|e| FeedError::MalformedResponse(format!("current weather: {e}")))?;

    let condition = current.weather.into_iter().next().ok_or_else(|| {
        FeedError::MalformedResponse("current weather has no conditions".to_string())
    })?;

    let observed_at = current.dt.checked_mul(1000).ok_or_else(|| {
        FeedError::MalformedResponse(format!("observation time {} out of range", current.dt))
    })?;

    Ok(UnifiedLocation {
        lat: current.coord.lat,
        lon: current.coord.lon,
        label: Some(format!("{}: {}", current.name, condition.description)),
        observed_at: Some(observed_at),
        detail_url: Some(format!("{CITY_URL}/{}", current.id)),
        hazard: Hazard::Weather {
            temperature_celsius: current.main.temp,
            icon_code: condition.icon,
        },
    })
}

/// Current weather at a point from OpenWeatherMap.
#[derive(Debug, Clone)]
pub struct OpenWeatherMapCurrent {
    http: reqwest::Client,
    key: ApiKey,
    language: String,
}

impl OpenWeatherMapCurrent {
    /// `language` selects the localization of the condition description
    /// (for example `en` or `tr`).
    #[must_use]
    pub fn new(http: reqwest::Client, key: ApiKey, language: impl Into<String>) -> Self {
        Self {
            http,
            key,
            language: language.into(),
        }
    }

    async fn try_fetch(&self, lat: f64, lon: f64) -> Result<UnifiedLocation, FeedError> {
        debug!("Querying OpenWeatherMap at {lat}, {lon} (lang={})", self.language);

        let response = self
            .http
            .get(CURRENT_WEATHER_URL)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.key.expose().to_string()),
                ("units", "metric".to_string()),
                ("lang", self.language.clone()),
            ])
            .send()
            .await?;

        let body = read_body(response).await?;
        parse_current_weather(&body)
    }
}

#[async_trait]
impl PointFeed for OpenWeatherMapCurrent {
    fn name(&self) -> &'static str {
        "openweathermap"
    }

    fn freshness(&self) -> Duration {
        FRESHNESS
    }

    async fn fetch_point(&self, lat: f64, lon: f64) -> Option<UnifiedLocation> {
        match self.try_fetch(lat, lon).await {
            Ok(record) => Some(record),
            Err(e) => {
                error!("Failed to fetch weather for {lat}, {lon}: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Category;

    const SAMPLE: &str = r#"{
        "coord": {"lon": 32.8597, "lat": 39.9334},
        "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
        "base": "stations",
        "main": {"temp": 18.4, "feels_like": 17.2, "temp_min": 17.0, "temp_max": 19.9, "pressure": 1016, "humidity": 40},
        "dt": 1700000000,
        "sys": {"country": "TR"},
        "id": 323786,
        "name": "Ankara",
        "cod": 200
    }"#;

    #[test]
    fn test_seconds_become_milliseconds() {
        let record = parse_current_weather(SAMPLE).unwrap();
        assert_eq!(record.observed_at, Some(1_700_000_000_000));
    }

    #[test]
    fn test_weather_fields_mapped() {
        let record = parse_current_weather(SAMPLE).unwrap();
        assert_eq!(record.category(), Category::Weather);
        assert!((record.lat - 39.9334).abs() < 1e-9);
        assert!((record.lon - 32.8597).abs() < 1e-9);
        assert_eq!(record.label.as_deref(), Some("Ankara: clear sky"));
        assert_eq!(
            record.detail_url.as_deref(),
            Some("https://openweathermap.org/city/323786")
        );
        assert_eq!(
            record.hazard,
            Hazard::Weather {
                temperature_celsius: 18.4,
                icon_code: "01d".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_conditions_is_malformed() {
        let body = r#"{"coord":{"lon":1.0,"lat":2.0},"weather":[],"main":{"temp":3.0},"name":"X","dt":1,"id":2}"#;
        assert!(matches!(
            parse_current_weather(body),
            Err(FeedError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_error_payload_is_malformed() {
        let body = r#"{"cod": 401, "message": "Invalid API key."}"#;
        assert!(matches!(
            parse_current_weather(body),
            Err(FeedError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_yields_none_without_leaking_key() {
        let key = ApiKey::new("OPENWEATHERMAP_API_KEY", "SECRET-OWM-KEY").unwrap();
        let feed = OpenWeatherMapCurrent::new(crate::sources::unreachable_client(), key, "en");

        let err = feed.try_fetch(39.9334, 32.8597).await.unwrap_err();
        assert!(matches!(err, FeedError::Transport(_)));
        assert!(!err.to_string().contains("SECRET-OWM-KEY"));

        assert!(feed.fetch_point(39.9334, 32.8597).await.is_none());
    }

    #[test]
    fn test_out_of_range_observation_time_is_malformed() {
        let body = SAMPLE.replace("1700000000", &i64::MAX.to_string());
        assert!(matches!(
            parse_current_weather(&body),
            Err(FeedError::MalformedResponse(_))
        ));
    }
}
