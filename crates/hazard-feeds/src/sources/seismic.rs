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

//! USGS earthquake catalog adapter.
//!
//! Queries the FDSN event service for the trailing week of events at or
//! above magnitude 2.5 and maps each GeoJSON feature to a seismic record.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use serde::Deserialize;

use super::{read_body, FeedError, HazardFeed};
use crate::location::{Hazard, UnifiedLocation};

const USGS_QUERY_URL: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";
const WINDOW_DAYS: i64 = 7;
const MIN_MAGNITUDE: f64 = 2.5;
const FRESHNESS: Duration = Duration::from_secs(3600);

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// `[longitude, latitude, depth]`
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct Properties {
    mag: Option<f64>,
    place: Option<String>,
    /// Milliseconds since the epoch.
    time: Option<i64>,
    url: Option<String>,
}

/// Parse a USGS GeoJSON feature collection into seismic records.
///
/// One record is produced per feature, in input order.
pub fn parse_feature_collection(body: &str) -> Result<Vec<UnifiedLocation>, FeedError> {
    let collection: FeatureCollection = serde_json::from_str(body)
        .map_err(|e| FeedError::MalformedResponse(format!("feature collection: {e}")))?;

    collection
        .features
        .into_iter()
        .map(|feature| {
            let (lon, lat) = match feature.geometry.coordinates.as_slice() {
                [lon, lat, ..] => (*lon, *lat),
                other => {
                    return Err(FeedError::MalformedResponse(format!(
                        "feature has {} coordinates, expected at least 2",
                        other.len()
                    )))
                }
            };
            let props = feature.properties;
            Ok(UnifiedLocation {
                lat,
                lon,
                label: props.place,
                observed_at: props.time,
                detail_url: props.url,
                hazard: Hazard::Seismic {
                    magnitude: props.mag.unwrap_or(f64::NAN),
                },
            })
        })
        .collect()
}

/// `(starttime, endtime)` query dates for the window ending at `now`.
fn query_window(now: DateTime<Utc>) -> (String, String) {
    let start = now - chrono::Duration::days(WINDOW_DAYS);
    (
        start.format("%Y-%m-%d").to_string(),
        now.format("%Y-%m-%d").to_string(),
    )
}

/// Earthquakes from the USGS catalog.
#[derive(Debug, Clone)]
pub struct UsgsEarthquakes {
    http: reqwest::Client,
}

impl UsgsEarthquakes {
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn try_fetch(&self) -> Result<Vec<UnifiedLocation>, FeedError> {
        let (start, end) = query_window(Utc::now());
        debug!("Querying USGS events {start}..{end} (M{MIN_MAGNITUDE}+)");

        let response = self
            .http
            .get(USGS_QUERY_URL)
            .query(&[
                ("format", "geojson".to_string()),
                ("starttime", start),
                ("endtime", end),
                ("minmagnitude", MIN_MAGNITUDE.to_string()),
            ])
            .send()
            .await?;

        let body = read_body(response).await?;
        parse_feature_collection(&body)
    }
}

#[async_trait]
impl HazardFeed for UsgsEarthquakes {
    fn name(&self) -> &'static str {
        "usgs"
    }

    fn freshness(&self) -> Duration {
        FRESHNESS
    }

    async fn fetch(&self) -> Vec<UnifiedLocation> {
        match self.try_fetch().await {
            Ok(records) => {
                info!("USGS returned {} earthquakes", records.len());
                records
            }
            Err(e) => {
                error!("Failed to fetch earthquakes: {e}");
                Vec::new()
            }
        }
    }
}
