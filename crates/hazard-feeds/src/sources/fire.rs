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

//! NASA FIRMS active-fire adapter.
//!
//! Fetches the last 24 hours of VIIRS (Suomi NPP, near-real-time) hotspots for
//! the whole world. The area API answers with plain comma-delimited text:
//!
//! ```text
//! latitude,longitude,bright_ti4,scan,track,acq_date,acq_time,satellite,instrument,confidence,version,bright_ti5,frp,daynight
//! ```
//!
//! Cells are never quoted, so the reader splits every line on `,` and pairs
//! cells with header names by position. A field that itself contains a comma
//! shifts every later cell of that row.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use log::{debug, error, info, warn};

use super::{read_body, ApiKey, FeedError, HazardFeed};
use crate::location::{Hazard, UnifiedLocation};

const FIRMS_AREA_URL: &str = "https://firms.modaps.eosdis.nasa.gov/api/area/csv";
const FIRMS_MAP_URL: &str = "https://firms.modaps.eosdis.nasa.gov/map/";
const SENSOR: &str = "VIIRS_SNPP_NRT";
const AREA: &str = "world";
const DAY_RANGE: u8 = 1;
const FRESHNESS: Duration = Duration::from_secs(300);

/// Combine `acq_date` (`YYYY-MM-DD`) and `acq_time` (`HHMM`, leading zeros
/// often dropped) into epoch milliseconds, UTC.
///
/// Returns `None` when either part does not form a valid instant.
#[must_use]
pub fn acquisition_millis(date: &str, time: &str) -> Option<i64> {
    let padded = format!("{time:0>4}");
    if padded.len() != 4 || !padded.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let stamp = format!("{date}T{}:{}:00Z", &padded[..2], &padded[2..]);
    DateTime::parse_from_rfc3339(&stamp)
        .ok()
        .map(|instant| instant.timestamp_millis())
}

fn number(cell: Option<&str>) -> f64 {
    cell.and_then(|s| s.trim().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

/// Parse a FIRMS CSV body into fire records.
///
/// An empty body, or one that starts with `<` (an HTML error page), is
/// reported as [`FeedError::MalformedResponse`]. FIRMS does not document that
/// shape; it is only what error pages have looked like so far.
pub fn parse_fire_csv(body: &str) -> Result<Vec<UnifiedLocation>, FeedError> {
    if body.is_empty() || body.starts_with('<') {
        return Err(FeedError::MalformedResponse(
            "FIRMS returned no CSV payload".to_string(),
        ));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(body.trim().as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| FeedError::MalformedResponse(format!("FIRMS header row: {e}")))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let lat_col = column("latitude");
    let lon_col = column("longitude");
    let date_col = column("acq_date");
    let time_col = column("acq_time");
    let confidence_col = column("confidence");
    let brightness_col = column("brightness").or_else(|| column("bright_ti4"));
    let frp_col = column("frp");

    let mut fires = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| FeedError::MalformedResponse(format!("FIRMS row: {e}")))?;
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i));

        let raw_lat = cell(lat_col).unwrap_or_default();
        let raw_lon = cell(lon_col).unwrap_or_default();
        let confidence = cell(confidence_col).unwrap_or_default().to_string();

        let observed_at = match (cell(date_col), cell(time_col)) {
            (Some(date), Some(time)) => acquisition_millis(date, time),
            _ => None,
        };

        fires.push(UnifiedLocation {
            lat: number(Some(raw_lat)),
            lon: number(Some(raw_lon)),
            label: Some(format!("Fire (confidence: {confidence})")),
            observed_at,
            detail_url: Some(format!("{FIRMS_MAP_URL}#d:24hrs;@{raw_lat},{raw_lon},10z")),
            hazard: Hazard::Fire {
                brightness: number(cell(brightness_col)),
                confidence,
                radiative_power: number(cell(frp_col)),
            },
        });
    }

    Ok(fires)
}

/// Active fires from NASA FIRMS.
#[derive(Debug, Clone)]
pub struct FirmsFires {
    http: reqwest::Client,
    key: ApiKey,
}

impl FirmsFires {
    #[must_use]
    pub fn new(http: reqwest::Client, key: ApiKey) -> Self {
        Self { http, key }
    }

    async fn try_fetch(&self) -> Result<Vec<UnifiedLocation>, FeedError> {
        debug!("Querying FIRMS {FIRMS_AREA_URL}/<key>/{SENSOR}/{AREA}/{DAY_RANGE}");
        let url = format!(
            "{FIRMS_AREA_URL}/{}/{SENSOR}/{AREA}/{DAY_RANGE}",
            self.key.expose()
        );

        let response = self.http.get(url).send().await?;
        let body = read_body(response).await?;
        parse_fire_csv(&body)
    }
}

#[async_trait]
impl HazardFeed for FirmsFires {
    fn name(&self) -> &'static str {
        "firms"
    }

    fn freshness(&self) -> Duration {
        FRESHNESS
    }

    async fn fetch(&self) -> Vec<UnifiedLocation> {
        match self.try_fetch().await {
            Ok(fires) => {
                info!("FIRMS returned {} fire hotspots", fires.len());
                fires
            }
            Err(FeedError::MalformedResponse(reason)) => {
                warn!("FIRMS sent unexpected output: {reason}");
                Vec::new()
            }
            Err(e) => {
                error!("Failed to fetch FIRMS fires: {e}");
                Vec::new()
            }
        }
    }
}
