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

//! Source adapters for the external hazard feeds.
//!
//! Each adapter wraps one upstream API, parses its native format and emits
//! [`UnifiedLocation`] records. Adapters never fail outward: every
//! [`FeedError`] is logged and degraded to an empty list (list feeds) or
//! `None` (the point weather feed).
//!
//! - [`UsgsEarthquakes`]: GeoJSON feature collection
//! - [`FirmsFires`]: header-prefixed comma-delimited text
//! - [`OpenWeatherMapCurrent`]: current-conditions JSON for one coordinate

mod fire;
mod seismic;
mod weather;

pub use fire::{acquisition_millis, parse_fire_csv, FirmsFires};
pub use seismic::{parse_feature_collection, UsgsEarthquakes};
pub use weather::{parse_current_weather, OpenWeatherMapCurrent};

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::location::UnifiedLocation;

/// Errors an adapter can hit while talking to its upstream.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The request URL is stripped, since it can carry an API key.
    #[error("transport failure: {0}")]
    Transport(reqwest::Error),

    #[error("upstream rejected request with HTTP {status}: {body}")]
    UpstreamRejection { status: StatusCode, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("missing credential: {0} is not configured")]
    MissingCredential(&'static str),
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        FeedError::Transport(e.without_url())
    }
}

/// A feed that returns a list of records for a fixed query.
#[async_trait]
pub trait HazardFeed: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Acceptable staleness of this feed's data.
    ///
    /// This is a freshness contract for caches sitting in front of the
    /// upstream, not a correctness guarantee.
    fn freshness(&self) -> Duration;

    /// Fetch and normalize. Failures yield an empty list.
    async fn fetch(&self) -> Vec<UnifiedLocation>;
}

/// A feed that describes a single coordinate.
#[async_trait]
pub trait PointFeed: Send + Sync {
    fn name(&self) -> &'static str;

    fn freshness(&self) -> Duration;

    /// Fetch and normalize. Failures yield `None`, which is distinct from a
    /// list feed's empty result.
    async fn fetch_point(&self, lat: f64, lon: f64) -> Option<UnifiedLocation>;
}

/// An upstream API key. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey {
    name: &'static str,
    value: String,
}

impl ApiKey {
    /// Wrap a key, rejecting blank values.
    pub fn new(name: &'static str, value: impl Into<String>) -> Result<Self, FeedError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(FeedError::MissingCredential(name));
        }
        Ok(Self { name, value })
    }

    /// Build from an optional value, as resolved from environment or config.
    pub fn require(name: &'static str, value: Option<String>) -> Result<Self, FeedError> {
        value.map_or(Err(FeedError::MissingCredential(name)), |v| Self::new(name, v))
    }

    /// Name of the setting this key came from.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Read the body of a response, turning a non-2xx status into
/// [`FeedError::UpstreamRejection`] that carries the body for the logs.
async fn read_body(response: reqwest::Response) -> Result<String, FeedError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(FeedError::UpstreamRejection { status, body });
    }
    Ok(body)
}

/// Client whose every request fails to connect: all traffic goes through a
/// proxy on a port nothing listens on.
#[cfg(test)]
pub(crate) fn unreachable_client() -> reqwest::Client {
    let proxy = reqwest::Proxy::all("http://127.0.0.1:1").expect("proxy url");
    reqwest::Client::builder()
        .proxy(proxy)
        .build()
        .expect("test client")
}
