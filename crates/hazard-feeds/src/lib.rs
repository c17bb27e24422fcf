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

//! Hazard feed library: earthquakes, wildfires and weather on one map.
//!
//! The crate is organized in layers that can be used on their own:
//!
//! - **Sources**: adapters for USGS (GeoJSON), NASA FIRMS (CSV) and
//!   OpenWeatherMap (JSON), each producing [`UnifiedLocation`] records
//! - **Aggregation**: concurrent fan-out over the feeds and a per-category
//!   visibility filter
//! - **Snapshot**: static map images returned as `data:` URIs
//! - **Rendering**: a map renderer that reconciles markers on any client
//!   implementing [`MapClient`]
//!
//! # Quick Start
//!
//! ```no_run
//! use hazard_feeds::sources::{ApiKey, FirmsFires, OpenWeatherMapCurrent, UsgsEarthquakes};
//! use hazard_feeds::{Aggregator, CategoryFilter};
//!
//! # async fn example() -> Result<(), hazard_feeds::FeedError> {
//! let http = reqwest::Client::new();
//! let aggregator = Aggregator::new(
//!     Box::new(UsgsEarthquakes::new(http.clone())),
//!     Box::new(FirmsFires::new(http.clone(), ApiKey::new("FIRMS_API_KEY", "my-map-key")?)),
//!     Box::new(OpenWeatherMapCurrent::new(
//!         http,
//!         ApiKey::new("OPENWEATHERMAP_API_KEY", "my-owm-key")?,
//!         "en",
//!     )),
//!     (39.9334, 32.8597),
//! );
//!
//! let records = aggregator.collect().await;
//! let quakes_only = CategoryFilter { fire: false, weather: false, ..Default::default() };
//! for record in quakes_only.apply(&records) {
//!     println!("{:?} at {}, {}", record.label, record.lat, record.lon);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod location;
pub mod render;
pub mod snapshot;
pub mod sources;

pub use aggregate::{Aggregator, CategoryFilter, VisibleSet};
pub use location::{Category, Hazard, UnifiedLocation};
pub use render::{MapClient, MapRenderer, MapView, Marker, MarkerStyle, RenderError};
pub use snapshot::{DataUri, SnapshotMarker, StaticMapClient, StaticMapRequest};
pub use sources::{FeedError, HazardFeed, PointFeed};
