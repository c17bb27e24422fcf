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

//! Fan-out/merge of the hazard feeds and the per-category visibility filter.

use log::info;

use crate::location::{Category, UnifiedLocation};
use crate::sources::{HazardFeed, PointFeed};

/// Runs every feed concurrently and merges the results.
pub struct Aggregator {
    seismic: Box<dyn HazardFeed>,
    fire: Box<dyn HazardFeed>,
    weather: Box<dyn PointFeed>,
    weather_point: (f64, f64),
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("seismic", &self.seismic.name())
            .field("fire", &self.fire.name())
            .field("weather", &self.weather.name())
            .field("weather_point", &self.weather_point)
            .finish()
    }
}

impl Aggregator {
    /// `weather_point` is the `(lat, lon)` the weather feed describes.
    #[must_use]
    pub fn new(
        seismic: Box<dyn HazardFeed>,
        fire: Box<dyn HazardFeed>,
        weather: Box<dyn PointFeed>,
        weather_point: (f64, f64),
    ) -> Self {
        Self {
            seismic,
            fire,
            weather,
            weather_point,
        }
    }

    /// Fetch all feeds and return seismic, then fire records, followed by
    /// the weather record when the point fetch produced one.
    ///
    /// Feeds swallow their own failures, so one broken upstream only removes
    /// its own records.
    pub async fn collect(&self) -> Vec<UnifiedLocation> {
        let (lat, lon) = self.weather_point;
        let (earthquakes, fires, weather) = tokio::join!(
            self.seismic.fetch(),
            self.fire.fetch(),
            self.weather.fetch_point(lat, lon),
        );

        let mut combined = Vec::with_capacity(earthquakes.len() + fires.len() + 1);
        combined.extend(earthquakes);
        combined.extend(fires);
        combined.extend(weather);

        info!(
            "Aggregated {} records ({}: {:?}, {}: {:?}, {}: {:?})",
            combined.len(),
            self.seismic.name(),
            self.seismic.freshness(),
            self.fire.name(),
            self.fire.freshness(),
            self.weather.name(),
            self.weather.freshness(),
        );
        combined
    }
}

/// One toggle per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryFilter {
    pub seismic: bool,
    pub fire: bool,
    pub weather: bool,
}

impl Default for CategoryFilter {
    fn default() -> Self {
        Self {
            seismic: true,
            fire: true,
            weather: true,
        }
    }
}

impl CategoryFilter {
    #[must_use]
    pub fn shows(&self, category: Category) -> bool {
        match category {
            Category::Seismic => self.seismic,
            Category::Fire => self.fire,
            Category::Weather => self.weather,
        }
    }

    /// Mutable access to one toggle, for checkbox widgets.
    pub fn toggle_mut(&mut self, category: Category) -> &mut bool {
        match category {
            Category::Seismic => &mut self.seismic,
            Category::Fire => &mut self.fire,
            Category::Weather => &mut self.weather,
        }
    }

    /// Records whose category is switched on, in input order.
    #[must_use]
    pub fn apply(&self, records: &[UnifiedLocation]) -> Vec<UnifiedLocation> {
        records
            .iter()
            .filter(|r| self.shows(r.category()))
            .cloned()
            .collect()
    }
}

/// Memoized visible subset of the combined records.
///
/// The subset is re-derived only when the records or the filter change.
#[derive(Debug, Default)]
pub struct VisibleSet {
    records: Vec<UnifiedLocation>,
    filter: CategoryFilter,
    visible: Vec<UnifiedLocation>,
    dirty: bool,
    changed: bool,
}

impl VisibleSet {
    #[must_use]
    pub fn new(filter: CategoryFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Replace the combined records.
    pub fn set_records(&mut self, records: Vec<UnifiedLocation>) {
        self.records = records;
        self.dirty = true;
    }

    /// Replace the filter. A filter equal to the current one is a no-op.
    pub fn set_filter(&mut self, filter: CategoryFilter) {
        if filter != self.filter {
            self.filter = filter;
            self.dirty = true;
        }
    }

    #[must_use]
    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }

    #[must_use]
    pub fn records(&self) -> &[UnifiedLocation] {
        &self.records
    }

    /// Current visible subset.
    pub fn visible(&mut self) -> &[UnifiedLocation] {
        if self.dirty {
            self.visible = self.filter.apply(&self.records);
            self.dirty = false;
            self.changed = true;
        }
        &self.visible
    }

    /// Whether the visible subset was re-derived since the last call.
    pub fn take_changed(&mut self) -> bool {
        let _ = self.visible();
        std::mem::take(&mut self.changed)
    }
}
