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

//! Unified location record shared by every feed.
//!
//! Each source adapter normalizes its native format into [`UnifiedLocation`].
//! Category-specific values live in the [`Hazard`] payload, so a seismic
//! record can never carry a fire brightness and consumers match on the
//! payload instead of probing optional fields.

use std::fmt;

use serde::Serialize;

/// Hazard category, used for toggles, marker styling and hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Seismic,
    Fire,
    Weather,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 3] = [Category::Seismic, Category::Fire, Category::Weather];

    /// Human-readable name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Seismic => "Earthquake",
            Category::Fire => "Fire",
            Category::Weather => "Weather",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Category-specific measurements.
///
/// Numeric values parsed from text hold NaN when the source cell was not a
/// number. Treat non-finite values as absent when displaying them.
///
/// Equality compares floats by total order, so a NaN reading equals itself.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum Hazard {
    Seismic {
        magnitude: f64,
    },
    Fire {
        /// Brightness temperature in Kelvin.
        brightness: f64,
        /// Source-defined confidence ("l"/"n"/"h" for VIIRS).
        confidence: String,
        /// Fire radiative power in megawatts.
        radiative_power: f64,
    },
    Weather {
        temperature_celsius: f64,
        icon_code: String,
    },
}

impl Hazard {
    #[must_use]
    pub fn category(&self) -> Category {
        match self {
            Hazard::Seismic { .. } => Category::Seismic,
            Hazard::Fire { .. } => Category::Fire,
            Hazard::Weather { .. } => Category::Weather,
        }
    }
}

/// A single normalized observation.
#[derive(Debug, Clone, Serialize)]
pub struct UnifiedLocation {
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Observation time in epoch milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_url: Option<String>,
    #[serde(flatten)]
    pub hazard: Hazard,
}

fn same(a: f64, b: f64) -> bool {
    a.total_cmp(&b).is_eq()
}

impl PartialEq for Hazard {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Hazard::Seismic { magnitude: a }, Hazard::Seismic { magnitude: b }) => same(*a, *b),
            (
                Hazard::Fire {
                    brightness: b1,
                    confidence: c1,
                    radiative_power: p1,
                },
                Hazard::Fire {
                    brightness: b2,
                    confidence: c2,
                    radiative_power: p2,
                },
            ) => same(*b1, *b2) && c1 == c2 && same(*p1, *p2),
            (
                Hazard::Weather {
                    temperature_celsius: t1,
                    icon_code: i1,
                },
                Hazard::Weather {
                    temperature_celsius: t2,
                    icon_code: i2,
                },
            ) => same(*t1, *t2) && i1 == i2,
            _ => false,
        }
    }
}

impl PartialEq for UnifiedLocation {
    fn eq(&self, other: &Self) -> bool {
        same(self.lat, other.lat)
            && same(self.lon, other.lon)
            && self.label == other.label
            && self.observed_at == other.observed_at
            && self.detail_url == other.detail_url
            && self.hazard == other.hazard
    }
}

impl UnifiedLocation {
    #[must_use]
    pub fn category(&self) -> Category {
        self.hazard.category()
    }
}

/// Returns the value only when it is a finite number.
#[must_use]
pub fn present(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}
