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

//! Per-record marker styling and popup content.

use chrono::{Local, TimeZone};

use crate::location::{present, Category, Hazard, UnifiedLocation};

/// OpenWeatherMap condition icon, `{}` is the icon code.
pub const WEATHER_ICON_URL: &str = "https://openweathermap.org/img/wn/{}@2x.png";

/// Marker color per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerStyle {
    Red,
    Orange,
    Blue,
}

impl MarkerStyle {
    #[must_use]
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Seismic => MarkerStyle::Red,
            Category::Fire => MarkerStyle::Orange,
            Category::Weather => MarkerStyle::Blue,
        }
    }

    /// sRGB fill color.
    #[must_use]
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            MarkerStyle::Red => (230, 57, 70),
            MarkerStyle::Orange => (247, 140, 30),
            MarkerStyle::Blue => (52, 120, 246),
        }
    }
}

/// Popup shown when a marker is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    pub title: String,
    /// Text rows, in display order.
    pub lines: Vec<String>,
    pub icon_url: Option<String>,
    /// Observation time in the local timezone.
    pub observed_local: Option<String>,
    pub link: Option<String>,
}

/// A styled marker ready for a map client.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    pub category: Category,
    pub style: MarkerStyle,
    /// Short text shown on hover.
    pub hint: String,
    pub popup: Popup,
}

fn local_time(millis: i64) -> Option<String> {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Build the marker for one record.
#[must_use]
pub fn marker_for(record: &UnifiedLocation) -> Marker {
    let category = record.category();
    let mut lines = Vec::new();
    let mut icon_url = None;

    if let Some(label) = &record.label {
        lines.push(format!("Place: {label}"));
    }

    match &record.hazard {
        Hazard::Seismic { magnitude } => {
            if let Some(m) = present(*magnitude) {
                lines.push(format!("Magnitude: {m}"));
            }
        }
        Hazard::Fire {
            brightness,
            confidence,
            radiative_power,
        } => {
            if let Some(b) = present(*brightness) {
                lines.push(format!("Brightness: {b}K"));
            }
            if !confidence.is_empty() {
                lines.push(format!("Confidence: {confidence}"));
            }
            if let Some(frp) = present(*radiative_power) {
                lines.push(format!("Radiative power: {frp} MW"));
            }
        }
        Hazard::Weather {
            temperature_celsius,
            icon_code,
        } => {
            if let Some(t) = present(*temperature_celsius) {
                lines.push(format!("Temperature: {t:.1} °C"));
            }
            if !icon_code.is_empty() {
                icon_url = Some(WEATHER_ICON_URL.replace("{}", icon_code));
            }
        }
    }

    Marker {
        lat: record.lat,
        lon: record.lon,
        category,
        style: MarkerStyle::for_category(category),
        hint: format!("{category}: {}", record.label.as_deref().unwrap_or_default()),
        popup: Popup {
            title: category.display_name().to_string(),
            lines,
            icon_url,
            observed_local: record.observed_at.and_then(local_time),
            link: record.detail_url.clone(),
        },
    }
}
