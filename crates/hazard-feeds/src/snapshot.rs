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

//! Static map snapshots from the Yandex static map service (via RapidAPI).
//!
//! The service renders a PNG for a center, zoom, size and marker list sent
//! as a form-encoded POST. The image is handed back as a `data:` URI so it
//! can be embedded anywhere a URL is accepted.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::{debug, error, info};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sources::{ApiKey, FeedError};

const RAPIDAPI_HOST: &str = "yandexstaticraygorodskijv1.p.rapidapi.com";
const STATIC_MAP_PATH: &str = "/getStaticMap";
const DEFAULT_MARKER_STYLE: &str = "blm";
const MAP_LAYER: &str = "map";
const FALLBACK_MIME: &str = "application/octet-stream";

/// A marker drawn on the static map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMarker {
    pub lat: f64,
    pub lon: f64,
    /// Yandex placemark style suffix without the `pm` prefix, e.g. `gnm`
    /// (green, medium) or `bll` (blue, large). Defaults to `blm`.
    #[serde(default)]
    pub style: Option<String>,
}

/// Options for one snapshot. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticMapRequest {
    /// `(longitude, latitude)`
    #[serde(default)]
    pub center: Option<(f64, f64)>,
    #[serde(default)]
    pub zoom: Option<u8>,
    /// `(width, height)` in pixels.
    #[serde(default)]
    pub size: Option<(u32, u32)>,
    #[serde(default)]
    pub markers: Vec<SnapshotMarker>,
}

impl StaticMapRequest {
    /// Form fields in the order the service expects them.
    #[must_use]
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if let Some((lon, lat)) = self.center {
            fields.push(("ll", format!("{lon},{lat}")));
        }
        if let Some(zoom) = self.zoom.filter(|z| *z > 0) {
            fields.push(("z", zoom.to_string()));
        }
        if let Some((width, height)) = self.size {
            fields.push(("size", format!("{width},{height}")));
        }
        if !self.markers.is_empty() {
            let points: Vec<String> = self
                .markers
                .iter()
                .map(|m| {
                    let style = m.style.as_deref().unwrap_or(DEFAULT_MARKER_STYLE);
                    format!("{},{},pm{style}", m.lon, m.lat)
                })
                .collect();
            fields.push(("pt", points.join("~")));
        }
        fields.push(("l", MAP_LAYER.to_string()));
        fields
    }
}

/// Errors decoding a `data:` URI.
#[derive(Debug, Error)]
pub enum DataUriError {
    #[error("not a data URI")]
    NotDataUri,

    #[error("data URI is not base64 encoded")]
    NotBase64,

    #[error("invalid base64 payload: {0}")]
    Payload(#[from] base64::DecodeError),
}

/// An inline payload with its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    /// Encode bytes as `data:{mime};base64,{payload}`.
    #[must_use]
    pub fn encode(mime: &str, bytes: &[u8]) -> String {
        format!("data:{mime};base64,{}", STANDARD.encode(bytes))
    }

    /// Decode a `data:{mime};base64,{payload}` string.
    pub fn parse(uri: &str) -> Result<Self, DataUriError> {
        let rest = uri.strip_prefix("data:").ok_or(DataUriError::NotDataUri)?;
        let (meta, payload) = rest.split_once(',').ok_or(DataUriError::NotDataUri)?;
        let mime = meta.strip_suffix(";base64").ok_or(DataUriError::NotBase64)?;
        Ok(Self {
            mime: mime.to_string(),
            bytes: STANDARD.decode(payload)?,
        })
    }
}

/// Client for rendering static snapshots.
#[derive(Debug, Clone)]
pub struct StaticMapClient {
    http: reqwest::Client,
    key: Option<ApiKey>,
    endpoint: String,
}

impl StaticMapClient {
    /// A missing key is accepted here; every render then yields `None`.
    #[must_use]
    pub fn new(http: reqwest::Client, key: Option<ApiKey>) -> Self {
        Self {
            http,
            key,
            endpoint: format!("https://{RAPIDAPI_HOST}{STATIC_MAP_PATH}"),
        }
    }

    /// Render a snapshot as a `data:` URI, or `None` on any failure.
    pub async fn render(&self, request: &StaticMapRequest) -> Option<String> {
        match self.try_render(request).await {
            Ok(uri) => Some(uri),
            Err(e) => {
                error!("Failed to fetch static map: {e}");
                None
            }
        }
    }

    async fn try_render(&self, request: &StaticMapRequest) -> Result<String, FeedError> {
        let key = self
            .key
            .as_ref()
            .ok_or(FeedError::MissingCredential("RAPIDAPI_YANDEX_STATIC_MAP_KEY"))?;

        let fields = request.form_fields();
        debug!("Requesting static map with {} form fields", fields.len());

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-rapidapi-key", key.expose())
            .header("x-rapidapi-host", RAPIDAPI_HOST)
            .form(&fields)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(FeedError::UpstreamRejection { status, body });
        }

        let mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(FALLBACK_MIME)
            .to_string();
        let bytes = response.bytes().await?;
        info!("Static map received ({mime}, {} bytes)", bytes.len());

        Ok(DataUri::encode(&mime, &bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overview() -> StaticMapRequest {
        StaticMapRequest {
            center: Some((35.0, 39.0)),
            zoom: Some(4),
            size: Some((400, 250)),
            markers: vec![
                SnapshotMarker {
                    lat: 39.9334,
                    lon: 32.8597,
                    style: Some("gnm".to_string()),
                },
                SnapshotMarker {
                    lat: 41.0082,
                    lon: 28.9784,
                    style: None,
                },
            ],
        }
    }

    #[test]
    fn test_form_fields() {
        let fields = overview().form_fields();
        assert_eq!(
            fields,
            vec![
                ("ll", "35,39".to_string()),
                ("z", "4".to_string()),
                ("size", "400,250".to_string()),
                ("pt", "32.8597,39.9334,pmgnm~28.9784,41.0082,pmblm".to_string()),
                ("l", "map".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_request_only_sets_layer() {
        let fields = StaticMapRequest {
            zoom: Some(0),
            ..Default::default()
        }
        .form_fields();
        assert_eq!(fields, vec![("l", "map".to_string())]);
    }

    #[test]
    fn test_data_uri_round_trip() {
        let png_magic = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
        let uri = DataUri::encode("image/png", &png_magic);
        assert_eq!(uri, "data:image/png;base64,iVBORw0KGgo=");

        let decoded = DataUri::parse(&uri).unwrap();
        assert_eq!(decoded.mime, "image/png");
        assert_eq!(decoded.bytes, png_magic);
    }

    #[test]
    fn test_data_uri_rejects_other_forms() {
        assert!(matches!(
            DataUri::parse("https://example.com/a.png"),
            Err(DataUriError::NotDataUri)
        ));
        assert!(matches!(
            DataUri::parse("data:text/plain,hello"),
            Err(DataUriError::NotBase64)
        ));
    }

    #[tokio::test]
    async fn test_missing_key_renders_nothing() {
        let client = StaticMapClient::new(reqwest::Client::new(), None);
        assert!(client.render(&overview()).await.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_service_renders_nothing() {
        let key = ApiKey::new("RAPIDAPI_YANDEX_STATIC_MAP_KEY", "k").unwrap();
        let client = StaticMapClient::new(crate::sources::unreachable_client(), Some(key));
        assert!(matches!(
            client.try_render(&overview()).await,
            Err(FeedError::Transport(_))
        ));
        assert!(client.render(&overview()).await.is_none());
    }
}
