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

//! Map rendering layer.
//!
//! The renderer owns a live map instance through the narrow [`MapClient`]
//! trait and keeps its markers in sync with the current record list by
//! clearing and rebuilding them. Marker styling is decided by
//! [`marker_for`], independently of any concrete map provider.

mod marker;
mod renderer;

pub use marker::{marker_for, Marker, MarkerStyle, Popup, WEATHER_ICON_URL};
pub use renderer::{MapRenderer, RendererState};

use thiserror::Error;

/// Errors raised by the renderer or its map client.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("map client failed to initialize: {0}")]
    Initialization(String),

    #[error("cannot {operation} while the renderer is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: RendererState,
    },

    #[error("map client error: {0}")]
    Client(String),
}

/// Center and zoom of the live map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    /// `(latitude, longitude)`
    pub center: (f64, f64),
    pub zoom: u8,
}

/// Capabilities the renderer needs from a map provider.
///
/// A client is obtained from an asynchronous initialization (see
/// [`MapRenderer::mount`]) and is exclusively owned by one renderer.
pub trait MapClient {
    /// Create (or re-create) the map instance for `view`.
    fn create_map(&mut self, view: &MapView) -> Result<(), RenderError>;

    fn add_marker(&mut self, marker: &Marker) -> Result<(), RenderError>;

    fn clear_markers(&mut self);

    /// Tear down the map instance. Must tolerate repeated calls.
    fn destroy(&mut self);
}
