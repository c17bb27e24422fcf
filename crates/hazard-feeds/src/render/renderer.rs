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

//! Renderer lifecycle and marker reconciliation.
//!
//! ```text
//! Uninitialized --mount--> Loading --client ready--> Ready --update/view--> Ready
//!        \                    \                         \
//!         +--------------------+-------------------------+--unmount/drop--> Destroyed
//! ```

use std::future::Future;

use log::{debug, error, info, warn};

use super::{marker_for, MapClient, MapView, RenderError};
use crate::location::UnifiedLocation;

/// Lifecycle state of a [`MapRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    Uninitialized,
    /// Waiting for the map client to finish initializing.
    Loading,
    Ready,
    Destroyed,
}

/// Keeps a live map's markers in sync with a record list.
///
/// Every change to the records or the view rebuilds all markers from
/// scratch. Marker counts are bounded by the feed sizes, so no diffing is
/// done.
pub struct MapRenderer<C: MapClient> {
    state: RendererState,
    client: Option<C>,
    view: MapView,
    records: Vec<UnifiedLocation>,
}

impl<C: MapClient> std::fmt::Debug for MapRenderer<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapRenderer")
            .field("state", &self.state)
            .field("view", &self.view)
            .field("records", &self.records.len())
            .finish_non_exhaustive()
    }
}

impl<C: MapClient> MapRenderer<C> {
    #[must_use]
    pub fn new(view: MapView) -> Self {
        Self {
            state: RendererState::Uninitialized,
            client: None,
            view,
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> RendererState {
        self.state
    }

    #[must_use]
    pub fn view(&self) -> MapView {
        self.view
    }

    /// Await the map client's initialization, create the map and render the
    /// records received so far.
    ///
    /// A renderer mounts at most once. If initialization fails the renderer
    /// ends up destroyed.
    pub async fn mount<F>(&mut self, init: F) -> Result<usize, RenderError>
    where
        F: Future<Output = Result<C, RenderError>>,
    {
        if self.state != RendererState::Uninitialized {
            return Err(RenderError::InvalidState {
                operation: "mount",
                state: self.state,
            });
        }
        self.state = RendererState::Loading;
        debug!("Waiting for map client");

        let mut client = match init.await {
            Ok(client) => client,
            Err(e) => {
                warn!("Map client failed to load: {e}");
                self.state = RendererState::Destroyed;
                return Err(e);
            }
        };

        if let Err(e) = client.create_map(&self.view) {
            client.destroy();
            self.state = RendererState::Destroyed;
            return Err(e);
        }

        self.client = Some(client);
        self.state = RendererState::Ready;
        info!("Map ready at {:?} zoom {}", self.view.center, self.view.zoom);
        self.reconcile()
    }

    /// Replace the record list.
    ///
    /// Returns the number of markers now on the map. Before the map is
    /// ready the records are held and `0` is returned.
    pub fn update(&mut self, records: &[UnifiedLocation]) -> Result<usize, RenderError> {
        if self.state == RendererState::Destroyed {
            return Err(RenderError::InvalidState {
                operation: "update",
                state: self.state,
            });
        }
        self.records = records.to_vec();
        if self.state == RendererState::Ready {
            self.reconcile()
        } else {
            Ok(0)
        }
    }

    /// Move the map. The map instance is re-created and markers rebuilt.
    ///
    /// If the client rejects the new view, the previous view is restored and
    /// re-created. When even that fails the renderer is destroyed. Either
    /// way the client's error is returned.
    pub fn set_view(&mut self, view: MapView) -> Result<usize, RenderError> {
        if self.state == RendererState::Destroyed {
            return Err(RenderError::InvalidState {
                operation: "set_view",
                state: self.state,
            });
        }
        let ready = self.state == RendererState::Ready;
        if view == self.view {
            return Ok(if ready { self.records.len() } else { 0 });
        }
        let previous = std::mem::replace(&mut self.view, view);

        if !ready {
            return Ok(0);
        }
        let Some(client) = self.client.as_mut() else {
            return Err(RenderError::InvalidState {
                operation: "set_view",
                state: self.state,
            });
        };

        client.destroy();
        let Err(rejected) = client.create_map(&view) else {
            return self.reconcile();
        };

        warn!("Map rejected view {:?} zoom {}: {rejected}", view.center, view.zoom);
        self.view = previous;
        match client.create_map(&previous) {
            Ok(()) => {
                self.reconcile()?;
            }
            Err(e) => {
                error!("Could not restore previous map view: {e}");
                self.unmount();
            }
        }
        Err(rejected)
    }

    /// Destroy the live map. Safe to call more than once.
    pub fn unmount(&mut self) {
        if let Some(mut client) = self.client.take() {
            client.clear_markers();
            client.destroy();
            info!("Map destroyed");
        }
        self.state = RendererState::Destroyed;
    }

    fn reconcile(&mut self) -> Result<usize, RenderError> {
        let Some(client) = self.client.as_mut() else {
            return Err(RenderError::InvalidState {
                operation: "render",
                state: self.state,
            });
        };

        client.clear_markers();
        for record in &self.records {
            client.add_marker(&marker_for(record))?;
        }
        debug!("Rendered {} markers", self.records.len());
        Ok(self.records.len())
    }
}

impl<C: MapClient> Drop for MapRenderer<C> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Hazard;
    use crate::render::{Marker, MarkerStyle};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Scene {
        maps_created: usize,
        destroyed: usize,
        markers: Vec<Marker>,
        live: bool,
        /// Views the client refuses to create.
        rejected: Vec<MapView>,
        /// Refuse every view once this many maps were created.
        max_maps: Option<usize>,
    }

    /// Records every call so tests can inspect the scene after the
    /// renderer has taken ownership of the client.
    #[derive(Debug, Clone, Default)]
    struct RecordingClient {
        scene: Rc<RefCell<Scene>>,
    }

    impl MapClient for RecordingClient {
        fn create_map(&mut self, view: &MapView) -> Result<(), RenderError> {
            let mut scene = self.scene.borrow_mut();
            let exhausted = scene.max_maps.is_some_and(|max| scene.maps_created >= max);
            if exhausted || scene.rejected.contains(view) {
                return Err(RenderError::Client("view rejected".to_string()));
            }
            scene.maps_created += 1;
            scene.live = true;
            Ok(())
        }

        fn add_marker(&mut self, marker: &Marker) -> Result<(), RenderError> {
            let mut scene = self.scene.borrow_mut();
            if !scene.live {
                return Err(RenderError::Client("no map".to_string()));
            }
            scene.markers.push(marker.clone());
            Ok(())
        }

        fn clear_markers(&mut self) {
            self.scene.borrow_mut().markers.clear();
        }

        fn destroy(&mut self) {
            let mut scene = self.scene.borrow_mut();
            scene.destroyed += 1;
            scene.live = false;
        }
    }

    fn view() -> MapView {
        MapView {
            center: (39.0, 35.0),
            zoom: 6,
        }
    }

    fn records() -> Vec<UnifiedLocation> {
        vec![
            UnifiedLocation {
                lat: 38.3,
                lon: 38.2,
                label: Some("Malatya".to_string()),
                observed_at: Some(1_710_495_000_123),
                detail_url: None,
                hazard: Hazard::Seismic { magnitude: 4.6 },
            },
            UnifiedLocation {
                lat: 37.4,
                lon: -119.8,
                label: Some("Fire (confidence: n)".to_string()),
                observed_at: None,
                detail_url: None,
                hazard: Hazard::Fire {
                    brightness: 331.5,
                    confidence: "n".to_string(),
                    radiative_power: 5.2,
                },
            },
            UnifiedLocation {
                lat: 39.9,
                lon: 32.8,
                label: Some("Ankara: clear sky".to_string()),
                observed_at: Some(1_700_000_000_000),
                detail_url: None,
                hazard: Hazard::Weather {
                    temperature_celsius: 18.4,
                    icon_code: "01d".to_string(),
                },
            },
        ]
    }

    fn styles(scene: &Rc<RefCell<Scene>>) -> Vec<MarkerStyle> {
        scene.borrow().markers.iter().map(|m| m.style).collect()
    }

    #[tokio::test]
    async fn test_mount_renders_held_records() {
        let client = RecordingClient::default();
        let scene = Rc::clone(&client.scene);
        let mut renderer = MapRenderer::new(view());

        assert_eq!(renderer.update(&records()).unwrap(), 0);
        assert_eq!(renderer.state(), RendererState::Uninitialized);

        let count = renderer.mount(async { Ok(client) }).await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(renderer.state(), RendererState::Ready);
        assert_eq!(scene.borrow().maps_created, 1);
        assert_eq!(
            styles(&scene),
            vec![MarkerStyle::Red, MarkerStyle::Orange, MarkerStyle::Blue]
        );
    }

    #[tokio::test]
    async fn test_identical_update_is_stable() {
        let client = RecordingClient::default();
        let scene = Rc::clone(&client.scene);
        let mut renderer = MapRenderer::new(view());
        renderer.mount(async { Ok(client) }).await.unwrap();

        renderer.update(&records()).unwrap();
        let first_styles = styles(&scene);
        let first_markers = scene.borrow().markers.clone();

        renderer.update(&records()).unwrap();
        assert_eq!(styles(&scene), first_styles);
        assert_eq!(scene.borrow().markers, first_markers);
        assert_eq!(scene.borrow().markers.len(), 3);
    }

    #[tokio::test]
    async fn test_update_replaces_all_markers() {
        let client = RecordingClient::default();
        let scene = Rc::clone(&client.scene);
        let mut renderer = MapRenderer::new(view());
        renderer.mount(async { Ok(client) }).await.unwrap();

        renderer.update(&records()).unwrap();
        renderer.update(&records()[..1]).unwrap();
        assert_eq!(styles(&scene), vec![MarkerStyle::Red]);

        renderer.update(&[]).unwrap();
        assert!(scene.borrow().markers.is_empty());
    }

    #[tokio::test]
    async fn test_view_change_recreates_map() {
        let client = RecordingClient::default();
        let scene = Rc::clone(&client.scene);
        let mut renderer = MapRenderer::new(view());
        renderer.update(&records()).unwrap();
        renderer.mount(async { Ok(client) }).await.unwrap();

        renderer.set_view(view()).unwrap();
        assert_eq!(scene.borrow().maps_created, 1);

        renderer
            .set_view(MapView {
                center: (41.0, 29.0),
                zoom: 8,
            })
            .unwrap();
        assert_eq!(scene.borrow().maps_created, 2);
        assert_eq!(scene.borrow().markers.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_initialization_destroys() {
        let mut renderer: MapRenderer<RecordingClient> = MapRenderer::new(view());
        let result = renderer
            .mount(async { Err(RenderError::Initialization("tiles unreachable".to_string())) })
            .await;
        assert!(matches!(result, Err(RenderError::Initialization(_))));
        assert_eq!(renderer.state(), RendererState::Destroyed);
        assert!(renderer.update(&records()).is_err());
    }

    #[tokio::test]
    async fn test_mount_only_once() {
        let mut renderer = MapRenderer::new(view());
        renderer
            .mount(async { Ok(RecordingClient::default()) })
            .await
            .unwrap();
        let again = renderer
            .mount(async { Ok(RecordingClient::default()) })
            .await;
        assert!(matches!(
            again,
            Err(RenderError::InvalidState {
                operation: "mount",
                state: RendererState::Ready
            })
        ));
    }

    #[tokio::test]
    async fn test_unmount_and_drop_destroy_map() {
        let client = RecordingClient::default();
        let scene = Rc::clone(&client.scene);
        let mut renderer = MapRenderer::new(view());
        renderer.mount(async { Ok(client) }).await.unwrap();
        renderer.update(&records()).unwrap();

        renderer.unmount();
        renderer.unmount();
        assert_eq!(renderer.state(), RendererState::Destroyed);
        assert_eq!(scene.borrow().destroyed, 1);
        assert!(scene.borrow().markers.is_empty());

        let client = RecordingClient::default();
        let scene = Rc::clone(&client.scene);
        {
            let mut renderer = MapRenderer::new(view());
            renderer.mount(async { Ok(client) }).await.unwrap();
        }
        assert_eq!(scene.borrow().destroyed, 1);
    }

    #[tokio::test]
    async fn test_rejected_view_restores_previous_map() {
        let bad = MapView {
            center: (1.0, 1.0),
            zoom: 4,
        };
        let client = RecordingClient::default();
        let scene = Rc::clone(&client.scene);
        scene.borrow_mut().rejected.push(bad);
        let mut renderer = MapRenderer::new(view());
        renderer.update(&records()).unwrap();
        renderer.mount(async { Ok(client) }).await.unwrap();

        assert!(matches!(renderer.set_view(bad), Err(RenderError::Client(_))));
        assert_eq!(renderer.state(), RendererState::Ready);
        assert_eq!(renderer.view(), view());
        assert!(scene.borrow().live);
        assert_eq!(scene.borrow().markers.len(), 3);

        assert_eq!(renderer.update(&records()[..2]).unwrap(), 2);
        assert!(renderer.set_view(bad).is_err());
    }

    #[tokio::test]
    async fn test_unrecoverable_view_change_destroys() {
        let client = RecordingClient::default();
        let scene = Rc::clone(&client.scene);
        scene.borrow_mut().max_maps = Some(1);
        let mut renderer = MapRenderer::new(view());
        renderer.mount(async { Ok(client) }).await.unwrap();

        let result = renderer.set_view(MapView {
            center: (41.0, 29.0),
            zoom: 8,
        });
        assert!(matches!(result, Err(RenderError::Client(_))));
        assert_eq!(renderer.state(), RendererState::Destroyed);
        assert!(!scene.borrow().live);
        assert!(renderer.update(&records()).is_err());
    }
}
