//! Today-route overlay state machine.
//!
//! ```text
//! Inactive ──activate──▶ Loading ──fetch ok──▶ Active
//!    ▲                      │  ▲                  │
//!    └──────deactivate──────┘  └──select other────┘
//! ```
//!
//! Each fetch is stamped with the selected device and a request
//! generation. Results are written to the map only if, when they arrive,
//! the same device is still selected and nothing has re-requested or
//! deactivated in the meantime. A slow response for a previously selected
//! device therefore never lands on the current device's map.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::surface::{MapSurface, OVERLAY_SOURCES, TODAY_ENDPOINTS, TODAY_PATH, TODAY_STOPS};
use super::RouteSource;
use crate::icons::{END_POINT, START_POINT};
use crate::model::{Bounds, DeviceId, Feature, FeatureCollection, Position, Stop};

/// Observable overlay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OverlayState {
    Inactive,
    Loading { device: DeviceId },
    Active { device: DeviceId, positions: usize, stops: usize },
}

impl OverlayState {
    /// Whether the overlay is switched on (loading or showing data).
    pub fn is_engaged(self) -> bool {
        !matches!(self, Self::Inactive)
    }
}

#[derive(Default)]
struct Inner {
    selected: Option<DeviceId>,
    generation: u64,
    /// Device whose data is currently on the map.
    shown: Option<DeviceId>,
    positions: Arc<Vec<Position>>,
    stops: Arc<Vec<Stop>>,
}

pub struct TodayRouteOverlay<R: RouteSource> {
    source: Arc<R>,
    surface: Arc<dyn MapSurface>,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
    state: watch::Sender<OverlayState>,
}

impl<R: RouteSource> TodayRouteOverlay<R> {
    pub fn new(source: Arc<R>, surface: Arc<dyn MapSurface>, clock: Arc<dyn Clock>) -> Self {
        let (state, _) = watch::channel(OverlayState::Inactive);
        Self {
            source,
            surface,
            clock,
            inner: Mutex::new(Inner::default()),
            state,
        }
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn state(&self) -> OverlayState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<OverlayState> {
        self.state.subscribe()
    }

    pub fn selected(&self) -> Option<DeviceId> {
        self.lock().selected
    }

    /// Today's committed positions (empty unless `Active`).
    pub fn positions(&self) -> Arc<Vec<Position>> {
        Arc::clone(&self.lock().positions)
    }

    /// Today's committed stops (empty unless `Active`).
    pub fn stops(&self) -> Arc<Vec<Stop>> {
        Arc::clone(&self.lock().stops)
    }

    /// Bounding box of today's route, for fitting the camera.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.lock().positions.iter().map(Position::lon_lat))
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Change the selected device. While the overlay is engaged this
    /// refetches for the new device, or switches the overlay off when
    /// the selection is cleared.
    pub async fn select(&self, device: Option<DeviceId>) {
        {
            let mut inner = self.lock();
            if inner.selected == device {
                return;
            }
            inner.selected = device;
        }

        if !self.state().is_engaged() {
            return;
        }

        match device {
            Some(id) => self.fetch(id).await,
            None => self.deactivate(),
        }
    }

    /// Switch the overlay on and load today's data for the selected
    /// device. Without a selection the layers are cleared and the
    /// overlay stays `Inactive`.
    pub async fn activate(&self) {
        let Some(device) = self.selected() else {
            debug!("today route activated without a selected device");
            self.deactivate();
            return;
        };
        self.fetch(device).await;
    }

    /// Switch the overlay off: empty every source, drop the data and
    /// invalidate any request still in flight.
    pub fn deactivate(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.shown = None;
        inner.positions = Arc::new(Vec::new());
        inner.stops = Arc::new(Vec::new());
        for source in OVERLAY_SOURCES {
            self.surface.set_data(source, FeatureCollection::empty());
        }
        self.state.send_replace(OverlayState::Inactive);
    }

    /// The on-map button.
    pub async fn toggle(&self) {
        if self.state().is_engaged() {
            self.deactivate();
        } else {
            self.activate().await;
        }
    }

    // ── Fetch / commit ───────────────────────────────────────────────

    async fn fetch(&self, device: DeviceId) {
        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            if inner.shown.is_some_and(|shown| shown != device) {
                inner.shown = None;
                inner.positions = Arc::new(Vec::new());
                inner.stops = Arc::new(Vec::new());
                for source in OVERLAY_SOURCES {
                    self.surface.set_data(source, FeatureCollection::empty());
                }
            }
            self.state.send_replace(OverlayState::Loading { device });
            inner.generation
        };

        let (from, to) = self.clock.today();
        debug!(device_id = %device, %from, %to, generation, "fetching today route");

        let result = tokio::try_join!(
            self.source.route_positions(device, from, to),
            self.source.stops(device, from, to),
        );

        match result {
            Ok((positions, stops)) => self.commit(device, generation, positions, stops),
            Err(e) => warn!(device_id = %device, error = %e, "today route fetch failed"),
        }
    }

    fn commit(&self, device: DeviceId, generation: u64, positions: Vec<Position>, stops: Vec<Stop>) {
        let mut inner = self.lock();
        if inner.selected != Some(device) || inner.generation != generation {
            debug!(
                device_id = %device,
                generation,
                current = inner.generation,
                "discarding superseded today route response"
            );
            return;
        }

        self.surface.set_data(TODAY_STOPS, stop_features(&stops));
        self.surface.set_data(TODAY_ENDPOINTS, endpoint_features(&positions));
        self.surface.set_data(TODAY_PATH, path_feature(&positions));

        let state = OverlayState::Active {
            device,
            positions: positions.len(),
            stops: stops.len(),
        };
        inner.shown = Some(device);
        inner.positions = Arc::new(positions);
        inner.stops = Arc::new(stops);
        self.state.send_replace(state);
        info!(device_id = %device, "today route loaded");
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Feature builders ────────────────────────────────────────────────

/// One Point per stop, titled "Stop".
pub(crate) fn stop_features(stops: &[Stop]) -> FeatureCollection {
    FeatureCollection::new(
        stops
            .iter()
            .map(|s| Feature::point(s.lon_lat(), "title", "Stop"))
            .collect(),
    )
}

/// Start and end markers, or nothing when there are no positions.
pub(crate) fn endpoint_features(positions: &[Position]) -> FeatureCollection {
    match (positions.first(), positions.last()) {
        (Some(first), Some(last)) => FeatureCollection::new(vec![
            Feature::point(first.lon_lat(), "category", START_POINT),
            Feature::point(last.lon_lat(), "category", END_POINT),
        ]),
        _ => FeatureCollection::empty(),
    }
}

/// The day's path as a single LineString; empty below two positions.
pub(crate) fn path_feature(positions: &[Position]) -> FeatureCollection {
    if positions.len() < 2 {
        return FeatureCollection::empty();
    }
    FeatureCollection::new(vec![Feature::line_string(
        positions.iter().map(Position::lon_lat).collect(),
    )])
}
