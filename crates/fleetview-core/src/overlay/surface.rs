// ── Map surface ──
//
// The overlay never draws; it replaces the data of named GeoJSON
// sources on whatever map surface it was given.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::model::FeatureCollection;

pub const TODAY_STOPS: &str = "today-stops";
pub const TODAY_ENDPOINTS: &str = "today-endpoints";
pub const TODAY_PATH: &str = "today-path";

/// Every source the today-route overlay owns.
pub const OVERLAY_SOURCES: [&str; 3] = [TODAY_STOPS, TODAY_ENDPOINTS, TODAY_PATH];

/// A map with named feature sources.
pub trait MapSurface: Send + Sync {
    /// Replace the contents of `source`.
    fn set_data(&self, source: &str, data: FeatureCollection);
}

/// Surface that keeps the sources in memory. The CLI renders it as
/// GeoJSON; tests inspect the write history.
#[derive(Debug, Default)]
pub struct InMemorySurface {
    state: Mutex<SurfaceState>,
}

#[derive(Debug, Default)]
struct SurfaceState {
    sources: BTreeMap<String, FeatureCollection>,
    history: Vec<(String, FeatureCollection)>,
}

impl InMemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of `source`, if it was ever written.
    pub fn source(&self, source: &str) -> Option<FeatureCollection> {
        self.lock().sources.get(source).cloned()
    }

    /// All sources by name.
    pub fn sources(&self) -> BTreeMap<String, FeatureCollection> {
        self.lock().sources.clone()
    }

    /// Every `set_data` call in order.
    pub fn history(&self) -> Vec<(String, FeatureCollection)> {
        self.lock().history.clone()
    }

    /// `{ "<source>": <FeatureCollection>, ... }`
    pub fn to_geojson(&self) -> serde_json::Value {
        let sources = self.sources();
        serde_json::Value::Object(
            sources
                .into_iter()
                .map(|(name, fc)| (name, serde_json::to_value(fc).unwrap_or_default()))
                .collect(),
        )
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MapSurface for InMemorySurface {
    fn set_data(&self, source: &str, data: FeatureCollection) {
        let mut state = self.lock();
        state.history.push((source.to_owned(), data.clone()));
        state.sources.insert(source.to_owned(), data);
    }
}
