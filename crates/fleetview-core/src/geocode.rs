// ── Address resolution ──
//
// Best-effort reverse geocoding. Steps are tried in order and the first
// that yields a non-empty address wins:
//
//   1. the address already attached to the position
//   2. "Geocoding Disabled" when the server has geocoding switched off
//   3. the external geocoder (if configured)
//   4. the server's own geocoder
//   5. "Unknown Location"
//
// A failing step is logged and skipped; resolution itself never fails.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use fleetview_api::{NominatimClient, TrackingClient};

use crate::error::CoreError;

pub const DISABLED_PLACEHOLDER: &str = "Geocoding Disabled";
pub const UNKNOWN_PLACEHOLDER: &str = "Unknown Location";

/// External reverse geocoder (Nominatim-compatible).
pub trait ExternalGeocoder: Send + Sync {
    /// The display name for a coordinate, `None` if the service has none.
    fn reverse(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = Result<Option<String>, CoreError>> + Send;
}

/// The tracking server's built-in geocoder.
pub trait ServerGeocoder: Send + Sync {
    fn geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = Result<String, CoreError>> + Send;
}

impl ExternalGeocoder for NominatimClient {
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Option<String>, CoreError> {
        let result = NominatimClient::reverse(self, latitude, longitude).await?;
        if let Some(error) = result.error {
            debug!(%error, "external geocoder returned an error object");
        }
        Ok(result.display_name)
    }
}

impl ServerGeocoder for TrackingClient {
    async fn geocode(&self, latitude: f64, longitude: f64) -> Result<String, CoreError> {
        Ok(self.server_geocode(latitude, longitude).await?)
    }
}

/// Which step produced an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressSource {
    Original,
    Disabled,
    External,
    Server,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedAddress {
    pub text: String,
    pub source: AddressSource,
}

impl ResolvedAddress {
    fn new(text: impl Into<String>, source: AddressSource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }
}

pub struct AddressResolver<E, S> {
    external: Option<Arc<E>>,
    server: Arc<S>,
    geocoding_enabled: bool,
}

impl<E: ExternalGeocoder, S: ServerGeocoder> AddressResolver<E, S> {
    /// `geocoding_enabled` is the server-level switch (`geocoderEnabled`).
    pub fn new(external: Option<Arc<E>>, server: Arc<S>, geocoding_enabled: bool) -> Self {
        Self {
            external,
            server,
            geocoding_enabled,
        }
    }

    pub async fn resolve(
        &self,
        latitude: f64,
        longitude: f64,
        original: Option<&str>,
    ) -> ResolvedAddress {
        if let Some(address) = original.filter(|a| !a.trim().is_empty()) {
            return ResolvedAddress::new(address, AddressSource::Original);
        }

        if !self.geocoding_enabled {
            return ResolvedAddress::new(DISABLED_PLACEHOLDER, AddressSource::Disabled);
        }

        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            warn!(latitude, longitude, "coordinates out of range, not geocoding");
            return ResolvedAddress::new(UNKNOWN_PLACEHOLDER, AddressSource::Unknown);
        }

        if let Some(external) = &self.external {
            match external.reverse(latitude, longitude).await {
                Ok(Some(name)) if !name.trim().is_empty() => {
                    return ResolvedAddress::new(name.trim(), AddressSource::External);
                }
                Ok(_) => debug!(step = "external", "geocoder returned no display name"),
                Err(e) => warn!(step = "external", error = %e, "reverse geocoding failed"),
            }
        }

        match self.server.geocode(latitude, longitude).await {
            Ok(text) if !text.trim().is_empty() => {
                return ResolvedAddress::new(text.trim(), AddressSource::Server);
            }
            Ok(_) => debug!(step = "server", "server geocoder returned an empty body"),
            Err(e) => warn!(step = "server", error = %e, "reverse geocoding failed"),
        }

        ResolvedAddress::new(UNKNOWN_PLACEHOLDER, AddressSource::Unknown)
    }
}
