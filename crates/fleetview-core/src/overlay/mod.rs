// ── Today-route overlay ──
//
// Day-scoped route, endpoints and stops for the selected device, pushed
// into named map sources.

mod clock;
mod surface;
mod today_route;

use std::future::Future;

use chrono::{DateTime, Utc};

use fleetview_api::{ReportRange, TrackingClient};

use crate::error::CoreError;
use crate::model::{DeviceId, Position, Stop};

pub use clock::{Clock, FixedClock, SystemClock, day_bounds_in};
pub use surface::{
    InMemorySurface, MapSurface, OVERLAY_SOURCES, TODAY_ENDPOINTS, TODAY_PATH, TODAY_STOPS,
};
pub use today_route::{OverlayState, TodayRouteOverlay};

/// The two report queries the overlay needs.
pub trait RouteSource: Send + Sync {
    /// Positions of `device` within `[from, to]`, oldest first.
    fn route_positions(
        &self,
        device: DeviceId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<Position>, CoreError>> + Send;

    /// Stops of `device` within `[from, to]`.
    fn stops(
        &self,
        device: DeviceId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<Stop>, CoreError>> + Send;
}

fn report_range(device: DeviceId, from: DateTime<Utc>, to: DateTime<Utc>) -> ReportRange {
    ReportRange {
        device_id: device.get(),
        from,
        to,
    }
}

impl RouteSource for TrackingClient {
    async fn route_positions(
        &self,
        device: DeviceId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Position>, CoreError> {
        let raw = TrackingClient::route_positions(self, &report_range(device, from, to)).await?;
        Ok(raw.into_iter().map(Position::from).collect())
    }

    async fn stops(
        &self,
        device: DeviceId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Stop>, CoreError> {
        let raw = self.stops_report(&report_range(device, from, to)).await?;
        Ok(raw.into_iter().map(Stop::from).collect())
    }
}
