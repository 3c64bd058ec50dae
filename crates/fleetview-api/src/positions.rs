// Position endpoints
//
// Two shapes of the same resource: without parameters the server returns
// the latest position of every visible device; with a device and time
// window it returns that device's route.

use tracing::debug;

use crate::client::TrackingClient;
use crate::error::Error;
use crate::models::{ApiPosition, ReportRange};

impl TrackingClient {
    /// Latest known position for every visible device.
    ///
    /// `GET /api/positions`
    pub async fn latest_positions(&self) -> Result<Vec<ApiPosition>, Error> {
        debug!("fetching latest positions");
        self.get_json("positions", &[]).await
    }

    /// All positions of one device within a time window, oldest first.
    ///
    /// `GET /api/positions?deviceId={id}&from={iso}&to={iso}`
    pub async fn route_positions(&self, range: &ReportRange) -> Result<Vec<ApiPosition>, Error> {
        debug!(device_id = range.device_id, "fetching route positions");
        self.get_json("positions", &range.query()).await
    }
}
