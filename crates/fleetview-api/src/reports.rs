use tracing::debug;

use crate::client::TrackingClient;
use crate::error::Error;
use crate::models::{ApiStop, ReportRange};

impl TrackingClient {
    /// Stops made by one device within a time window.
    ///
    /// `GET /api/reports/stops?deviceId={id}&from={iso}&to={iso}`
    ///
    /// The reports endpoint content-negotiates (JSON or spreadsheet); the
    /// request always asks for `application/json`.
    pub async fn stops_report(&self, range: &ReportRange) -> Result<Vec<ApiStop>, Error> {
        debug!(device_id = range.device_id, "fetching stops report");
        self.get_json("reports/stops", &range.query()).await
    }
}
