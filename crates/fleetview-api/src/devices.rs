// Device endpoints
//
// Read-only device listing. The server scopes the list to the
// authenticated user's permissions.

use tracing::debug;

use crate::client::TrackingClient;
use crate::error::Error;
use crate::models::ApiDevice;

impl TrackingClient {
    /// List all devices visible to the current user.
    ///
    /// `GET /api/devices`
    pub async fn list_devices(&self) -> Result<Vec<ApiDevice>, Error> {
        debug!("listing devices");
        self.get_json("devices", &[]).await
    }

    /// Get a single device by id.
    ///
    /// `GET /api/devices?id={id}`. Returns `None` if the server does not
    /// know the id or the user cannot see it.
    pub async fn get_device(&self, id: i64) -> Result<Option<ApiDevice>, Error> {
        debug!(id, "fetching device");
        let devices: Vec<ApiDevice> = self.get_json("devices", &[("id", id.to_string())]).await?;
        Ok(devices.into_iter().find(|d| d.id == id))
    }
}
