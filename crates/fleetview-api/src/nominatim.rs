// External reverse geocoder (Nominatim-compatible)
//
// Separate from `TrackingClient`: different host, no tracking-server
// credentials, and public instances require a descriptive User-Agent
// (set by the shared transport builder).

use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::client::{check_status, decode_json};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Public OpenStreetMap instance.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// Subset of the `/reverse?format=json` response the console uses.
#[derive(Debug, Clone, Deserialize)]
pub struct ReverseResult {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub address: serde_json::Map<String, serde_json::Value>,
}

pub struct NominatimClient {
    http: reqwest::Client,
    base_url: Url,
}

impl NominatimClient {
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url,
        })
    }

    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET {base}/reverse?lat={lat}&lon={lon}&format=json&addressdetails=1`
    pub async fn reverse(&self, latitude: f64, longitude: f64) -> Result<ReverseResult, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let url = Url::parse(&format!("{base}/reverse"))?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let body = check_status(resp).await?.text().await?;
        decode_json(body)
    }
}
