// ── Position domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{DeviceId, PositionId};

/// Typed view of the position attributes the console reads.
///
/// `None` means the device did not report the value, which is distinct
/// from a reported `false` / `0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionAttributes {
    pub ignition: Option<bool>,
    pub motion: Option<bool>,
    /// Percent, 0-100.
    pub battery_level: Option<f64>,
    /// dBm.
    pub rssi: Option<f64>,
    /// Fuel level percent.
    pub fuel: Option<f64>,
    /// Metres.
    pub total_distance: Option<f64>,
    /// Metres.
    pub odometer: Option<f64>,
    pub charge: Option<bool>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A single GPS fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub device_id: DeviceId,
    pub fix_time: DateTime<Utc>,
    pub server_time: Option<DateTime<Utc>>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    /// Knots.
    pub speed: f64,
    /// Degrees from north.
    pub course: f64,
    pub address: Option<String>,
    pub valid: bool,
    pub outdated: bool,
    pub attributes: PositionAttributes,
}

impl Position {
    /// `[longitude, latitude]`, GeoJSON axis order.
    pub fn lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}
