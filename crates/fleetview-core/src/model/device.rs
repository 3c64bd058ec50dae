// ── Device domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::ids::{DeviceId, PositionId};

/// Connectivity as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DeviceStatus {
    Online,
    Offline,
    Unknown,
}

impl DeviceStatus {
    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }

    /// Title-cased word for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Online => "Online",
            Self::Offline => "Offline",
            Self::Unknown => "Unknown",
        }
    }
}

/// Device attributes the console reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceAttributes {
    /// Overspeed threshold in knots.
    pub speed_limit: Option<f64>,
    /// Kilometres per litre.
    pub fuel_consumption: Option<f64>,
    /// Metres driven since local midnight.
    pub today_distance: Option<f64>,
    /// Everything else, untouched.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A tracked unit (vehicle, person, asset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub unique_id: String,
    pub status: DeviceStatus,
    pub disabled: bool,
    pub last_update: Option<DateTime<Utc>>,
    /// Latest position the server associated with this device.
    pub position_id: Option<PositionId>,
    pub category: Option<String>,
    pub phone: Option<String>,
    pub model: Option<String>,
    pub contact: Option<String>,
    pub group_id: Option<i64>,
    pub attributes: DeviceAttributes,
}
