// Tracking server response types
//
// Wire models for the `/api` JSON surface. Field names follow the server's
// camelCase. `attributes` stays a raw JSON map here; `fleetview-core`
// decodes the keys it cares about into typed fields at the boundary.
// Most fields use `#[serde(default)]` because servers omit nulls unevenly
// across versions.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub type Attributes = serde_json::Map<String, serde_json::Value>;

// ── Device ───────────────────────────────────────────────────────────

/// Device object from `GET /api/devices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDevice {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unique_id: String,
    /// `"online"`, `"offline"` or `"unknown"`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    /// Id of the device's latest position; `0` or absent means none yet.
    #[serde(default)]
    pub position_id: Option<i64>,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Metres driven since local midnight.
    #[serde(default)]
    pub today_distance: Option<f64>,
    #[serde(default)]
    pub attributes: Attributes,
}

// ── Position ─────────────────────────────────────────────────────────

/// Position object from `GET /api/positions` and socket frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPosition {
    pub id: i64,
    pub device_id: i64,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub server_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub device_time: Option<DateTime<Utc>>,
    pub fix_time: DateTime<Utc>,
    #[serde(default)]
    pub outdated: bool,
    #[serde(default = "default_true")]
    pub valid: bool,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: f64,
    /// Knots.
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub course: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub attributes: Attributes,
}

fn default_true() -> bool {
    true
}

// ── Stop report ──────────────────────────────────────────────────────

/// Stop entry from `GET /api/reports/stops`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStop {
    pub device_id: i64,
    #[serde(default)]
    pub device_name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Milliseconds.
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub position_id: Option<i64>,
    #[serde(default)]
    pub engine_hours: Option<i64>,
    #[serde(default)]
    pub spent_fuel: Option<f64>,
}

// ── Server ───────────────────────────────────────────────────────────

/// Server settings from `GET /api/server`.
///
/// Only the fields the console reads are modelled; the rest land in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub geocoder_enabled: bool,
    #[serde(default)]
    pub map: Option<String>,
    #[serde(default)]
    pub coordinate_format: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Counters from `GET /api/dashboard`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardStats {
    pub users: u64,
    pub managers: u64,
    pub vehicles: u64,
    pub running: u64,
    pub stopped: u64,
    pub overspeed: u64,
}

// ── Report range ─────────────────────────────────────────────────────

/// Device + time window shared by the route and stop report queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRange {
    pub device_id: i64,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl ReportRange {
    /// Query parameters `deviceId`, `from`, `to` with ISO-8601 millisecond timestamps.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("deviceId", self.device_id.to_string()),
            ("from", self.from.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ("to", self.to.to_rfc3339_opts(SecondsFormat::Millis, true)),
        ]
    }
}
