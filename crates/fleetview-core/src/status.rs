//! Live status derivation.
//!
//! Turns a device, its latest position and the current time into the
//! display state shown on list rows and the status card. Everything here
//! is a pure function of its arguments: the same inputs always yield the
//! same [`DerivedStatus`], and `now` is always passed in.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Device, DeviceStatus, Position};

/// Default age after which a device's latest fix counts as stale.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(120);

// ── Policy ──────────────────────────────────────────────────────────

/// Tunables for status derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPolicy {
    /// A latest fix older than this (strictly) is stale.
    pub stale_after: Duration,
    /// When the device reports no `motion` attribute, treat `speed > 0`
    /// as moving. When off, a missing attribute means not moving.
    pub infer_motion_from_speed: bool,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            stale_after: DEFAULT_STALE_AFTER,
            infer_motion_from_speed: true,
        }
    }
}

// ── Output types ────────────────────────────────────────────────────

/// What the device is doing, as far as the console can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    Offline,
    Stopped,
    EngineOn,
    Moving,
}

impl DisplayStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Offline => "Offline",
            Self::Stopped => "Stopped",
            Self::EngineOn => "Engine On",
            Self::Moving => "Moving",
        }
    }
}

/// Semantic colour key; the renderer maps it to an actual colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusColor {
    Default,
    Success,
    Info,
    Warning,
    Error,
    Neutral,
}

/// Display state for one device. Never cached; recompute on every render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedStatus {
    pub status: DisplayStatus,
    pub color: StatusColor,
    pub is_stale: bool,
    pub effective_motion: bool,
    /// Knots; `0.0` whenever the device is not considered moving.
    pub effective_speed: f64,
}

impl DerivedStatus {
    pub fn label(&self) -> &'static str {
        self.status.label()
    }

    fn no_position() -> Self {
        Self {
            status: DisplayStatus::Offline,
            color: StatusColor::Default,
            is_stale: false,
            effective_motion: false,
            effective_speed: 0.0,
        }
    }
}

// ── Derivation ──────────────────────────────────────────────────────

/// Derive the display state of a device.
///
/// Staleness is only judged when `position` is the device's own latest
/// fix (`position.id == device.position_id`); a historical position is
/// never stale. A stale fix is shown as `Offline` when the server says the
/// device is offline and as `Stopped` otherwise, and it never counts as
/// moving. For a fresh fix the precedence is ignition, then motion.
pub fn derive_status(
    device: Option<&Device>,
    position: Option<&Position>,
    now: DateTime<Utc>,
    policy: &StatusPolicy,
) -> DerivedStatus {
    let Some(position) = position else {
        return DerivedStatus::no_position();
    };

    let is_stale = device.is_some_and(|d| is_stale(d, position, now, policy.stale_after));

    let reported_motion = position
        .attributes
        .motion
        .unwrap_or(policy.infer_motion_from_speed && position.speed > 0.0);
    let effective_motion = !is_stale && reported_motion;

    let status = if is_stale {
        match device.map(|d| d.status) {
            Some(DeviceStatus::Offline) => DisplayStatus::Offline,
            _ => DisplayStatus::Stopped,
        }
    } else if position.attributes.ignition == Some(true) {
        DisplayStatus::EngineOn
    } else if effective_motion {
        DisplayStatus::Moving
    } else {
        DisplayStatus::Stopped
    };

    let color = match status {
        DisplayStatus::Offline | DisplayStatus::Stopped => StatusColor::Warning,
        DisplayStatus::EngineOn => StatusColor::Success,
        DisplayStatus::Moving => StatusColor::Info,
    };

    DerivedStatus {
        status,
        color,
        is_stale,
        effective_motion,
        effective_speed: if effective_motion { position.speed } else { 0.0 },
    }
}

fn is_stale(device: &Device, position: &Position, now: DateTime<Utc>, stale_after: Duration) -> bool {
    if device.position_id != Some(position.id) {
        return false;
    }
    if !device.status.is_online() {
        return true;
    }
    let threshold = TimeDelta::from_std(stale_after).unwrap_or(TimeDelta::MAX);
    now.signed_duration_since(position.fix_time) > threshold
}

// ── Device row text ─────────────────────────────────────────────────

/// Secondary text + colour for a device list row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowStatus {
    pub text: String,
    pub color: StatusColor,
}

/// Online devices (and devices never heard from) show their status word;
/// everything else shows how long ago the server last heard from it.
pub fn device_row_status(device: &Device, now: DateTime<Utc>) -> RowStatus {
    let text = match device.last_update {
        Some(last) if !device.status.is_online() => format_age(now.signed_duration_since(last)),
        _ => device.status.label().to_owned(),
    };
    let color = match device.status {
        DeviceStatus::Online => StatusColor::Success,
        DeviceStatus::Offline => StatusColor::Error,
        DeviceStatus::Unknown => StatusColor::Neutral,
    };
    RowStatus { text, color }
}

/// Compact relative age: `just now`, `5m ago`, `3h ago`, `2d ago`.
pub fn format_age(age: TimeDelta) -> String {
    let secs = age.num_seconds();
    if secs < 60 {
        "just now".to_owned()
    } else if secs < 3_600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3_600)
    } else {
        format!("{}d ago", secs / 86_400)
    }
}
