//! Shared helpers for command handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use fleetview_core::icons::map_icon_key;
use fleetview_core::status::{derive_status, device_row_status, format_age};
use fleetview_core::{DerivedStatus, Device, Position, RowStatus, Session};

use crate::error::CliError;

/// A device with everything a list row or card shows about it at `now`.
#[derive(Debug, Serialize)]
pub struct DeviceView {
    pub device: Arc<Device>,
    pub position: Option<Arc<Position>>,
    /// Live display state.
    pub live: DerivedStatus,
    /// Secondary row text (status word or last-seen age).
    pub row: RowStatus,
    pub icon: String,
}

impl DeviceView {
    pub fn build(session: &Session, device: Arc<Device>, now: DateTime<Utc>) -> Self {
        let position = session.store().latest_position(device.id);
        let live = derive_status(
            Some(device.as_ref()),
            position.as_deref(),
            now,
            &session.config().status,
        );
        let row = device_row_status(&device, now);
        let icon = map_icon_key(device.category.as_deref()).to_owned();
        Self {
            device,
            position,
            live,
            row,
            icon,
        }
    }

    /// Age of the latest fix, or `-` when there is none.
    pub fn fix_age(&self, now: DateTime<Utc>) -> String {
        self.position.as_ref().map_or_else(
            || "-".into(),
            |p| format_age(now.signed_duration_since(p.fix_time)),
        )
    }
}

/// Every device in the store, sorted by name.
pub fn device_views(session: &Session, now: DateTime<Utc>) -> Vec<DeviceView> {
    let mut views: Vec<DeviceView> = session
        .store()
        .devices_snapshot()
        .iter()
        .map(|d| DeviceView::build(session, Arc::clone(d), now))
        .collect();
    views.sort_by_cached_key(|v| (v.device.name.to_lowercase(), v.device.id));
    views
}

/// Resolve a device identifier (id, name or unique id) to a view.
pub fn resolve_view(
    session: &Session,
    identifier: &str,
    now: DateTime<Utc>,
) -> Result<DeviceView, CliError> {
    let device = session.resolve_device(identifier)?;
    Ok(DeviceView::build(session, device, now))
}

pub fn or_dash(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => "-",
    }
}
