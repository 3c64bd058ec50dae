// ── Fleet summary ──
//
// Local fleet counters computed from the store with the same status
// derivation the device rows use.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::status::{DisplayStatus, StatusPolicy, derive_status};
use crate::store::DataStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FleetSummary {
    pub total: usize,
    pub moving: usize,
    pub engine_on: usize,
    pub stopped: usize,
    pub offline: usize,
    /// Devices whose latest fix is stale (also counted in their status).
    pub stale: usize,
}

impl FleetSummary {
    pub fn compute(store: &DataStore, now: DateTime<Utc>, policy: &StatusPolicy) -> Self {
        let mut summary = Self::default();
        for device in store.devices_snapshot().iter() {
            let position = store.latest_position(device.id);
            let derived = derive_status(Some(device.as_ref()), position.as_deref(), now, policy);

            summary.total += 1;
            if derived.is_stale {
                summary.stale += 1;
            }
            match derived.status {
                DisplayStatus::Moving => summary.moving += 1,
                DisplayStatus::EngineOn => summary.engine_on += 1,
                DisplayStatus::Stopped => summary.stopped += 1,
                DisplayStatus::Offline => summary.offline += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{
        Device, DeviceAttributes, DeviceId, DeviceStatus, Position, PositionAttributes, PositionId,
    };
    use crate::store::StoreUpdate;
    use chrono::{TimeDelta, TimeZone};

    fn device(id: i64, status: DeviceStatus) -> Device {
        Device {
            id: DeviceId::new(id),
            name: format!("truck-{id}"),
            unique_id: format!("IMEI{id}"),
            status,
            disabled: false,
            last_update: None,
            position_id: Some(PositionId::new(id * 100)),
            category: None,
            phone: None,
            model: None,
            contact: None,
            group_id: None,
            attributes: DeviceAttributes::default(),
        }
    }

    fn position(device_id: i64, fix_time: DateTime<Utc>, speed: f64, ignition: bool) -> Position {
        Position {
            id: PositionId::new(device_id * 100),
            device_id: DeviceId::new(device_id),
            fix_time,
            server_time: None,
            latitude: 52.0,
            longitude: 5.0,
            altitude: 0.0,
            speed,
            course: 0.0,
            address: None,
            valid: true,
            outdated: false,
            attributes: PositionAttributes {
                ignition: Some(ignition),
                ..PositionAttributes::default()
            },
        }
    }

    #[test]
    fn counts_each_device_once() {
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();
        let fresh = now - TimeDelta::seconds(30);
        let old = now - TimeDelta::minutes(30);

        let store = DataStore::new();
        store.apply(StoreUpdate::Devices(vec![
            device(1, DeviceStatus::Online),
            device(2, DeviceStatus::Online),
            device(3, DeviceStatus::Online),
            device(4, DeviceStatus::Offline),
            device(5, DeviceStatus::Unknown),
        ]));
        store.apply(StoreUpdate::Positions(vec![
            position(1, fresh, 30.0, false),
            position(2, fresh, 0.0, true),
            position(3, old, 40.0, false),
            position(4, old, 0.0, false),
        ]));

        let summary = FleetSummary::compute(&store, now, &StatusPolicy::default());

        assert_eq!(
            summary,
            FleetSummary {
                total: 5,
                moving: 1,
                engine_on: 1,
                stopped: 1,
                offline: 2,
                stale: 2,
            }
        );
    }
}
