// ── API-to-domain type conversions ──
//
// Bridges raw `fleetview_api` response types into `fleetview_core::model`
// domain types. Attribute maps are decoded here, once: known keys become
// typed fields, anything left over is kept in `extra`.

use serde_json::{Map, Value};

use fleetview_api::models::{ApiDevice, ApiPosition, ApiStop};

use crate::model::{
    Device, DeviceAttributes, DeviceId, DeviceStatus, Position, PositionAttributes, PositionId,
    Stop,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Remove `key` and read it with `read`. A value `read` rejects goes
/// back into the map untouched.
fn take<T>(map: &mut Map<String, Value>, key: &str, read: impl Fn(&Value) -> Option<T>) -> Option<T> {
    let value = map.remove(key)?;
    let parsed = read(&value);
    if parsed.is_none() {
        map.insert(key.to_owned(), value);
    }
    parsed
}

/// Read a bool. Accepts JSON booleans and the strings `"true"` /
/// `"false"` that some protocol decoders emit.
fn take_bool(map: &mut Map<String, Value>, key: &str) -> Option<bool> {
    take(map, key, |value| match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Read a number. Numeric strings are accepted.
fn take_f64(map: &mut Map<String, Value>, key: &str) -> Option<f64> {
    take(map, key, |value| match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Servers use `0` for "no position yet".
fn position_ref(raw: Option<i64>) -> Option<PositionId> {
    raw.filter(|&id| id > 0).map(PositionId::new)
}

// ── Attributes ─────────────────────────────────────────────────────

impl From<Map<String, Value>> for PositionAttributes {
    fn from(mut map: Map<String, Value>) -> Self {
        Self {
            ignition: take_bool(&mut map, "ignition"),
            motion: take_bool(&mut map, "motion"),
            battery_level: take_f64(&mut map, "batteryLevel"),
            rssi: take_f64(&mut map, "rssi"),
            fuel: take_f64(&mut map, "fuel"),
            total_distance: take_f64(&mut map, "totalDistance"),
            odometer: take_f64(&mut map, "odometer"),
            charge: take_bool(&mut map, "charge"),
            extra: map,
        }
    }
}

impl From<Map<String, Value>> for DeviceAttributes {
    fn from(mut map: Map<String, Value>) -> Self {
        Self {
            speed_limit: take_f64(&mut map, "speedLimit"),
            fuel_consumption: take_f64(&mut map, "fuelConsumption"),
            today_distance: take_f64(&mut map, "todayDistance"),
            extra: map,
        }
    }
}

// ── Entities ───────────────────────────────────────────────────────

impl From<ApiDevice> for Device {
    fn from(d: ApiDevice) -> Self {
        let status = d
            .status
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DeviceStatus::Unknown);

        // Servers report today's distance on the device itself; older
        // builds only carry it as an attribute.
        let mut attributes = DeviceAttributes::from(d.attributes);
        attributes.today_distance = d.today_distance.or(attributes.today_distance);

        Device {
            id: DeviceId::new(d.id),
            name: d.name,
            unique_id: d.unique_id,
            status,
            disabled: d.disabled,
            last_update: d.last_update,
            position_id: position_ref(d.position_id),
            category: d.category.filter(|c| !c.is_empty()),
            phone: d.phone.filter(|p| !p.is_empty()),
            model: d.model.filter(|m| !m.is_empty()),
            contact: d.contact.filter(|c| !c.is_empty()),
            group_id: d.group_id.filter(|&g| g > 0),
            attributes,
        }
    }
}

impl From<ApiPosition> for Position {
    fn from(p: ApiPosition) -> Self {
        Position {
            id: PositionId::new(p.id),
            device_id: DeviceId::new(p.device_id),
            fix_time: p.fix_time,
            server_time: p.server_time,
            latitude: p.latitude,
            longitude: p.longitude,
            altitude: p.altitude,
            speed: p.speed,
            course: p.course,
            address: p.address.filter(|a| !a.trim().is_empty()),
            valid: p.valid,
            outdated: p.outdated,
            attributes: PositionAttributes::from(p.attributes),
        }
    }
}

impl From<ApiStop> for Stop {
    fn from(s: ApiStop) -> Self {
        Stop {
            device_id: DeviceId::new(s.device_id),
            latitude: s.latitude,
            longitude: s.longitude,
            start_time: s.start_time,
            end_time: s.end_time,
            duration_ms: s.duration,
            address: s.address.filter(|a| !a.trim().is_empty()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api_position(attributes: Value) -> ApiPosition {
        serde_json::from_value(json!({
            "id": 10, "deviceId": 3,
            "fixTime": "2024-05-01T08:30:00Z",
            "latitude": 52.0, "longitude": 4.0, "speed": 0.0,
            "attributes": attributes
        }))
        .unwrap()
    }

    #[test]
    fn known_attributes_become_typed_fields() {
        let pos = Position::from(api_position(json!({
            "ignition": true,
            "motion": false,
            "batteryLevel": 64,
            "rssi": -81,
            "hdop": 0.9
        })));

        assert_eq!(pos.attributes.ignition, Some(true));
        assert_eq!(pos.attributes.motion, Some(false));
        assert_eq!(pos.attributes.battery_level, Some(64.0));
        assert_eq!(pos.attributes.rssi, Some(-81.0));
        assert_eq!(pos.attributes.extra.len(), 1);
        assert!(pos.attributes.extra.contains_key("hdop"));
    }

    #[test]
    fn absent_attributes_stay_none() {
        let pos = Position::from(api_position(json!({})));
        assert_eq!(pos.attributes, PositionAttributes::default());
    }

    #[test]
    fn string_encoded_values_are_accepted() {
        let pos = Position::from(api_position(json!({ "ignition": "true", "fuel": "37.5" })));
        assert_eq!(pos.attributes.ignition, Some(true));
        assert_eq!(pos.attributes.fuel, Some(37.5));
    }

    #[test]
    fn mistyped_attribute_is_preserved_in_extra() {
        let pos = Position::from(api_position(json!({ "motion": [1, 2] })));
        assert_eq!(pos.attributes.motion, None);
        assert_eq!(pos.attributes.extra.get("motion"), Some(&json!([1, 2])));
    }

    #[test]
    fn device_status_and_position_ref() {
        let api: ApiDevice = serde_json::from_value(json!({
            "id": 5, "name": "Bus 5", "uniqueId": "B5", "status": "ONLINE",
            "positionId": 0, "category": "",
            "attributes": { "speedLimit": 43.2, "fuelConsumption": 8 }
        }))
        .unwrap();
        let dev = Device::from(api);

        assert_eq!(dev.status, DeviceStatus::Online);
        assert_eq!(dev.position_id, None);
        assert_eq!(dev.category, None);
        assert_eq!(dev.attributes.speed_limit, Some(43.2));
        assert_eq!(dev.attributes.fuel_consumption, Some(8.0));
    }

    #[test]
    fn unparseable_string_is_preserved_in_extra() {
        let pos = Position::from(api_position(json!({ "ignition": "yes", "rssi": "strong" })));
        assert_eq!(pos.attributes.ignition, None);
        assert_eq!(pos.attributes.rssi, None);
        assert_eq!(pos.attributes.extra.get("ignition"), Some(&json!("yes")));
        assert_eq!(pos.attributes.extra.get("rssi"), Some(&json!("strong")));
    }

    #[test]
    fn today_distance_is_read_from_the_device() {
        let api: ApiDevice = serde_json::from_value(json!({
            "id": 1, "name": "Truck 1", "uniqueId": "T1",
            "todayDistance": 42000.0,
            "attributes": { "fuelConsumption": 10.0 }
        }))
        .unwrap();
        let dev = Device::from(api);

        assert_eq!(dev.attributes.today_distance, Some(42000.0));
        assert_eq!(
            crate::indicators::fuel_used_today(
                dev.attributes.today_distance,
                dev.attributes.fuel_consumption
            ),
            Some(4.2)
        );
    }

    #[test]
    fn today_distance_falls_back_to_the_attribute() {
        let api: ApiDevice = serde_json::from_value(json!({
            "id": 2, "attributes": { "todayDistance": 1500 }
        }))
        .unwrap();
        assert_eq!(Device::from(api).attributes.today_distance, Some(1500.0));
    }

    #[test]
    fn unrecognised_status_is_unknown() {
        let api: ApiDevice =
            serde_json::from_value(json!({ "id": 1, "status": "sleeping" })).unwrap();
        assert_eq!(Device::from(api).status, DeviceStatus::Unknown);
    }
}
