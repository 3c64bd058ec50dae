// ── Central reactive data store ──
//
// Thread-safe storage for devices and their latest positions.
// Mutations are broadcast to subscribers via `watch` channels.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::collection::EntityCollection;
use crate::model::{Device, DeviceId, Position};
use crate::stream::EntityStream;

/// Reactive store for devices and the latest position of each device.
///
/// Reads are cheap `Arc` clones. Only the sync task mutates it (see
/// [`spawn_sync_task`](super::spawn_sync_task)), so updates are applied in
/// the order they were sent.
pub struct DataStore {
    pub(crate) devices: EntityCollection<DeviceId, Device>,
    /// Keyed by device: one latest position per device.
    pub(crate) positions: EntityCollection<DeviceId, Position>,
    pub(crate) last_sync: watch::Sender<Option<DateTime<Utc>>>,
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DataStore {
    pub fn new() -> Self {
        let (last_sync, _) = watch::channel(None);

        Self {
            devices: EntityCollection::new(),
            positions: EntityCollection::new(),
            last_sync,
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn devices_snapshot(&self) -> Arc<Vec<Arc<Device>>> {
        self.devices.snapshot()
    }

    pub fn positions_snapshot(&self) -> Arc<Vec<Arc<Position>>> {
        self.positions.snapshot()
    }

    // ── Single-entity lookups ────────────────────────────────────────

    pub fn device(&self, id: DeviceId) -> Option<Arc<Device>> {
        self.devices.get(&id)
    }

    pub fn latest_position(&self, device_id: DeviceId) -> Option<Arc<Position>> {
        self.positions.get(&device_id)
    }

    /// Case-insensitive lookup by name or unique id.
    pub fn find_device(&self, needle: &str) -> Option<Arc<Device>> {
        self.devices
            .snapshot()
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(needle) || d.unique_id.eq_ignore_ascii_case(needle))
            .cloned()
    }

    // ── Count accessors ──────────────────────────────────────────────

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_devices(&self) -> EntityStream<Device> {
        EntityStream::new(self.devices.subscribe())
    }

    pub fn subscribe_positions(&self) -> EntityStream<Position> {
        EntityStream::new(self.positions.subscribe())
    }

    // ── Metadata ─────────────────────────────────────────────────────

    /// When the sync task last applied an update.
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        *self.last_sync.borrow()
    }

    /// Combined change counter of both collections.
    pub fn version(&self) -> u64 {
        self.devices.version() + self.positions.version()
    }
}
