// ── Single-writer update path ──
//
// Every source of fresh data (initial load, periodic refresh, push
// socket) turns what it received into `StoreUpdate`s and sends them to
// one task that applies them in order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::DataStore;
use crate::error::CoreError;
use crate::model::{Device, DeviceId, Position};

/// A mutation of the store.
#[derive(Debug, Clone)]
pub enum StoreUpdate {
    /// The complete device list. Devices not in it are removed.
    Devices(Vec<Device>),
    /// One device changed (push frames carry only changed devices).
    DeviceChanged(Device),
    /// Latest positions. A device's slot is replaced unless the incoming
    /// fix is older than the stored one.
    Positions(Vec<Position>),
}

#[derive(Debug)]
enum Message {
    Update(StoreUpdate),
    /// Acknowledged once every earlier update has been applied.
    Barrier(oneshot::Sender<()>),
}

/// Cloneable handle for sending updates to the sync task.
#[derive(Debug, Clone)]
pub struct StoreWriter {
    tx: mpsc::UnboundedSender<Message>,
}

impl StoreWriter {
    pub fn send(&self, update: StoreUpdate) -> Result<(), CoreError> {
        self.tx
            .send(Message::Update(update))
            .map_err(|_| CoreError::Disconnected)
    }

    /// Wait until everything sent so far is visible in the store.
    pub async fn flush(&self) -> Result<(), CoreError> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(Message::Barrier(ack))
            .map_err(|_| CoreError::Disconnected)?;
        done.await.map_err(|_| CoreError::Disconnected)
    }
}

/// Spawn the task that owns all writes to `store`.
///
/// The task runs until `cancel` fires or every [`StoreWriter`] is dropped.
pub fn spawn_sync_task(
    store: Arc<DataStore>,
    cancel: CancellationToken,
) -> (StoreWriter, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(sync_task(store, rx, cancel));
    (StoreWriter { tx }, handle)
}

async fn sync_task(
    store: Arc<DataStore>,
    mut rx: mpsc::UnboundedReceiver<Message>,
    cancel: CancellationToken,
) {
    debug!("store sync task started");
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            message = rx.recv() => match message {
                Some(Message::Update(update)) => store.apply(update),
                Some(Message::Barrier(ack)) => {
                    let _ = ack.send(());
                }
                None => break,
            }
        }
    }
    debug!("store sync task exiting");
}

impl DataStore {
    /// Apply one update. Only the sync task calls this.
    pub(crate) fn apply(&self, update: StoreUpdate) {
        match update {
            StoreUpdate::Devices(devices) => self.replace_devices(devices),
            StoreUpdate::DeviceChanged(device) => {
                trace!(device_id = %device.id, "device changed");
                self.devices.upsert(device.id, device);
            }
            StoreUpdate::Positions(positions) => self.merge_positions(positions),
        }
        self.last_sync.send_replace(Some(Utc::now()));
    }

    /// Upsert-then-prune: incoming devices are written first, then any
    /// device missing from the incoming set is dropped together with its
    /// position. Readers never observe a transient empty list.
    fn replace_devices(&self, devices: Vec<Device>) {
        let incoming: HashSet<DeviceId> = devices.iter().map(|d| d.id).collect();
        self.devices.upsert_many(devices.into_iter().map(|d| (d.id, d)));
        let removed = self.devices.retain_keys(|id| incoming.contains(id));
        self.positions.retain_keys(|id| incoming.contains(id));
        debug!(devices = incoming.len(), removed, "device list applied");
    }

    /// Newest fix per device wins, within the batch and against the store.
    /// On equal fix times the later arrival wins.
    fn merge_positions(&self, positions: Vec<Position>) {
        let mut newest: HashMap<DeviceId, Position> = HashMap::with_capacity(positions.len());
        for p in positions {
            match newest.get(&p.device_id) {
                Some(kept) if p.fix_time < kept.fix_time => {}
                _ => {
                    newest.insert(p.device_id, p);
                }
            }
        }

        let fresh: Vec<(DeviceId, Position)> = newest
            .into_values()
            .filter(|p| {
                self.positions
                    .get(&p.device_id)
                    .is_none_or(|current| p.fix_time >= current.fix_time)
            })
            .map(|p| (p.device_id, p))
            .collect();
        let applied = self.positions.upsert_many(fresh);
        trace!(applied, "positions merged");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{DeviceAttributes, DeviceStatus, PositionAttributes, PositionId};
    use chrono::{DateTime, TimeZone};

    fn device(id: i64, name: &str) -> Device {
        Device {
            id: DeviceId::new(id),
            name: name.into(),
            unique_id: format!("U{id}"),
            status: DeviceStatus::Online,
            disabled: false,
            last_update: None,
            position_id: None,
            category: None,
            phone: None,
            model: None,
            contact: None,
            group_id: None,
            attributes: DeviceAttributes::default(),
        }
    }

    fn position(id: i64, device_id: i64, fix_time: DateTime<Utc>) -> Position {
        Position {
            id: PositionId::new(id),
            device_id: DeviceId::new(device_id),
            fix_time,
            server_time: None,
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
            speed: 0.0,
            course: 0.0,
            address: None,
            valid: true,
            outdated: false,
            attributes: PositionAttributes::default(),
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn device_refresh_prunes_missing_devices_and_their_positions() {
        let store = DataStore::new();
        store.apply(StoreUpdate::Devices(vec![device(1, "a"), device(2, "b")]));
        store.apply(StoreUpdate::Positions(vec![position(10, 1, at(8)), position(11, 2, at(8))]));

        store.apply(StoreUpdate::Devices(vec![device(2, "b2")]));

        assert_eq!(store.device_count(), 1);
        assert_eq!(store.device(DeviceId::new(2)).unwrap().name, "b2");
        assert!(store.latest_position(DeviceId::new(1)).is_none());
        assert!(store.latest_position(DeviceId::new(2)).is_some());
        assert!(store.last_sync().is_some());
    }

    #[test]
    fn older_fix_does_not_replace_newer() {
        let store = DataStore::new();
        store.apply(StoreUpdate::Positions(vec![position(20, 1, at(10))]));
        store.apply(StoreUpdate::Positions(vec![position(19, 1, at(9))]));

        assert_eq!(store.latest_position(DeviceId::new(1)).unwrap().id, PositionId::new(20));

        store.apply(StoreUpdate::Positions(vec![position(21, 1, at(10))]));
        assert_eq!(store.latest_position(DeviceId::new(1)).unwrap().id, PositionId::new(21));
    }

    #[test]
    fn out_of_order_batch_keeps_the_newest_fix() {
        let store = DataStore::new();
        store.apply(StoreUpdate::Positions(vec![
            position(2, 1, at(10)),
            position(1, 1, at(9)),
            position(3, 2, at(7)),
        ]));

        let latest = store.latest_position(DeviceId::new(1)).unwrap();
        assert_eq!(latest.id, PositionId::new(2));
        assert_eq!(latest.fix_time, at(10));
        assert_eq!(store.latest_position(DeviceId::new(2)).unwrap().id, PositionId::new(3));

        // A batch that is entirely older than the stored fix changes nothing.
        store.apply(StoreUpdate::Positions(vec![position(4, 1, at(8)), position(5, 1, at(9))]));
        assert_eq!(store.latest_position(DeviceId::new(1)).unwrap().id, PositionId::new(2));
    }

    #[test]
    fn device_changed_upserts_single_device() {
        let store = DataStore::new();
        store.apply(StoreUpdate::Devices(vec![device(1, "a")]));
        store.apply(StoreUpdate::DeviceChanged(device(3, "c")));

        assert_eq!(store.device_count(), 2);
        assert!(store.find_device("U3").is_some());
        assert!(store.find_device("C").is_some());
    }

    #[tokio::test]
    async fn sync_task_applies_updates_in_order() {
        let store = Arc::new(DataStore::new());
        let cancel = CancellationToken::new();
        let (writer, handle) = spawn_sync_task(Arc::clone(&store), cancel.clone());
        let mut devices = store.subscribe_devices();

        writer.send(StoreUpdate::Devices(vec![device(1, "first")])).unwrap();
        writer.send(StoreUpdate::DeviceChanged(device(1, "second"))).unwrap();

        while store.device(DeviceId::new(1)).is_none_or(|d| d.name != "second") {
            devices.changed().await.unwrap();
        }

        writer.send(StoreUpdate::Positions(vec![position(5, 1, at(7))])).unwrap();
        writer.flush().await.unwrap();
        assert_eq!(store.position_count(), 1);

        cancel.cancel();
        handle.await.unwrap();
        assert!(writer.send(StoreUpdate::Positions(Vec::new())).is_err());
    }
}
