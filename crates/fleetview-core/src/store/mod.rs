// ── Position store ──
//
// Latest known state per device. Writes go through `StoreUpdate` values
// applied by a single sync task; readers take snapshots or subscribe.

pub(crate) mod collection;
mod data_store;
mod sync;

pub use data_store::DataStore;
pub use sync::{StoreUpdate, StoreWriter, spawn_sync_task};
