// ── Domain model ──
//
// Canonical representations of tracking-server entities. Raw attribute
// maps are decoded into typed fields at the boundary (see `convert`),
// so nothing downstream checks JSON for key presence.

pub mod device;
pub mod geo;
pub mod ids;
pub mod position;
pub mod stop;

pub use device::{Device, DeviceAttributes, DeviceStatus};
pub use geo::{Bounds, Feature, FeatureCollection, Geometry};
pub use ids::{DeviceId, PositionId};
pub use position::{Position, PositionAttributes};
pub use stop::Stop;
