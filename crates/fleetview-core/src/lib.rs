// fleetview-core: Reactive data layer between fleetview-api and the console.

pub mod config;
pub mod convert;
pub mod error;
pub mod geocode;
pub mod icons;
pub mod indicators;
pub mod model;
pub mod overlay;
pub mod session;
pub mod status;
pub mod store;
pub mod stream;
pub mod summary;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{Auth, GeocoderSettings, SessionConfig, TlsVerification};
pub use error::CoreError;
pub use geocode::{AddressResolver, AddressSource, ResolvedAddress};
pub use overlay::{
    Clock, FixedClock, InMemorySurface, MapSurface, OverlayState, RouteSource, SystemClock,
    TodayRouteOverlay,
};
pub use session::{ConnectionState, Session};
pub use status::{DerivedStatus, DisplayStatus, RowStatus, StatusColor, StatusPolicy};
pub use store::{DataStore, StoreUpdate};
pub use stream::EntityStream;
pub use summary::FleetSummary;

pub use model::{
    Bounds, Device, DeviceAttributes, DeviceId, DeviceStatus, Feature, FeatureCollection,
    Geometry, Position, PositionAttributes, PositionId, Stop,
};
