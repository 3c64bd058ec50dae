// fleetview-api: Async Rust client for fleet-tracking server APIs (REST + push socket)

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod nominatim;
pub mod socket;
pub mod transport;

mod devices;
mod positions;
mod reports;
mod server;

pub use auth::Credentials;
pub use client::TrackingClient;
pub use error::Error;
pub use models::{ApiDevice, ApiPosition, ApiStop, DashboardStats, ReportRange, ServerInfo};
pub use nominatim::{NominatimClient, ReverseResult};
pub use socket::{ReconnectConfig, SocketHandle, SocketMessage};
pub use transport::{TlsMode, TransportConfig};
