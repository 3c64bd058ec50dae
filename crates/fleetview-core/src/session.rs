// ── Session ──
//
// Full lifecycle of one tracking-server connection: authentication,
// initial load, periodic refresh, the push-socket bridge and the
// single-writer store behind them.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use fleetview_api::socket::{ReconnectConfig, SocketHandle, SocketMessage};
use fleetview_api::{DashboardStats, NominatimClient, ServerInfo, TrackingClient, TransportConfig};

use crate::config::SessionConfig;
use crate::error::CoreError;
use crate::geocode::AddressResolver;
use crate::model::{Device, DeviceId, Position};
use crate::overlay::{Clock, MapSurface, TodayRouteOverlay};
use crate::status::{DerivedStatus, derive_status};
use crate::store::{DataStore, StoreUpdate, StoreWriter, spawn_sync_task};
use crate::summary::FleetSummary;

const EVENT_CHANNEL_SIZE: usize = 256;

// ── ConnectionState ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Session ──────────────────────────────────────────────────────────

/// Entry point for consumers. Cheaply cloneable.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    store: Arc<DataStore>,
    connection_state: watch::Sender<ConnectionState>,
    /// Server events from the push socket (alarms, geofence crossings).
    event_tx: broadcast::Sender<Arc<serde_json::Value>>,
    cancel: CancellationToken,
    client: Mutex<Option<Arc<TrackingClient>>>,
    server_info: Mutex<Option<ServerInfo>>,
    writer: Mutex<Option<StoreWriter>>,
    socket: Mutex<Option<SocketHandle>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Session {
    /// Create a session. Does NOT connect; call [`connect()`](Self::connect).
    pub fn new(config: SessionConfig) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);

        Self {
            inner: Arc::new(SessionInner {
                config,
                store: Arc::new(DataStore::new()),
                connection_state,
                event_tx,
                cancel: CancellationToken::new(),
                client: Mutex::new(None),
                server_info: Mutex::new(None),
                writer: Mutex::new(None),
                socket: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Authenticate, load devices and latest positions, then start the
    /// background tasks (store sync, periodic refresh, push socket).
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.inner
            .connection_state
            .send_replace(ConnectionState::Connecting);

        match self.establish().await {
            Ok(()) => {
                self.inner
                    .connection_state
                    .send_replace(ConnectionState::Connected);
                info!(url = %self.inner.config.url, "connected to tracking server");
                Ok(())
            }
            Err(e) => {
                self.inner.connection_state.send_replace(ConnectionState::Failed);
                Err(e)
            }
        }
    }

    async fn establish(&self) -> Result<(), CoreError> {
        let config = &self.inner.config;
        config.validate()?;

        let transport = config.transport();
        let client = TrackingClient::new(config.url.clone(), config.credentials(), &transport)
            .map_err(|e| CoreError::ConnectionFailed {
                url: config.url.to_string(),
                reason: e.to_string(),
            })?;
        client.authenticate().await?;

        let info = client.server_info().await?;
        debug!(
            version = info.version.as_deref().unwrap_or("?"),
            geocoder_enabled = info.geocoder_enabled,
            "server info"
        );
        *self.inner.server_info.lock().await = Some(info);

        let client = Arc::new(client);
        *self.inner.client.lock().await = Some(Arc::clone(&client));

        let cancel = self.inner.cancel.clone();
        let (writer, sync_handle) = spawn_sync_task(Arc::clone(&self.inner.store), cancel.clone());
        *self.inner.writer.lock().await = Some(writer.clone());

        let mut handles = self.inner.task_handles.lock().await;
        handles.push(sync_handle);

        // Initial data load, visible to readers before connect returns.
        self.full_refresh().await?;
        writer.flush().await?;

        let interval_secs = config.refresh_interval_secs;
        if interval_secs > 0 {
            let session = self.clone();
            handles.push(tokio::spawn(refresh_task(session, interval_secs, cancel.clone())));
        }

        if config.socket_enabled {
            let socket = SocketHandle::connect(
                client.socket_url()?,
                ReconnectConfig::default(),
                cancel.clone(),
                client.socket_headers(),
            );
            let rx = socket.subscribe();
            handles.push(tokio::spawn(socket_bridge_task(
                rx,
                writer,
                self.inner.event_tx.clone(),
                cancel,
            )));
            *self.inner.socket.lock().await = Some(socket);
        }

        Ok(())
    }

    /// Cancel background tasks and drop the client.
    pub async fn disconnect(&self) {
        self.inner.cancel.cancel();

        if let Some(socket) = self.inner.socket.lock().await.take() {
            socket.shutdown();
        }

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        *self.inner.writer.lock().await = None;
        *self.inner.client.lock().await = None;
        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    /// Fetch the device list and latest positions and queue them for the
    /// store.
    pub async fn full_refresh(&self) -> Result<(), CoreError> {
        let client = self.client().await?;
        let writer = self
            .inner
            .writer
            .lock()
            .await
            .clone()
            .ok_or(CoreError::Disconnected)?;

        let (devices, positions) = tokio::try_join!(client.list_devices(), client.latest_positions())?;

        let devices: Vec<Device> = devices.into_iter().map(Device::from).collect();
        let positions: Vec<Position> = positions.into_iter().map(Position::from).collect();
        debug!(devices = devices.len(), positions = positions.len(), "refresh fetched");

        writer.send(StoreUpdate::Devices(devices))?;
        writer.send(StoreUpdate::Positions(positions))?;
        Ok(())
    }

    // ── One-shot convenience ─────────────────────────────────────────

    /// Connect, run `f`, disconnect.
    ///
    /// For CLI commands: the push socket and periodic refresh are off
    /// since only one request-response cycle is needed.
    pub async fn oneshot<F, Fut, T>(config: SessionConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.socket_enabled = false;
        cfg.refresh_interval_secs = 0;

        let session = Session::new(cfg);
        session.connect().await?;
        let result = f(session.clone()).await;
        session.disconnect().await;
        result
    }

    // ── State observation ────────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Server events relayed from the push socket.
    pub fn events(&self) -> broadcast::Receiver<Arc<serde_json::Value>> {
        self.inner.event_tx.subscribe()
    }

    pub async fn client(&self) -> Result<Arc<TrackingClient>, CoreError> {
        self.inner
            .client
            .lock()
            .await
            .clone()
            .ok_or(CoreError::Disconnected)
    }

    pub async fn server_info(&self) -> Option<ServerInfo> {
        self.inner.server_info.lock().await.clone()
    }

    /// Whether the server has reverse geocoding switched on.
    pub async fn geocoding_enabled(&self) -> bool {
        self.inner
            .server_info
            .lock()
            .await
            .as_ref()
            .is_some_and(|info| info.geocoder_enabled)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Resolve a device by numeric id, name or unique id.
    pub fn resolve_device(&self, identifier: &str) -> Result<Arc<Device>, CoreError> {
        let store = &self.inner.store;
        identifier
            .parse::<DeviceId>()
            .ok()
            .and_then(|id| store.device(id))
            .or_else(|| store.find_device(identifier))
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: identifier.to_owned(),
            })
    }

    /// Derived display state of one device at `now`.
    pub fn status_for(&self, device_id: DeviceId, now: DateTime<Utc>) -> Result<DerivedStatus, CoreError> {
        let store = &self.inner.store;
        let device = store.device(device_id).ok_or_else(|| CoreError::DeviceNotFound {
            identifier: device_id.to_string(),
        })?;
        let position = store.latest_position(device_id);
        Ok(derive_status(
            Some(device.as_ref()),
            position.as_deref(),
            now,
            &self.inner.config.status,
        ))
    }

    pub fn summary(&self, now: DateTime<Utc>) -> FleetSummary {
        FleetSummary::compute(&self.inner.store, now, &self.inner.config.status)
    }

    /// Remote dashboard counters.
    pub async fn dashboard(&self) -> Result<DashboardStats, CoreError> {
        Ok(self.client().await?.dashboard().await?)
    }

    /// Address resolver wired to this server and the configured external
    /// geocoder.
    pub async fn address_resolver(
        &self,
    ) -> Result<AddressResolver<NominatimClient, TrackingClient>, CoreError> {
        let config = &self.inner.config;
        let external = if config.geocoder.enabled {
            let transport = TransportConfig {
                cookie_jar: None,
                ..config.transport()
            };
            Some(Arc::new(NominatimClient::new(config.geocoder.base_url()?, &transport)?))
        } else {
            None
        };
        Ok(AddressResolver::new(
            external,
            self.client().await?,
            self.geocoding_enabled().await,
        ))
    }

    /// Today-route overlay bound to this server.
    pub async fn today_route(
        &self,
        surface: Arc<dyn MapSurface>,
        clock: Arc<dyn Clock>,
    ) -> Result<TodayRouteOverlay<TrackingClient>, CoreError> {
        Ok(TodayRouteOverlay::new(self.client().await?, surface, clock))
    }
}

// ── Background tasks ─────────────────────────────────────────────────

async fn refresh_task(session: Session, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = session.full_refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}

/// Turn push frames into store updates and relay events.
async fn socket_bridge_task(
    mut rx: broadcast::Receiver<Arc<SocketMessage>>,
    writer: StoreWriter,
    event_tx: broadcast::Sender<Arc<serde_json::Value>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            msg = rx.recv() => match msg {
                Ok(msg) => {
                    if let Err(e) = apply_socket_message(&writer, &event_tx, &msg) {
                        warn!(error = %e, "store is gone, stopping socket bridge");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "socket bridge lagged; next refresh will catch up");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
    debug!("socket bridge exiting");
}

fn apply_socket_message(
    writer: &StoreWriter,
    event_tx: &broadcast::Sender<Arc<serde_json::Value>>,
    msg: &SocketMessage,
) -> Result<(), CoreError> {
    for device in &msg.devices {
        writer.send(StoreUpdate::DeviceChanged(Device::from(device.clone())))?;
    }
    if !msg.positions.is_empty() {
        let positions = msg.positions.iter().cloned().map(Position::from).collect();
        writer.send(StoreUpdate::Positions(positions))?;
    }
    for event in &msg.events {
        // No subscribers is fine.
        let _ = event_tx.send(Arc::new(event.clone()));
    }
    Ok(())
}
