//! Push socket stream with auto-reconnect.
//!
//! Connects to the tracking server's `/api/socket` endpoint and fans out
//! parsed update frames through a [`tokio::sync::broadcast`] channel.
//! Reconnects with exponential backoff + jitter.
//!
//! # Example
//!
//! ```rust,ignore
//! use fleetview_api::socket::{ReconnectConfig, SocketHandle};
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let handle = SocketHandle::connect(
//!     client.socket_url()?,
//!     ReconnectConfig::default(),
//!     cancel.clone(),
//!     client.socket_headers(),
//! );
//! let mut rx = handle.subscribe();
//!
//! while let Ok(msg) = rx.recv().await {
//!     println!("{} positions", msg.positions.len());
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::auth::Credentials;
use crate::client::TrackingClient;
use crate::error::Error;
use crate::models::{ApiDevice, ApiPosition};

const MESSAGE_CHANNEL_CAPACITY: usize = 256;

// ── SocketMessage ────────────────────────────────────────────────────

/// One push frame from the server.
///
/// Every key is optional on the wire; the server sends `{}` as keepalive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SocketMessage {
    pub devices: Vec<ApiDevice>,
    pub positions: Vec<ApiPosition>,
    /// Server events (alarms, geofence crossings) passed through untyped.
    pub events: Vec<serde_json::Value>,
}

impl SocketMessage {
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty() && self.positions.is_empty() && self.events.is_empty()
    }
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for socket reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── SocketHandle ─────────────────────────────────────────────────────

/// Handle to a running push socket stream.
pub struct SocketHandle {
    message_rx: broadcast::Receiver<Arc<SocketMessage>>,
    cancel: CancellationToken,
}

impl SocketHandle {
    /// Spawn the reconnection loop and return immediately.
    ///
    /// `headers` are sent on every upgrade request (session cookie or
    /// bearer token, see [`TrackingClient::socket_headers`]).
    pub fn connect(
        socket_url: Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
        headers: Vec<(String, String)>,
    ) -> Self {
        let (message_tx, message_rx) = broadcast::channel(MESSAGE_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            socket_loop(socket_url, message_tx, reconnect, task_cancel, headers).await;
        });

        Self { message_rx, cancel }
    }

    /// Get a new receiver for the message stream.
    ///
    /// A consumer that falls behind receives
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<SocketMessage>> {
        self.message_rx.resubscribe()
    }

    /// Signal the background task to shut down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl TrackingClient {
    /// Headers that authenticate the socket upgrade request.
    pub fn socket_headers(&self) -> Vec<(String, String)> {
        match self.credentials() {
            Some(Credentials::Token(token)) => vec![(
                "Authorization".into(),
                format!("Bearer {}", token.expose_secret()),
            )],
            _ => self
                .cookie_header()
                .map(|cookie| vec![("Cookie".into(), cookie)])
                .unwrap_or_default(),
        }
    }
}

// ── Background reconnection loop ─────────────────────────────────────

async fn socket_loop(
    socket_url: Url,
    message_tx: broadcast::Sender<Arc<SocketMessage>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
    headers: Vec<(String, String)>,
) {
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&socket_url, &message_tx, &cancel, &headers) => {
                match result {
                    Ok(()) => {
                        tracing::info!("socket disconnected cleanly, reconnecting");
                        attempt = 0;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "socket error");

                        if reconnect.max_retries.is_some_and(|max| attempt >= max) {
                            tracing::error!(attempt, "socket reconnection limit reached, giving up");
                            break;
                        }

                        let delay = calculate_backoff(attempt, &reconnect);
                        tracing::info!(delay = ?delay, attempt, "waiting before reconnect");

                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(delay) => {}
                        }

                        attempt = attempt.saturating_add(1);
                    }
                }
            }
        }
    }

    tracing::debug!("socket loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

async fn connect_and_read(
    url: &Url,
    message_tx: &broadcast::Sender<Arc<SocketMessage>>,
    cancel: &CancellationToken,
    headers: &[(String, String)],
) -> Result<(), Error> {
    tracing::info!(url = %url, "connecting to push socket");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::SocketConnect(e.to_string()))?;

    let mut request = ClientRequestBuilder::new(uri);
    for (name, value) in headers {
        request = request.with_header(name.clone(), value.clone());
    }

    let (stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| Error::SocketConnect(e.to_string()))?;

    tracing::info!("push socket connected");

    let (_write, mut read) = stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        parse_and_broadcast(&text, message_tx);
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        return match frame {
                            Some(cf) if cf.code != tungstenite::protocol::frame::coding::CloseCode::Normal => {
                                Err(Error::SocketClosed {
                                    code: cf.code.into(),
                                    reason: cf.reason.to_string(),
                                })
                            }
                            _ => Ok(()),
                        };
                    }
                    Some(Err(e)) => return Err(Error::SocketConnect(e.to_string())),
                    None => {
                        tracing::info!("socket stream ended");
                        return Ok(());
                    }
                    // Ping (pong is automatic), Pong, Binary, Frame
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

// ── Message parsing ──────────────────────────────────────────────────

/// Parse a text frame and broadcast it unless it is a keepalive.
fn parse_and_broadcast(text: &str, message_tx: &broadcast::Sender<Arc<SocketMessage>>) {
    let message: SocketMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse socket frame");
            return;
        }
    };

    if message.is_empty() {
        tracing::trace!("socket keepalive");
        return;
    }

    // No active subscribers is not an error.
    let _ = message_tx.send(Arc::new(message));
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) * (1 +- 0.25)`
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic jitter seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    Duration::from_secs_f64((capped * jitter_factor).max(0.0))
}

// ── Tests ────────────────────────────────────────────────────────────
