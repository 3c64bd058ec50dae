// ── Runtime session configuration ──
//
// These types describe *how* to talk to a tracking server. They carry
// credentials and tuning but never touch disk: the CLI builds a
// `SessionConfig` from its profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use fleetview_api::{Credentials, TlsMode, TransportConfig, nominatim::DEFAULT_NOMINATIM_URL};

use crate::error::CoreError;
use crate::status::StatusPolicy;

/// How to authenticate with the server.
#[derive(Debug, Clone)]
pub enum Auth {
    /// API token sent as a bearer header.
    Token(SecretString),
    /// Email + password exchanged for a session cookie.
    Session {
        email: String,
        password: SecretString,
    },
}

impl From<Auth> for Credentials {
    fn from(auth: Auth) -> Self {
        match auth {
            Auth::Token(token) => Self::Token(token),
            Auth::Session { email, password } => Self::Session { email, password },
        }
    }
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file (PEM).
    CustomCa(PathBuf),
    /// Skip verification (self-hosted servers with self-signed certs).
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// External reverse geocoder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocoderSettings {
    /// Use the external geocoder before falling back to the server's.
    pub enabled: bool,
    /// Nominatim-compatible base URL; `None` is the public instance.
    pub url: Option<Url>,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
        }
    }
}

impl GeocoderSettings {
    pub fn base_url(&self) -> Result<Url, CoreError> {
        match &self.url {
            Some(url) => Ok(url.clone()),
            None => Url::parse(DEFAULT_NOMINATIM_URL).map_err(|e| CoreError::Config {
                message: format!("invalid geocoder URL: {e}"),
            }),
        }
    }
}

/// Configuration for one tracking-server session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Server base URL, e.g. `https://demo.traccar.org`.
    pub url: Url,
    pub auth: Auth,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Full device + position refresh interval (seconds). 0 = never.
    pub refresh_interval_secs: u64,
    /// Follow the push socket for live updates.
    pub socket_enabled: bool,
    pub status: StatusPolicy,
    pub geocoder: GeocoderSettings,
}

impl SessionConfig {
    pub fn new(url: Url, auth: Auth) -> Self {
        Self {
            url,
            auth,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            refresh_interval_secs: 60,
            socket_enabled: true,
            status: StatusPolicy::default(),
            geocoder: GeocoderSettings::default(),
        }
    }

    /// Transport settings shared by the tracking and geocoder clients.
    /// Session auth gets a cookie jar.
    pub fn transport(&self) -> TransportConfig {
        let transport = TransportConfig {
            tls: TlsMode::from(&self.tls),
            timeout: self.timeout,
            cookie_jar: None,
        };
        if matches!(self.auth, Auth::Session { .. }) {
            transport.with_cookie_jar()
        } else {
            transport
        }
    }

    pub fn credentials(&self) -> Credentials {
        self.auth.clone().into()
    }

    /// Reject settings the session cannot work with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !matches!(self.url.scheme(), "http" | "https") {
            return Err(CoreError::Config {
                message: format!("server URL must be http(s), got '{}'", self.url),
            });
        }
        if self.timeout.is_zero() {
            return Err(CoreError::Config {
                message: "timeout must be greater than zero".into(),
            });
        }
        Ok(())
    }
}
