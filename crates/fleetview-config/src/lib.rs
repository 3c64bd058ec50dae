//! Shared configuration for fleetview.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext) and
//! translation to `fleetview_core::SessionConfig`. The CLI layers its
//! flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use fleetview_core::indicators::SpeedUnit;
use fleetview_core::{Auth, GeocoderSettings, SessionConfig, StatusPolicy, TlsVerification};

/// Keyring service name; entries are `<profile>/token` and `<profile>/password`.
pub const KEYRING_SERVICE: &str = "fleetview";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found in config")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is given on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub status: StatusSettings,

    #[serde(default)]
    pub geocoder: GeocoderConfig,

    #[serde(default)]
    pub display: DisplaySettings,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            status: StatusSettings::default(),
            geocoder: GeocoderConfig::default(),
            display: DisplaySettings::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// `[status]`: status derivation tunables.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusSettings {
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: u64,

    #[serde(default = "default_true")]
    pub infer_motion_from_speed: bool,
}

impl Default for StatusSettings {
    fn default() -> Self {
        Self {
            stale_after_secs: default_stale_after(),
            infer_motion_from_speed: true,
        }
    }
}

impl StatusSettings {
    pub fn policy(&self) -> StatusPolicy {
        StatusPolicy {
            stale_after: Duration::from_secs(self.stale_after_secs),
            infer_motion_from_speed: self.infer_motion_from_speed,
        }
    }
}

fn default_stale_after() -> u64 {
    120
}
fn default_true() -> bool {
    true
}

/// `[geocoder]`: external reverse geocoder.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeocoderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Nominatim-compatible base URL; unset means the public instance.
    pub url: Option<String>,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
        }
    }
}

impl GeocoderConfig {
    pub fn settings(&self) -> Result<GeocoderSettings, ConfigError> {
        let url = self
            .url
            .as_deref()
            .map(|raw| parse_url("geocoder.url", raw))
            .transpose()?;
        Ok(GeocoderSettings {
            enabled: self.enabled,
            url,
        })
    }
}

/// `[display]`: presentation preferences.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DisplaySettings {
    #[serde(default)]
    pub speed_unit: SpeedUnit,
}

/// A named tracking-server profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Server base URL (e.g. "https://demo.traccar.org").
    pub server: String,

    /// Auth mode: "token" or "session".
    #[serde(default = "default_auth_mode")]
    pub auth_mode: String,

    /// API token (plaintext; prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable holding the API token.
    pub token_env: Option<String>,

    /// Login email for session auth.
    pub email: Option<String>,

    /// Password for session auth (plaintext; prefer keyring).
    pub password: Option<String>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            server: String::new(),
            auth_mode: default_auth_mode(),
            token: None,
            token_env: None,
            email: None,
            password: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
        }
    }
}

fn default_auth_mode() -> String {
    "token".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "fleetview", "fleetview").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("fleetview");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then the TOML file at `path`, then `FLEETVIEW_*` env vars
/// (`__` separates sections, e.g. `FLEETVIEW_STATUS__STALE_AFTER_SECS`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FLEETVIEW_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load config, returning a default if the file is missing or broken.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to the canonical path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profiles ────────────────────────────────────────────────────────

impl Config {
    /// Name of the profile to use: the explicit one, else the default.
    pub fn profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve an API token: env var named by `token_env`, then the system
/// keyring, then plaintext in the profile.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_token_with(profile, profile_name, |name| std::env::var(name).ok(), keyring_get)
}

fn resolve_token_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    if let Some(value) = profile.token_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(value));
    }

    if let Some(secret) = keyring(&format!("{profile_name}/token")) {
        return Ok(SecretString::from(secret));
    }

    if let Some(ref token) = profile.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve session credentials (email + password).
///
/// Email comes from the profile or `FLEETVIEW_EMAIL`; the password from
/// `FLEETVIEW_PASSWORD`, then the keyring, then plaintext.
pub fn resolve_session_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    resolve_session_with(profile, profile_name, |name| std::env::var(name).ok(), keyring_get)
}

fn resolve_session_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<(String, SecretString), ConfigError> {
    let email = profile
        .email
        .clone()
        .or_else(|| env("FLEETVIEW_EMAIL"))
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;

    if let Some(pw) = env("FLEETVIEW_PASSWORD") {
        return Ok((email, SecretString::from(pw)));
    }

    if let Some(pw) = keyring(&format!("{profile_name}/password")) {
        return Ok((email, SecretString::from(pw)));
    }

    if let Some(ref pw) = profile.password {
        return Ok((email, SecretString::from(pw.clone())));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

fn keyring_get(account: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, account)
        .and_then(|entry| entry.get_password())
        .ok()
}

/// Store a profile's API token in the system keyring.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/token"))?;
    entry.set_password(token)?;
    Ok(())
}

/// Store a profile's session password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))?;
    entry.set_password(password)?;
    Ok(())
}

/// Resolve `Auth` from a profile's `auth_mode` field.
pub fn resolve_auth(profile: &Profile, profile_name: &str) -> Result<Auth, ConfigError> {
    match profile.auth_mode.as_str() {
        "token" => Ok(Auth::Token(resolve_token(profile, profile_name)?)),
        "session" => {
            let (email, password) = resolve_session_credentials(profile, profile_name)?;
            Ok(Auth::Session { email, password })
        }
        other => Err(ConfigError::Validation {
            field: "auth_mode".into(),
            reason: format!("expected 'token' or 'session', got '{other}'"),
        }),
    }
}

// ── Translation to core ─────────────────────────────────────────────

pub fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// TLS mode for a profile: insecure wins, then a custom CA, then the
/// system store.
pub fn tls_for(profile: &Profile, defaults: &Defaults) -> TlsVerification {
    if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Build a `SessionConfig` from a profile, with no CLI flag overrides.
///
/// Long-running defaults: push socket on, refresh every 60s.
pub fn profile_to_session_config(
    config: &Config,
    profile: &Profile,
    profile_name: &str,
) -> Result<SessionConfig, ConfigError> {
    let url = parse_url("server", &profile.server)?;
    let auth = resolve_auth(profile, profile_name)?;

    let mut session = SessionConfig::new(url, auth);
    session.tls = tls_for(profile, &config.defaults);
    session.timeout = Duration::from_secs(profile.timeout.unwrap_or(config.defaults.timeout));
    session.status = config.status.policy();
    session.geocoder = config.geocoder.settings()?;
    Ok(session)
}
