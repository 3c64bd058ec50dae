//! CLI configuration: a thin layer over `fleetview_config` that applies
//! `GlobalOpts` flag overrides (--server, --token, --insecure, ...).

use std::time::Duration;

use secrecy::SecretString;

use fleetview_config::parse_url;
use fleetview_core::indicators::SpeedUnit;
use fleetview_core::{Auth, SessionConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use fleetview_config::{
    Config, Profile, config_path, load_config_or_default, save_config, store_password, store_token,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref())
}

/// Comma-separated profile names for help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Build a `SessionConfig` from the config file, the active profile and
/// flag overrides. Without a matching profile, `--server` and `--token`
/// must carry everything.
pub fn build_session_config(global: &GlobalOpts, config: &Config) -> Result<SessionConfig, CliError> {
    let profile_name = active_profile_name(global, config);

    if let Some(profile) = config.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, global, config);
    }

    let Some(server) = global.server.as_deref() else {
        if global.profile.is_some() {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(config),
            });
        }
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    };

    let url = parse_url("server", server)?;
    let Some(token) = global.token.clone() else {
        return Err(CliError::NoCredentials {
            profile: profile_name,
        });
    };

    let mut session = SessionConfig::new(url, Auth::Token(SecretString::from(token)));
    session.tls = if global.insecure || config.defaults.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        TlsVerification::SystemDefaults
    };
    session.timeout = Duration::from_secs(global.timeout.unwrap_or(config.defaults.timeout));
    apply_settings(&mut session, config)?;
    Ok(session)
}

/// Translate a `Profile` plus global flags into a `SessionConfig`.
/// Flag overrides take priority over profile values.
fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
    config: &Config,
) -> Result<SessionConfig, CliError> {
    let url = parse_url("server", global.server.as_deref().unwrap_or(&profile.server))?;

    let auth = match global.token {
        Some(ref token) => Auth::Token(SecretString::from(token.clone())),
        None => fleetview_config::resolve_auth(profile, profile_name)?,
    };

    let mut session = SessionConfig::new(url, auth);
    session.tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        fleetview_config::tls_for(profile, &config.defaults)
    };
    session.timeout = Duration::from_secs(
        global
            .timeout
            .or(profile.timeout)
            .unwrap_or(config.defaults.timeout),
    );
    apply_settings(&mut session, config)?;
    Ok(session)
}

fn apply_settings(session: &mut SessionConfig, config: &Config) -> Result<(), CliError> {
    session.status = config.status.policy();
    session.geocoder = config.geocoder.settings()?;
    Ok(())
}

/// Display speed unit: flag first, then `[display] speed_unit`.
pub fn speed_unit(global: &GlobalOpts, config: &Config) -> Result<SpeedUnit, CliError> {
    match global.speed_unit.as_deref() {
        Some(raw) => raw.parse().map_err(|_| CliError::Validation {
            field: "speed-unit".into(),
            reason: format!("expected kmh, mph or kn, got '{raw}'"),
        }),
        None => Ok(config.display.speed_unit),
    }
}
