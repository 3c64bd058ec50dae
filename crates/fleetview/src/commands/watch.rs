//! `watch`: redraw the fleet table from the live store on a fixed interval.

use std::io::{self, IsTerminal, Write};

use chrono::{Local, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use fleetview_core::{ConnectionState, Session, SessionConfig};

use crate::cli::{OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::Context;
use super::devices::DeviceRow;
use super::util;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Live sessions follow the push socket; `--no-socket` polls instead.
pub fn tune(config: &mut SessionConfig, args: &WatchArgs) {
    if args.no_socket {
        config.socket_enabled = false;
        config.refresh_interval_secs = args.interval.as_secs().max(1);
    }
}

pub async fn handle(session: &Session, args: WatchArgs, ctx: &Context<'_>) -> Result<(), CliError> {
    let clear = matches!(ctx.global.output, OutputFormat::Table) && io::stdout().is_terminal();
    let mut interval = tokio::time::interval(args.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut connection = session.connection_state();
    let mut rendered: u32 = 0;

    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            Ok(()) = connection.changed() => {
                let state = *connection.borrow_and_update();
                if state != ConnectionState::Connected {
                    warn!(?state, "connection state changed");
                }
            }
            _ = interval.tick() => {
                render(session, ctx, clear)?;
                rendered += 1;
                if args.count.is_some_and(|n| rendered >= n) {
                    break;
                }
            }
        }
    }
    Ok(())
}

fn render(session: &Session, ctx: &Context<'_>, clear: bool) -> Result<(), CliError> {
    let now = Utc::now();
    let views = util::device_views(session, now);
    let body = output::render_list(
        &ctx.global.output,
        &views,
        |v| DeviceRow::new(v, ctx, now),
        |v| format!("{}\t{}", v.device.id, v.live.label()),
    )?;

    if ctx.global.quiet {
        return Ok(());
    }
    let mut stdout = io::stdout().lock();
    if clear {
        let summary = session.summary(now);
        write!(stdout, "{CLEAR_SCREEN}")?;
        writeln!(
            stdout,
            "{} devices: {} moving, {} engine on, {} stopped, {} offline  (updated {})",
            summary.total,
            summary.moving,
            summary.engine_on,
            summary.stopped,
            summary.offline,
            now.with_timezone(&Local).format("%H:%M:%S"),
        )?;
    }
    writeln!(stdout, "{body}")?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;
    use url::Url;

    use fleetview_core::Auth;

    use super::*;

    fn session_config() -> SessionConfig {
        SessionConfig::new(
            Url::parse("https://track.example.com").unwrap(),
            Auth::Token(SecretString::from("t".to_string())),
        )
    }

    #[test]
    fn polling_mode_replaces_the_socket() {
        let mut config = session_config();
        let args = WatchArgs {
            interval: Duration::from_secs(10),
            no_socket: true,
            count: None,
        };
        tune(&mut config, &args);
        assert!(!config.socket_enabled);
        assert_eq!(config.refresh_interval_secs, 10);
    }

    #[test]
    fn socket_mode_keeps_defaults() {
        let mut config = session_config();
        let args = WatchArgs {
            interval: Duration::from_millis(500),
            no_socket: false,
            count: Some(1),
        };
        tune(&mut config, &args);
        assert!(config.socket_enabled);
        assert_eq!(config.refresh_interval_secs, 60);
    }
}
