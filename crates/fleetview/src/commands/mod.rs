//! Command dispatch: bridges CLI args -> session queries -> output formatting.

pub mod address;
pub mod config_cmd;
pub mod dashboard;
pub mod devices;
pub mod route;
pub mod status;
pub mod summary;
pub mod util;
pub mod watch;

use fleetview_core::Session;
use fleetview_core::indicators::SpeedUnit;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Per-invocation rendering settings shared by the handlers.
pub struct Context<'a> {
    pub global: &'a GlobalOpts,
    pub speed_unit: SpeedUnit,
    /// Colour table cells.
    pub color: bool,
}

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, session: &Session, ctx: &Context<'_>) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(session, args, ctx),
        Command::Status(args) => status::handle(session, args, ctx).await,
        Command::Route(args) => route::handle(session, args, ctx).await,
        Command::Address(args) => address::handle(session, args, ctx).await,
        Command::Dashboard => dashboard::handle(session, ctx).await,
        Command::Summary => summary::handle(session, ctx),
        Command::Watch(args) => watch::handle(session, args, ctx).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
