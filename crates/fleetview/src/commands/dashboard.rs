//! `dashboard`: server-side fleet counters.

use fleetview_core::Session;

use crate::error::CliError;
use crate::output;

use super::Context;

pub async fn handle(session: &Session, ctx: &Context<'_>) -> Result<(), CliError> {
    let stats = session.dashboard().await?;
    let out = output::render_single(
        &ctx.global.output,
        &stats,
        |s| {
            [
                format!("Vehicles:  {}", s.vehicles),
                format!("Running:   {}", s.running),
                format!("Stopped:   {}", s.stopped),
                format!("Overspeed: {}", s.overspeed),
                format!("Users:     {}", s.users),
                format!("Managers:  {}", s.managers),
            ]
            .join("\n")
        },
        |s| s.vehicles.to_string(),
    )?;
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}
