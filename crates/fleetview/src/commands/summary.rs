//! `summary`: fleet status counts derived locally from the store.

use chrono::Utc;

use fleetview_core::{Session, StatusColor};

use crate::error::CliError;
use crate::output;

use super::Context;

pub fn handle(session: &Session, ctx: &Context<'_>) -> Result<(), CliError> {
    let summary = session.summary(Utc::now());
    let out = output::render_single(
        &ctx.global.output,
        &summary,
        |s| {
            let count = |n: usize, color| output::paint(&n.to_string(), color, ctx.color);
            [
                format!("Total:     {}", s.total),
                format!("Moving:    {}", count(s.moving, StatusColor::Info)),
                format!("Engine on: {}", count(s.engine_on, StatusColor::Success)),
                format!("Stopped:   {}", count(s.stopped, StatusColor::Warning)),
                format!("Offline:   {}", count(s.offline, StatusColor::Neutral)),
                format!("Stale:     {}", s.stale),
            ]
            .join("\n")
        },
        |s| s.total.to_string(),
    )?;
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}
