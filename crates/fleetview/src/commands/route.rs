//! `route today <device>`: today's route overlay rendered off-screen.

use std::sync::Arc;

use chrono::Local;
use tabled::Tabled;

use fleetview_core::overlay::{TODAY_ENDPOINTS, TODAY_PATH, TODAY_STOPS};
use fleetview_core::{InMemorySurface, OverlayState, Session, SystemClock};

use crate::cli::{RouteArgs, RouteCommand};
use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Tabled)]
struct StopRow {
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
    #[tabled(rename = "Minutes")]
    minutes: i64,
    #[tabled(rename = "Position")]
    position: String,
}

pub async fn handle(session: &Session, args: RouteArgs, ctx: &Context<'_>) -> Result<(), CliError> {
    match args.command {
        RouteCommand::Today { device } => today(session, &device, ctx).await,
    }
}

async fn today(session: &Session, identifier: &str, ctx: &Context<'_>) -> Result<(), CliError> {
    let device = session.resolve_device(identifier)?;
    let surface = Arc::new(InMemorySurface::new());
    let overlay = session
        .today_route(surface.clone(), Arc::new(SystemClock))
        .await?;

    overlay.select(Some(device.id)).await;
    overlay.activate().await;

    let OverlayState::Active { positions, stops, .. } = overlay.state() else {
        return Err(CliError::ApiError {
            code: "route".into(),
            message: format!("today's route for '{}' could not be loaded", device.name),
        });
    };

    let geojson = surface.to_geojson();
    let out = output::render_single(
        &ctx.global.output,
        &geojson,
        |_| {
            let mut lines = vec![
                format!("{} (#{}): today", device.name, device.id),
                format!("Positions: {positions}"),
                format!("Stops:     {stops}"),
            ];
            if let Some(bounds) = overlay.bounds() {
                lines.push(format!(
                    "Bounds:    {:.5},{:.5} .. {:.5},{:.5}",
                    bounds.min_lat, bounds.min_lon, bounds.max_lat, bounds.max_lon
                ));
            }
            let stop_rows: Vec<StopRow> = overlay
                .stops()
                .iter()
                .map(|s| StopRow {
                    from: s.start_time.with_timezone(&Local).format("%H:%M").to_string(),
                    to: s.end_time.with_timezone(&Local).format("%H:%M").to_string(),
                    minutes: s.duration().num_minutes(),
                    position: format!("{:.5}, {:.5}", s.latitude, s.longitude),
                })
                .collect();
            if !stop_rows.is_empty() {
                lines.push(output::render_table(&stop_rows));
            }
            lines.join("\n")
        },
        |_| {
            [TODAY_ENDPOINTS, TODAY_PATH, TODAY_STOPS]
                .iter()
                .map(|name| {
                    let count = surface.source(name).map_or(0, |fc| fc.len());
                    format!("{name}\t{count}")
                })
                .collect::<Vec<_>>()
                .join("\n")
        },
    )?;
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}
