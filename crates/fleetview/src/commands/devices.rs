//! Device command handlers.

use chrono::Utc;
use tabled::Tabled;

use fleetview_core::DisplayStatus;

use crate::cli::{DevicesArgs, DevicesCommand, StatusFilter};
use crate::error::CliError;
use crate::output;

use super::Context;
use super::util::{self, DeviceView};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Seen")]
    seen: String,
    #[tabled(rename = "Speed")]
    speed: String,
    #[tabled(rename = "Last Fix")]
    last_fix: String,
    #[tabled(rename = "Icon")]
    icon: String,
}

impl DeviceRow {
    pub(crate) fn new(view: &DeviceView, ctx: &Context<'_>, now: chrono::DateTime<Utc>) -> Self {
        let mut status = view.live.label().to_owned();
        if view.live.is_stale {
            status.push_str(" (stale)");
        }
        Self {
            id: view.device.id.to_string(),
            name: view.device.name.clone(),
            status: output::paint(&status, view.live.color, ctx.color),
            seen: output::paint(&view.row.text, view.row.color, ctx.color),
            speed: if view.live.effective_motion {
                ctx.speed_unit.format(view.live.effective_speed)
            } else {
                "-".into()
            },
            last_fix: view.fix_age(now),
            icon: view.icon.clone(),
        }
    }
}

fn matches_filter(view: &DeviceView, filter: Option<StatusFilter>) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    let wanted = match filter {
        StatusFilter::Moving => DisplayStatus::Moving,
        StatusFilter::EngineOn => DisplayStatus::EngineOn,
        StatusFilter::Stopped => DisplayStatus::Stopped,
        StatusFilter::Offline => DisplayStatus::Offline,
    };
    view.live.status == wanted
}

fn detail(view: &DeviceView, ctx: &Context<'_>) -> String {
    let d = &view.device;
    let mut lines = vec![
        format!("ID:        {}", d.id),
        format!("Name:      {}", d.name),
        format!("Unique ID: {}", d.unique_id),
        format!("Status:    {}", output::paint(view.live.label(), view.live.color, ctx.color)),
        format!("Server:    {}", output::paint(&view.row.text, view.row.color, ctx.color)),
        format!("Category:  {} (icon: {})", util::or_dash(d.category.as_deref()), view.icon),
        format!("Model:     {}", util::or_dash(d.model.as_deref())),
        format!("Phone:     {}", util::or_dash(d.phone.as_deref())),
        format!("Contact:   {}", util::or_dash(d.contact.as_deref())),
    ];
    if d.disabled {
        lines.push("Disabled:  yes".into());
    }
    if let Some(ref p) = view.position {
        lines.push(format!(
            "Last fix:  {} ({:.5}, {:.5})",
            p.fix_time.format("%Y-%m-%d %H:%M:%S UTC"),
            p.latitude,
            p.longitude
        ));
        lines.push(format!("Speed:     {}", ctx.speed_unit.format(view.live.effective_speed)));
    } else {
        lines.push("Last fix:  -".into());
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(
    session: &fleetview_core::Session,
    args: DevicesArgs,
    ctx: &Context<'_>,
) -> Result<(), CliError> {
    let now = Utc::now();
    match args.command {
        DevicesCommand::List { status } => {
            let views: Vec<DeviceView> = util::device_views(session, now)
                .into_iter()
                .filter(|v| matches_filter(v, status))
                .collect();
            let out = output::render_list(
                &ctx.global.output,
                &views,
                |v| DeviceRow::new(v, ctx, now),
                |v| v.device.id.to_string(),
            )?;
            output::print_output(&out, ctx.global.quiet);
            Ok(())
        }

        DevicesCommand::Get { device } => {
            let view = util::resolve_view(session, &device, now)?;
            let out = output::render_single(
                &ctx.global.output,
                &view,
                |v| detail(v, ctx),
                |v| v.device.id.to_string(),
            )?;
            output::print_output(&out, ctx.global.quiet);
            Ok(())
        }
    }
}
