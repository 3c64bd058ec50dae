//! `status <device>`: the live status card.

use chrono::{DateTime, Utc};
use serde::Serialize;

use fleetview_core::indicators::{
    BatteryLevel, SpeedGauge, fuel_used_today, signal_bars, speed_gauge,
};
use fleetview_core::{DerivedStatus, DeviceId, ResolvedAddress, Session};

use crate::cli::StatusArgs;
use crate::error::CliError;
use crate::output;

use super::Context;
use super::util::{self, DeviceView};

/// Everything the status card shows for one device.
#[derive(Debug, Serialize)]
struct StatusCard {
    id: DeviceId,
    name: String,
    icon: String,
    #[serde(flatten)]
    live: DerivedStatus,
    fix_time: Option<DateTime<Utc>>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    address: Option<ResolvedAddress>,
    speed: SpeedGauge,
    battery_percent: Option<f64>,
    battery: Option<BatteryLevel>,
    signal_bars: Option<u8>,
    /// Litres.
    fuel_used_today: Option<f64>,
}

impl StatusCard {
    fn new(view: &DeviceView, address: Option<ResolvedAddress>, ctx: &Context<'_>) -> Self {
        let attrs = view.position.as_ref().map(|p| &p.attributes);
        let battery_percent = attrs.and_then(|a| a.battery_level);
        Self {
            id: view.device.id,
            name: view.device.name.clone(),
            icon: view.icon.clone(),
            live: view.live,
            fix_time: view.position.as_ref().map(|p| p.fix_time),
            latitude: view.position.as_ref().map(|p| p.latitude),
            longitude: view.position.as_ref().map(|p| p.longitude),
            address,
            speed: speed_gauge(
                view.live.effective_speed,
                ctx.speed_unit,
                view.device.attributes.speed_limit,
            ),
            battery_percent,
            battery: battery_percent.map(BatteryLevel::from_percent),
            signal_bars: attrs.and_then(|a| a.rssi).map(signal_bars),
            fuel_used_today: fuel_used_today(
                view.device.attributes.today_distance,
                view.device.attributes.fuel_consumption,
            ),
        }
    }
}

fn bars(count: u8) -> String {
    let filled = usize::from(count.min(4));
    format!("{}{}", "▮".repeat(filled), "▯".repeat(4 - filled))
}

fn detail(card: &StatusCard, ctx: &Context<'_>) -> String {
    let mut status = card.live.label().to_owned();
    if card.live.is_stale {
        status.push_str(" (stale)");
    }
    let mut lines = vec![
        format!("{} (#{})", card.name, card.id),
        format!("Status:   {}", output::paint(&status, card.live.color, ctx.color)),
        format!(
            "Speed:    {:.0} {} [{:.0}% {}]",
            card.speed.value,
            card.speed.unit.suffix(),
            card.speed.percent,
            card.speed.band
        ),
    ];
    match (card.latitude, card.longitude, card.fix_time) {
        (Some(lat), Some(lon), Some(at)) => {
            lines.push(format!("Position: {lat:.5}, {lon:.5}"));
            lines.push(format!("Fix time: {}", at.format("%Y-%m-%d %H:%M:%S UTC")));
        }
        _ => lines.push("Position: -".into()),
    }
    if let Some(ref address) = card.address {
        lines.push(format!("Address:  {}", address.text));
    }
    if let (Some(pct), Some(level)) = (card.battery_percent, card.battery) {
        lines.push(format!("Battery:  {pct:.0}% ({level})"));
    }
    if let Some(count) = card.signal_bars {
        lines.push(format!("Signal:   {}", bars(count)));
    }
    if let Some(litres) = card.fuel_used_today {
        lines.push(format!("Fuel:     {litres:.1} L today"));
    }
    lines.push(format!("Icon:     {}", card.icon));
    lines.join("\n")
}

pub async fn handle(session: &Session, args: StatusArgs, ctx: &Context<'_>) -> Result<(), CliError> {
    let view = util::resolve_view(session, &args.device, Utc::now())?;

    let address = match view.position {
        Some(ref p) if !args.no_address => {
            let resolver = session.address_resolver().await?;
            Some(
                resolver
                    .resolve(p.latitude, p.longitude, p.address.as_deref())
                    .await,
            )
        }
        _ => None,
    };

    let card = StatusCard::new(&view, address, ctx);
    let out = output::render_single(
        &ctx.global.output,
        &card,
        |c| detail(c, ctx),
        |c| c.live.label().to_owned(),
    )?;
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}
