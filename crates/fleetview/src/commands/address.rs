//! `address <lat> <lon>`: reverse geocoding through the fallback chain.

use fleetview_core::{AddressSource, Session};

use crate::cli::AddressArgs;
use crate::error::CliError;
use crate::output;

use super::Context;

fn source_label(source: AddressSource) -> &'static str {
    match source {
        AddressSource::Original => "recorded with the fix",
        AddressSource::Disabled => "geocoding disabled on server",
        AddressSource::External => "external geocoder",
        AddressSource::Server => "server geocoder",
        AddressSource::Unknown => "no geocoder answered",
    }
}

pub async fn handle(session: &Session, args: AddressArgs, ctx: &Context<'_>) -> Result<(), CliError> {
    let resolver = session.address_resolver().await?;
    let resolved = resolver
        .resolve(args.latitude, args.longitude, args.original.as_deref())
        .await;

    let out = output::render_single(
        &ctx.global.output,
        &resolved,
        |r| format!("{}\nSource: {}", r.text, source_label(r.source)),
        |r| r.text.clone(),
    )?;
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}
