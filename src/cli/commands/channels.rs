use crate::Result;
use crate::api::ChannelsOutput;
use crate::core::CanonicalId;

use super::super::{CanonicalArgs, Ctx, print_json, render};

pub(crate) fn handle(ctx: &Ctx, args: CanonicalArgs) -> Result<()> {
    let channels = ctx.store().channels(&args.canonical)?;
    let id = CanonicalId::sanitize(&args.canonical)?;

    if ctx.json {
        return print_json(&ChannelsOutput {
            canonical_id: id,
            channels,
        });
    }
    print!("{}", render::render_channels(&id, &channels));
    Ok(())
}
