use crate::Result;
use crate::api::BindingOutput;
use crate::core::ChannelKey;

use super::super::{AddArgs, Ctx, print_json};

pub(crate) fn handle(ctx: &Ctx, args: AddArgs) -> Result<()> {
    let id = ctx.store().add_channel(
        &args.canonical,
        &args.channel,
        &args.user_id,
        args.display_name.as_deref(),
    )?;
    let key = ChannelKey::new(&args.channel, &args.user_id)?;

    if ctx.json {
        return print_json(&BindingOutput {
            status: "added",
            canonical_id: id,
            channel: key,
        });
    }
    println!("✓ Added {key} → {id}");
    Ok(())
}
