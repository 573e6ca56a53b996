use crate::Result;
use crate::api::BindingOutput;
use crate::core::{CanonicalId, ChannelKey};

use super::super::{Ctx, RemoveArgs, print_json};

pub(crate) fn handle(ctx: &Ctx, args: RemoveArgs) -> Result<()> {
    let removed = ctx
        .store()
        .remove_channel(&args.canonical, &args.channel, &args.user_id)?;
    let id = CanonicalId::sanitize(&args.canonical)?;
    let key = ChannelKey::new(&args.channel, &args.user_id)?;

    if ctx.json {
        return print_json(&BindingOutput {
            status: if removed { "removed" } else { "absent" },
            canonical_id: id,
            channel: key,
        });
    }

    if removed {
        println!("✓ Removed {key} from {id}");
    } else {
        println!("No binding {key} under {id}");
    }
    Ok(())
}
