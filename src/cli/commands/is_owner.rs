use crate::Result;
use crate::api::IsOwnerOutput;
use crate::core::CanonicalId;

use super::super::{CanonicalArgs, Ctx, print_json};

pub(crate) fn handle(ctx: &Ctx, args: CanonicalArgs) -> Result<()> {
    let is_owner = ctx.store().is_owner(&args.canonical)?;
    let id = CanonicalId::sanitize(&args.canonical)?;

    if ctx.json {
        return print_json(&IsOwnerOutput {
            canonical_id: id,
            is_owner,
        });
    }
    println!("{}", if is_owner { "yes" } else { "no" });
    Ok(())
}
