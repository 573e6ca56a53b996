use crate::api::InitOutput;
use crate::{Result, owner};

use super::super::{Ctx, InitArgs, print_json};

pub(crate) fn handle(ctx: &Ctx, args: InitArgs) -> Result<()> {
    let path = ctx.store().init(args.force)?;

    if ctx.json {
        return print_json(&InitOutput {
            status: "initialized",
            path: path.display().to_string(),
        });
    }

    println!("✓ Initialized identity map at {}", path.display());

    // Advisory: tell the user what the profile will register them as.
    let profile = owner::load(&ctx.workspace).unwrap_or_default();
    if profile.name.is_some() {
        println!("✓ Owner canonical ID: {}", profile.canonical_id());
        println!("✓ Owner will auto-register on first use");
    }
    Ok(())
}
