use crate::Result;

use super::super::{Ctx, print_json, render};

pub(crate) fn handle(ctx: &Ctx) -> Result<()> {
    let map = ctx.store().list_identities()?;

    if ctx.json {
        return print_json(&map.identities);
    }
    print!("{}", render::render_identities(&map));
    Ok(())
}
