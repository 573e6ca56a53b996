use crate::Result;
use crate::api::ResolveOutput;
use crate::core::MissingArgument;

use super::super::{Ctx, ResolveArgs, print_json};

pub(crate) const CHANNEL_ENV: &str = "IDMAP_CHANNEL";
pub(crate) const USER_ID_ENV: &str = "IDMAP_USER_ID";

pub(crate) fn handle(ctx: &Ctx, args: ResolveArgs) -> Result<()> {
    let channel = flag_or_env(args.channel, "--channel", CHANNEL_ENV, "channel")?;
    let user_id = flag_or_env(args.user_id, "--user-id", USER_ID_ENV, "provider user id")?;

    let resolution = ctx.store().resolve(&channel, &user_id)?;

    if ctx.json {
        return print_json(&ResolveOutput {
            canonical_id: resolution.to_string(),
        });
    }
    println!("{resolution}");
    Ok(())
}

fn flag_or_env(
    flag_value: Option<String>,
    flag: &'static str,
    env: &'static str,
    what: &'static str,
) -> Result<String> {
    if let Some(v) = flag_value.filter(|v| !v.is_empty()) {
        return Ok(v);
    }
    match std::env::var(env) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(MissingArgument { what, flag, env }.into()),
    }
}
