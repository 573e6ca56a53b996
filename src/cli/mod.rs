//! CLI surface for idmap.
//!
//! Goal:
//! - Thin handlers over the store; one verb per module
//! - LLM-robust parsing (boolish flags, case/dash tolerance, aliases)

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand, builder::BoolishValueParser};

use crate::Result;
use crate::store::{IdentityStore, StoreError};

mod commands;
mod render;

// =============================================================================
// Entry + global options
// =============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "idmap",
    version,
    about = "Multi-channel identity resolver",
    infer_subcommands = true,
    infer_long_args = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Machine-readable JSON output (default: false; use `--json` for scripting).
    #[arg(
        long,
        global = true,
        default_value_t = false,
        num_args = 0..=1,
        value_parser = BoolishValueParser::new()
    )]
    pub json: bool,

    /// Workspace path (default: $IDMAP_WORKSPACE, then cwd).
    #[arg(long, global = true, value_name = "PATH")]
    pub workspace: Option<PathBuf>,

    /// Debug output (repeat for more).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize an empty identity map in the workspace.
    Init(InitArgs),

    /// Resolve a channel user to a canonical id.
    Resolve(ResolveArgs),

    /// Bind a channel user to a canonical identity.
    Add(AddArgs),

    /// Remove a channel binding.
    #[command(alias = "rm")]
    Remove(RemoveArgs),

    /// List all identities.
    #[command(alias = "ls")]
    List,

    /// Show the channel bindings of one identity.
    Channels(CanonicalArgs),

    /// Check whether an identity is the workspace owner.
    IsOwner(CanonicalArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing map.
    #[arg(
        long,
        default_value_t = false,
        num_args = 0..=1,
        value_parser = BoolishValueParser::new()
    )]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Channel name (or set IDMAP_CHANNEL).
    #[arg(long, value_name = "CHANNEL")]
    pub channel: Option<String>,

    /// Provider user id (or set IDMAP_USER_ID).
    #[arg(long, value_name = "USER_ID")]
    pub user_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Canonical user id.
    #[arg(long, value_name = "ID")]
    pub canonical: String,

    /// Channel name.
    #[arg(long, value_name = "CHANNEL")]
    pub channel: String,

    /// Provider user id.
    #[arg(long, value_name = "USER_ID")]
    pub user_id: String,

    /// Display name (applies when the identity is created).
    #[arg(long, value_name = "NAME")]
    pub display_name: Option<String>,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Canonical user id.
    #[arg(long, value_name = "ID")]
    pub canonical: String,

    /// Channel name.
    #[arg(long, value_name = "CHANNEL")]
    pub channel: String,

    /// Provider user id.
    #[arg(long, value_name = "USER_ID")]
    pub user_id: String,
}

#[derive(Args, Debug)]
pub struct CanonicalArgs {
    /// Canonical user id.
    #[arg(long, value_name = "ID")]
    pub canonical: String,
}

pub fn parse_from<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let raw: Vec<OsString> = args.into_iter().map(|t| t.into()).collect();
    Cli::parse_from(normalize_args(raw))
}

/// Run the CLI (used by bin).
pub fn run(cli: Cli) -> Result<()> {
    let ctx = Ctx {
        workspace: crate::paths::resolve_workspace(cli.workspace),
        json: cli.json,
    };

    match cli.command {
        Commands::Init(args) => commands::init::handle(&ctx, args),
        Commands::Resolve(args) => commands::resolve::handle(&ctx, args),
        Commands::Add(args) => commands::add::handle(&ctx, args),
        Commands::Remove(args) => commands::remove::handle(&ctx, args),
        Commands::List => commands::list::handle(&ctx),
        Commands::Channels(args) => commands::channels::handle(&ctx, args),
        Commands::IsOwner(args) => commands::is_owner::handle(&ctx, args),
    }
}

// =============================================================================
// Context + helpers
// =============================================================================

#[derive(Clone)]
struct Ctx {
    workspace: PathBuf,
    json: bool,
}

impl Ctx {
    fn store(&self) -> IdentityStore {
        IdentityStore::open(&self.workspace)
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| StoreError::io(Path::new("<stdout>"), e.into()))?;
    println!("{rendered}");
    Ok(())
}

fn normalize_args(mut raw: Vec<OsString>) -> Vec<OsString> {
    if raw.is_empty() {
        return raw;
    }

    let mut out = Vec::with_capacity(raw.len());
    out.push(raw.remove(0)); // program name

    for arg in raw {
        let s = arg.to_string_lossy();
        if s.starts_with("--") {
            let mut pieces = s.splitn(2, '=');
            let flag = pieces.next().unwrap_or("");
            let val = pieces.next();
            let mut canon = flag.to_lowercase().replace('_', "-");
            canon = canonical_flag(&canon).to_string();
            if let Some(v) = val {
                out.push(OsString::from(format!("{canon}={v}")));
            } else {
                out.push(OsString::from(canon));
            }
        } else {
            out.push(arg);
        }
    }
    out
}

fn canonical_flag(flag: &str) -> &str {
    match flag {
        "--userid" => "--user-id",
        "--displayname" => "--display-name",
        "--canonicalid" | "--canonical-id" => "--canonical",
        "--work-space" => "--workspace",
        other => other,
    }
}
