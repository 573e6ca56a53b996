//! Output schemas for `--json` mode.
//!
//! Stable shapes for scripting against the CLI; human rendering lives in
//! `cli::render`. The `list` command serializes the identities map from
//! [`crate::core::IdentityMap`] directly and needs no schema here.

use serde::Serialize;

use crate::core::{CanonicalId, ChannelKey};

/// `resolve` output. The id may be a stranger fallback, so it is a plain
/// string rather than a [`CanonicalId`].
#[derive(Debug, Clone, Serialize)]
pub struct ResolveOutput {
    pub canonical_id: String,
}

/// `add` / `remove` output.
#[derive(Debug, Clone, Serialize)]
pub struct BindingOutput {
    pub status: &'static str,
    pub canonical_id: CanonicalId,
    pub channel: ChannelKey,
}

/// `channels` output.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelsOutput {
    pub canonical_id: CanonicalId,
    pub channels: Vec<ChannelKey>,
}

/// `is-owner` output.
#[derive(Debug, Clone, Serialize)]
pub struct IsOwnerOutput {
    pub canonical_id: CanonicalId,
    pub is_owner: bool,
}

/// `init` output.
#[derive(Debug, Clone, Serialize)]
pub struct InitOutput {
    pub status: &'static str,
    pub path: String,
}
