//! Human-readable rendering for CLI output.

use crate::core::map::IdentityMap;
use crate::core::{CanonicalId, ChannelKey};

/// Multi-line listing of every identity, `[OWNER]`-badged, channels
/// sorted for stable output.
pub(crate) fn render_identities(map: &IdentityMap) -> String {
    if map.is_empty() {
        return "No identities registered\n".to_string();
    }
    let mut out = String::new();
    for (id, identity) in &map.identities {
        let badge = if identity.is_owner { " [OWNER]" } else { "" };
        out.push_str(&format!("{id}{badge}\n"));
        if let Some(name) = identity.display_name.as_deref()
            && !name.is_empty()
        {
            out.push_str(&format!("  Display Name: {name}\n"));
        }
        if !identity.channels.is_empty() {
            out.push_str("  Channels:\n");
            for key in sorted(&identity.channels) {
                out.push_str(&format!("    - {key}\n"));
            }
        }
        out.push('\n');
    }
    out
}

/// One channel key per line, sorted, or a friendly empty notice.
pub(crate) fn render_channels(id: &CanonicalId, channels: &[ChannelKey]) -> String {
    if channels.is_empty() {
        return format!("No channels registered for {id}\n");
    }
    let mut out = String::new();
    for key in sorted(channels) {
        out.push_str(&format!("{key}\n"));
    }
    out
}

fn sorted(channels: &[ChannelKey]) -> Vec<&ChannelKey> {
    let mut keys: Vec<&ChannelKey> = channels.iter().collect();
    keys.sort();
    keys
}
