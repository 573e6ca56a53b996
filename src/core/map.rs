//! The persisted identity map document.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::identity::{CanonicalId, ChannelKey};
use super::time::rfc3339_compat;

/// Schema version written into new maps. Loaded versions are preserved
/// verbatim on rewrite.
pub const MAP_VERSION: &str = "1.0";

/// One canonical identity and its channel bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub canonical_id: CanonicalId,
    pub is_owner: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub channels: Vec<ChannelKey>,
    #[serde(with = "rfc3339_compat")]
    pub created_at: OffsetDateTime,
    #[serde(with = "rfc3339_compat")]
    pub updated_at: OffsetDateTime,
}

impl Identity {
    /// Fresh identity with no bindings. An absent or empty display name
    /// defaults to the capitalized canonical id.
    pub(crate) fn new(
        canonical_id: CanonicalId,
        display_name: Option<String>,
        is_owner: bool,
        now: OffsetDateTime,
    ) -> Self {
        let display_name = display_name
            .filter(|n| !n.is_empty())
            .or_else(|| Some(canonical_id.capitalized()));
        Self {
            canonical_id,
            is_owner,
            display_name,
            channels: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_channel(&self, key: &ChannelKey) -> bool {
        self.channels.iter().any(|k| k == key)
    }

    /// Append `key` unless already bound. Returns whether anything changed.
    pub(crate) fn add_channel(&mut self, key: ChannelKey, now: OffsetDateTime) -> bool {
        if self.has_channel(&key) {
            return false;
        }
        self.channels.push(key);
        self.updated_at = now;
        true
    }

    /// Drop `key` if bound. Returns whether anything changed.
    pub(crate) fn remove_channel(&mut self, key: &ChannelKey, now: OffsetDateTime) -> bool {
        let before = self.channels.len();
        self.channels.retain(|k| k != key);
        if self.channels.len() == before {
            return false;
        }
        self.updated_at = now;
        true
    }
}

/// The whole on-disk document.
///
/// `identities` is a BTreeMap so iteration, and therefore first-match
/// channel resolution, is deterministic in canonical-id order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityMap {
    pub version: String,
    pub identities: BTreeMap<CanonicalId, Identity>,
}

impl IdentityMap {
    pub fn empty() -> Self {
        Self {
            version: MAP_VERSION.to_string(),
            identities: BTreeMap::new(),
        }
    }

    /// First identity (in canonical-id order) holding `key`.
    pub fn find_channel(&self, key: &ChannelKey) -> Option<&CanonicalId> {
        self.identities
            .values()
            .find(|identity| identity.has_channel(key))
            .map(|identity| &identity.canonical_id)
    }

    /// The identity flagged as owner, if any. With several flagged (a
    /// hand-edited map), the first in id order wins, deterministically.
    pub fn owner(&self) -> Option<&Identity> {
        self.identities.values().find(|identity| identity.is_owner)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Structural checks beyond what serde enforces: keys must parse as
    /// canonical ids and match the embedded `canonical_id`; channel keys
    /// must parse; no identity may bind the same key twice.
    pub(crate) fn validate(&self) -> Result<(), String> {
        for (key, identity) in &self.identities {
            CanonicalId::parse(key.as_str()).map_err(|e| e.to_string())?;
            if *key != identity.canonical_id {
                return Err(format!(
                    "identity key `{key}` does not match record canonical_id `{}`",
                    identity.canonical_id
                ));
            }
            let mut seen = BTreeSet::new();
            for channel in &identity.channels {
                ChannelKey::parse(channel.as_str()).map_err(|e| e.to_string())?;
                if !seen.insert(channel.as_str()) {
                    return Err(format!("identity `{key}` binds `{channel}` twice"));
                }
            }
        }
        Ok(())
    }
}
