//! Identity atoms.
//!
//! CanonicalId: the key one human is known by across every channel.
//! ChannelKey: one "{channel}:{provider_user_id}" binding.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{CoreError, InvalidId};

/// Longest canonical id we will persist.
pub const MAX_CANONICAL_LEN: usize = 64;

fn is_canonical_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_'
}

/// Canonical identity key.
///
/// Always lowercase `[a-z0-9-_]`, 1..=64 chars, never starting or ending
/// with `-`/`_`. The allowed set contains no separators or dots, so a
/// canonical id can never escape a directory when callers interpolate it
/// into file paths.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalId(String);

impl CanonicalId {
    /// Normalize arbitrary input into a canonical id.
    ///
    /// Lowercases, drops every character outside the allowed set (no
    /// substitution), trims `-`/`_` from the ends and caps the length.
    /// Input that normalizes to nothing is rejected.
    pub fn sanitize(raw: &str) -> Result<Self, CoreError> {
        let cleaned: String = raw
            .to_lowercase()
            .chars()
            .filter(|&c| is_canonical_char(c))
            .collect();
        let mut cleaned = cleaned.trim_matches(['-', '_']);
        if cleaned.len() > MAX_CANONICAL_LEN {
            // Truncation can expose a trailing '-'/'_'; re-trim so the
            // output always satisfies `parse`.
            cleaned = cleaned[..MAX_CANONICAL_LEN].trim_end_matches(['-', '_']);
        }
        if cleaned.is_empty() {
            return Err(InvalidId::Canonical {
                raw: raw.to_string(),
                reason: "nothing left after sanitization".into(),
            }
            .into());
        }
        Ok(Self(cleaned.to_string()))
    }

    /// Strict parser for data read back from disk.
    ///
    /// Accepts exactly what [`CanonicalId::sanitize`] can produce.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let err = |reason: &str| InvalidId::Canonical {
            raw: s.to_string(),
            reason: reason.into(),
        };
        if s.is_empty() {
            return Err(err("empty").into());
        }
        if s.len() > MAX_CANONICAL_LEN {
            return Err(err("longer than 64 characters").into());
        }
        if !s.chars().all(is_canonical_char) {
            return Err(err("contains characters outside [a-z0-9-_]").into());
        }
        if s.starts_with(['-', '_']) || s.ends_with(['-', '_']) {
            return Err(err("starts or ends with '-' or '_'").into());
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Default display form for new identities: first letter uppercased.
    pub fn capitalized(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl fmt::Debug for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanonicalId({:?})", self.0)
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One channel-scoped user binding, stored as `"{channel}:{user_id}"`.
///
/// The channel half is any non-empty colon-free label ("telegram",
/// "whatsapp", ...); no fixed set is enforced. The user-id half is the
/// provider's identifier verbatim and may itself contain colons.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelKey(String);

impl ChannelKey {
    pub fn new(channel: &str, user_id: &str) -> Result<Self, CoreError> {
        let err = |reason: &str| InvalidId::Channel {
            raw: format!("{channel}:{user_id}"),
            reason: reason.into(),
        };
        if channel.is_empty() {
            return Err(err("empty channel").into());
        }
        if channel.contains(':') {
            return Err(err("channel contains ':'").into());
        }
        if user_id.is_empty() {
            return Err(err("empty user id").into());
        }
        Ok(Self(format!("{channel}:{user_id}")))
    }

    /// Re-validate a stored key.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.split_once(':') {
            Some((channel, user_id)) => Self::new(channel, user_id),
            None => Err(InvalidId::Channel {
                raw: s.to_string(),
                reason: "missing ':' separator".into(),
            }
            .into()),
        }
    }

    pub fn channel(&self) -> &str {
        self.0.split_once(':').map(|(c, _)| c).unwrap_or(&self.0)
    }

    pub fn user_id(&self) -> &str {
        self.0.split_once(':').map(|(_, u)| u).unwrap_or("")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelKey({:?})", self.0)
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
