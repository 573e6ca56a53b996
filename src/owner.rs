//! Owner profile: contact numbers and name from the workspace USER.md.
//!
//! The profile feeds lazy owner auto-registration in the store: when an
//! unmapped user id matches one of these numbers, that contact is the
//! workspace owner reaching out from a new channel. A missing profile
//! simply means no contact ever auto-registers.

use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::CanonicalId;

/// Profile document name, relative to the workspace root.
pub const PROFILE_FILE: &str = "USER.md";

/// Canonical id used when the profile has no usable name.
const FALLBACK_ID: &str = "owner";

/// Line markers that introduce contact identifiers.
const CONTACT_MARKERS: [&str; 6] = [
    "Contact", "WhatsApp", "Telegram", "Phone", "Mobile", "Other",
];

/// Phone-number-shaped identifier: optional `+`, at least seven digits.
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\d{7,}").expect("static pattern"));

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*Name:\*\*\s*(.+)").expect("static pattern"));

/// Parsed owner profile.
#[derive(Debug, Clone, Default)]
pub struct OwnerProfile {
    /// Deduplicated contact identifiers.
    pub numbers: BTreeSet<String>,
    /// First token of the `**Name:**` line, if any.
    pub name: Option<String>,
}

impl OwnerProfile {
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.numbers.contains(user_id)
    }

    /// Canonical id the owner registers under: the sanitized first name,
    /// or `"owner"` when the profile has none (or it sanitizes away).
    pub fn canonical_id(&self) -> CanonicalId {
        self.name
            .as_deref()
            .and_then(|name| CanonicalId::sanitize(name).ok())
            .unwrap_or_else(|| CanonicalId::sanitize(FALLBACK_ID).expect("fallback id is valid"))
    }
}

/// Load the profile for `workspace`. A missing file yields an empty
/// profile; other read failures propagate.
pub fn load(workspace: &Path) -> io::Result<OwnerProfile> {
    let path = workspace.join(PROFILE_FILE);
    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let profile = parse(&content);
            tracing::debug!(
                numbers = profile.numbers.len(),
                named = profile.name.is_some(),
                "loaded owner profile"
            );
            Ok(profile)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(OwnerProfile::default()),
        Err(e) => Err(e),
    }
}

fn parse(content: &str) -> OwnerProfile {
    let mut numbers = BTreeSet::new();
    for line in content.lines() {
        if !CONTACT_MARKERS.iter().any(|marker| line.contains(marker)) {
            continue;
        }
        for m in NUMBER_RE.find_iter(line) {
            numbers.insert(m.as_str().to_string());
        }
    }
    let name = NAME_RE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().split_whitespace().next())
        .map(str::to_string);
    OwnerProfile { numbers, name }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PROFILE: &str = "\
# User Profile

**Name:** Test User

## Contact Information
- WhatsApp: +1234567890
- Telegram ID: 123456789
- Other: +9876543210, +5555555555
";

    #[test]
    fn parse_collects_numbers_from_marked_lines() {
        let profile = parse(PROFILE);
        for n in ["+1234567890", "123456789", "+9876543210", "+5555555555"] {
            assert!(profile.contains(n), "missing {n}");
        }
        assert_eq!(profile.numbers.len(), 4);
    }

    #[test]
    fn parse_ignores_unmarked_lines_and_short_numbers() {
        let profile = parse("**Name:** A\n12345678 stray\n- Phone: 123456\n");
        assert!(profile.is_empty());
    }

    #[test]
    fn parse_extracts_first_name_token() {
        assert_eq!(parse(PROFILE).name.as_deref(), Some("Test"));
        assert_eq!(parse("**Name:**   Ada Lovelace\n").name.as_deref(), Some("Ada"));
        assert!(parse("no name here").name.is_none());
    }

    #[test]
    fn parse_dedupes_numbers() {
        let profile = parse("- Phone: +1234567890\n- Mobile: +1234567890\n");
        assert_eq!(profile.numbers.len(), 1);
    }

    #[test]
    fn canonical_id_sanitizes_name_with_fallback() {
        assert_eq!(parse(PROFILE).canonical_id().as_str(), "test");
        assert_eq!(parse("**Name:** ...\n").canonical_id().as_str(), "owner");
        assert_eq!(OwnerProfile::default().canonical_id().as_str(), "owner");
    }

    #[test]
    fn load_missing_profile_is_empty() {
        let ws = TempDir::new().unwrap();
        let profile = load(ws.path()).unwrap();
        assert!(profile.is_empty());
        assert!(profile.name.is_none());
    }

    #[test]
    fn load_reads_workspace_profile() {
        let ws = TempDir::new().unwrap();
        std::fs::write(ws.path().join("USER.md"), PROFILE).unwrap();
        let profile = load(ws.path()).unwrap();
        assert!(profile.contains("+1234567890"));
        assert_eq!(profile.name.as_deref(), Some("Test"));
    }
}
