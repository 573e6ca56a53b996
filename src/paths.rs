//! Filesystem locations for the identity map.
//!
//! Workspace resolution order: explicit flag, `IDMAP_WORKSPACE`, current
//! directory. The map lives at `data/identity-map.json`; a pre-existing
//! legacy `memory/identity-map.json` is honored when the preferred file
//! is absent. There is no silent migration between the two locations.

use std::path::{Path, PathBuf};

/// Environment override for the workspace root.
pub(crate) const WORKSPACE_ENV: &str = "IDMAP_WORKSPACE";

pub(crate) const MAP_FILE: &str = "identity-map.json";

pub(crate) const DATA_DIR: &str = "data";
pub(crate) const LEGACY_DIR: &str = "memory";

/// Resolve the workspace root for CLI invocations.
pub(crate) fn resolve_workspace(explicit: Option<PathBuf>) -> PathBuf {
    let root = explicit
        .or_else(|| {
            std::env::var(WORKSPACE_ENV)
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    std::fs::canonicalize(&root).unwrap_or(root)
}

/// Where the map lives (or will live) under `workspace`. Probed fresh on
/// every call so a concurrently created map is picked up.
pub(crate) fn map_path(workspace: &Path) -> PathBuf {
    let preferred = workspace.join(DATA_DIR).join(MAP_FILE);
    if preferred.exists() {
        return preferred;
    }
    let legacy = workspace.join(LEGACY_DIR).join(MAP_FILE);
    if legacy.exists() {
        tracing::debug!(path = %legacy.display(), "using legacy identity map location");
        return legacy;
    }
    preferred
}

/// Lock file sibling to the map file.
pub(crate) fn lock_path(map_path: &Path) -> PathBuf {
    map_path.with_extension("lock")
}
