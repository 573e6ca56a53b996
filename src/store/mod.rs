//! File-backed identity store.
//!
//! [`IdentityStore`] owns a workspace root and lock policy; it caches no
//! map state. Every operation locks the map, reads the latest bytes,
//! applies its change and atomically replaces the file, so any number of
//! processes can share one workspace safely. Operations that end up
//! changing nothing do not rewrite the file.

mod lock;

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::map::{Identity, IdentityMap};
use crate::core::time::now_utc;
use crate::core::{CanonicalId, ChannelKey};
use crate::error::Transience;
use crate::owner::{self, OwnerProfile};
use crate::{Result, paths};

use lock::MapLock;

// =============================================================================
// Errors
// =============================================================================

/// Store-layer failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The map lock stayed contended for the whole configured wait.
    #[error("timed out after {waited_ms}ms waiting for map lock at {}", path.display())]
    LockTimeout { path: PathBuf, waited_ms: u64 },

    /// The map file exists but cannot be understood. Surfaced, never
    /// silently reset.
    #[error("identity map at {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// The channel key is already bound to a different identity.
    #[error("channel `{channel}` is already mapped to `{existing}`")]
    ChannelConflict {
        channel: ChannelKey,
        existing: CanonicalId,
    },

    /// `init` without force over an existing map.
    #[error("identity map already exists at {} (use --force to reset)", path.display())]
    AlreadyInitialized { path: PathBuf },

    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn transience(&self) -> Transience {
        match self {
            StoreError::LockTimeout { .. } => Transience::Retryable,
            _ => Transience::Permanent,
        }
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Outcome of a channel resolution. Total: unknown users resolve too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The key is bound to a registered identity.
    Known(CanonicalId),
    /// Nobody we know. Displays as `stranger:{channel}:{user_id}`;
    /// synthesized per call and never persisted.
    Stranger(ChannelKey),
}

impl Resolution {
    pub fn canonical(&self) -> Option<&CanonicalId> {
        match self {
            Resolution::Known(id) => Some(id),
            Resolution::Stranger(_) => None,
        }
    }

    pub fn is_stranger(&self) -> bool {
        matches!(self, Resolution::Stranger(_))
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Known(id) => write!(f, "{id}"),
            Resolution::Stranger(key) => write!(f, "stranger:{key}"),
        }
    }
}

// =============================================================================
// Store handle
// =============================================================================

pub(crate) const LOCK_TIMEOUT_ENV: &str = "IDMAP_LOCK_TIMEOUT_MS";
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Tunables for one store handle.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Bound on the wait for a contended map lock.
    pub lock_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

impl StoreOptions {
    /// Defaults with the `IDMAP_LOCK_TIMEOUT_MS` override applied.
    pub fn from_env() -> Self {
        let mut opts = Self::default();
        if let Ok(raw) = std::env::var(LOCK_TIMEOUT_ENV)
            && let Ok(ms) = raw.trim().parse::<u64>()
        {
            opts.lock_timeout = Duration::from_millis(ms);
        }
        opts
    }
}

/// Handle on one workspace's identity map.
#[derive(Debug, Clone)]
pub struct IdentityStore {
    workspace: PathBuf,
    options: StoreOptions,
}

impl IdentityStore {
    /// Open a handle with environment-derived options. No I/O happens
    /// until the first operation.
    pub fn open(workspace: impl Into<PathBuf>) -> Self {
        Self::with_options(workspace, StoreOptions::from_env())
    }

    pub fn with_options(workspace: impl Into<PathBuf>, options: StoreOptions) -> Self {
        Self {
            workspace: workspace.into(),
            options,
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Current map location (preferred or legacy), probed fresh.
    pub fn map_path(&self) -> PathBuf {
        paths::map_path(&self.workspace)
    }

    pub fn lock_path(&self) -> PathBuf {
        paths::lock_path(&self.map_path())
    }

    /// Resolve a channel user to a canonical identity.
    ///
    /// Bound keys resolve to their identity. Unbound keys belonging to an
    /// owner contact (per the workspace profile) lazily register the
    /// owner, the only path where a resolve writes. Everyone else gets a
    /// stranger fallback; resolution never fails for unknown users.
    pub fn resolve(&self, channel: &str, provider_user_id: &str) -> Result<Resolution> {
        let profile = owner::load(&self.workspace)
            .map_err(|e| StoreError::io(&self.workspace.join(owner::PROFILE_FILE), e))?;
        self.resolve_with_profile(channel, provider_user_id, &profile)
    }

    /// [`resolve`](Self::resolve) with a caller-supplied owner profile.
    pub fn resolve_with_profile(
        &self,
        channel: &str,
        provider_user_id: &str,
        profile: &OwnerProfile,
    ) -> Result<Resolution> {
        let key = ChannelKey::new(channel, provider_user_id)?;
        let map_path = self.map_path();
        let _lock = self.lock(&map_path)?;
        let mut map = load(&map_path)?;

        if let Some(id) = map.find_channel(&key) {
            return Ok(Resolution::Known(id.clone()));
        }

        if !profile.contains(provider_user_id) {
            return Ok(Resolution::Stranger(key));
        }

        // Owner contact on a new channel: reconcile identity and binding,
        // creating only what is missing.
        let now = now_utc();
        let owner_id = match map.owner() {
            Some(identity) => identity.canonical_id.clone(),
            None => {
                let id = profile.canonical_id();
                map.identities
                    .insert(id.clone(), Identity::new(id.clone(), None, true, now));
                tracing::info!(canonical = %id, "auto-registered owner identity");
                id
            }
        };
        let changed = match map.identities.get_mut(&owner_id) {
            Some(identity) => identity.add_channel(key.clone(), now),
            None => false,
        };
        if changed {
            tracing::info!(canonical = %owner_id, channel = %key, "bound owner channel");
            save(&map_path, &map)?;
        }
        Ok(Resolution::Known(owner_id))
    }

    /// Bind `channel:user_id` to `canonical`, creating the identity on
    /// first reference. A display name only applies at creation time.
    ///
    /// Re-adding an existing binding is a no-op that does not touch the
    /// file; a key bound to a different identity is a conflict.
    pub fn add_channel(
        &self,
        canonical: &str,
        channel: &str,
        provider_user_id: &str,
        display_name: Option<&str>,
    ) -> Result<CanonicalId> {
        let id = CanonicalId::sanitize(canonical)?;
        let key = ChannelKey::new(channel, provider_user_id)?;
        let map_path = self.map_path();
        let _lock = self.lock(&map_path)?;
        let mut map = load(&map_path)?;

        if let Some(existing) = map.find_channel(&key)
            && *existing != id
        {
            return Err(StoreError::ChannelConflict {
                channel: key,
                existing: existing.clone(),
            }
            .into());
        }

        let now = now_utc();
        let identity = map
            .identities
            .entry(id.clone())
            .or_insert_with(|| Identity::new(id.clone(), display_name.map(str::to_string), false, now));
        if identity.add_channel(key, now) {
            save(&map_path, &map)?;
        }
        Ok(id)
    }

    /// Unbind `channel:user_id` from `canonical`.
    ///
    /// Returns whether a binding was removed; unknown identities and
    /// unbound keys are no-ops, not errors. Identities keep existing with
    /// zero bindings.
    pub fn remove_channel(
        &self,
        canonical: &str,
        channel: &str,
        provider_user_id: &str,
    ) -> Result<bool> {
        let id = CanonicalId::sanitize(canonical)?;
        let key = ChannelKey::new(channel, provider_user_id)?;
        let map_path = self.map_path();
        let _lock = self.lock(&map_path)?;
        let mut map = load(&map_path)?;

        let removed = match map.identities.get_mut(&id) {
            Some(identity) => identity.remove_channel(&key, now_utc()),
            None => false,
        };
        if removed {
            save(&map_path, &map)?;
        }
        Ok(removed)
    }

    /// Snapshot of the whole document.
    pub fn list_identities(&self) -> Result<IdentityMap> {
        let map_path = self.map_path();
        let _lock = self.lock(&map_path)?;
        load(&map_path)
    }

    /// Channel keys bound to `canonical`; empty when unknown.
    pub fn channels(&self, canonical: &str) -> Result<Vec<ChannelKey>> {
        let id = CanonicalId::sanitize(canonical)?;
        let map = self.list_identities()?;
        Ok(map
            .identities
            .get(&id)
            .map(|identity| identity.channels.clone())
            .unwrap_or_default())
    }

    /// Whether `canonical` is flagged as the workspace owner; false when
    /// unknown.
    pub fn is_owner(&self, canonical: &str) -> Result<bool> {
        let id = CanonicalId::sanitize(canonical)?;
        let map = self.list_identities()?;
        Ok(map
            .identities
            .get(&id)
            .is_some_and(|identity| identity.is_owner))
    }

    /// Write an empty map. An existing map is an error unless `force`,
    /// which resets it in place.
    pub fn init(&self, force: bool) -> Result<PathBuf> {
        let map_path = self.map_path();
        let _lock = self.lock(&map_path)?;
        if map_path.exists() && !force {
            return Err(StoreError::AlreadyInitialized { path: map_path }.into());
        }
        save(&map_path, &IdentityMap::empty())?;
        tracing::info!(path = %map_path.display(), "initialized identity map");
        Ok(map_path)
    }

    fn lock(&self, map_path: &Path) -> Result<MapLock> {
        Ok(MapLock::acquire(
            &paths::lock_path(map_path),
            self.options.lock_timeout,
        )?)
    }
}

// =============================================================================
// Persistence
// =============================================================================

/// Read and validate the map. A missing file is an empty map; any decode
/// or structural failure surfaces as corruption.
fn load(path: &Path) -> Result<IdentityMap> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(IdentityMap::empty()),
        Err(e) => return Err(StoreError::io(path, e).into()),
    };
    let map: IdentityMap = serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    map.validate().map_err(|reason| StoreError::Corrupt {
        path: path.to_path_buf(),
        reason,
    })?;
    tracing::debug!(path = %path.display(), identities = map.len(), "loaded identity map");
    Ok(map)
}

/// Atomic replace: temp file in the same directory, fsync, rename over.
fn save(path: &Path, map: &IdentityMap) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;

    let mut json = serde_json::to_vec_pretty(map).map_err(|e| StoreError::io(path, e.into()))?;
    json.push(b'\n');

    let mut temp =
        tempfile::NamedTempFile::new_in(parent).map_err(|e| StoreError::io(parent, e))?;
    temp.write_all(&json)
        .map_err(|e| StoreError::io(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| StoreError::io(temp.path(), e))?;
    temp.persist(path)
        .map_err(|e| StoreError::io(path, e.error))?;
    tracing::debug!(path = %path.display(), identities = map.len(), "saved identity map");
    Ok(())
}
