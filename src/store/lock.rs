//! Exclusive advisory locking for the identity map.
//!
//! One dedicated lock file sits next to the map and outlives every
//! locker: unlinking it would race a peer that already holds an open
//! handle. Lockers keep the lock for their full read-modify-write span.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;

use super::StoreError;

/// How often a contended lock is re-polled.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Holds the map lock until dropped.
#[derive(Debug)]
pub(crate) struct MapLock {
    file: File,
    path: PathBuf,
}

impl MapLock {
    /// Acquire exclusively, waiting up to `timeout` on contention.
    pub(crate) fn acquire(path: &Path, timeout: Duration) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| StoreError::io(path, e))?;

        let start = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    let waited = start.elapsed();
                    if waited >= POLL_INTERVAL {
                        tracing::debug!(
                            path = %path.display(),
                            waited_ms = waited.as_millis() as u64,
                            "acquired map lock after wait"
                        );
                    }
                    return Ok(Self {
                        file,
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    let waited = start.elapsed();
                    if waited >= timeout {
                        return Err(StoreError::LockTimeout {
                            path: path.to_path_buf(),
                            waited_ms: waited.as_millis() as u64,
                        });
                    }
                    std::thread::sleep(POLL_INTERVAL.min(timeout - waited));
                }
                Err(e) => return Err(StoreError::io(path, e)),
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MapLock {
    fn drop(&mut self) {
        // Best-effort; the OS releases on close regardless.
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lock_path(dir: &TempDir) -> PathBuf {
        dir.path().join("data").join("identity-map.lock")
    }

    #[test]
    fn acquire_creates_parent_dirs_and_lock_file() {
        let dir = TempDir::new().unwrap();
        let path = lock_path(&dir);
        let lock = MapLock::acquire(&path, Duration::from_secs(1)).unwrap();
        assert!(lock.path().exists());
    }

    #[test]
    fn contended_lock_times_out() {
        let dir = TempDir::new().unwrap();
        let path = lock_path(&dir);
        let _held = MapLock::acquire(&path, Duration::from_secs(1)).unwrap();

        let err = MapLock::acquire(&path, Duration::from_millis(80)).unwrap_err();
        match err {
            StoreError::LockTimeout { waited_ms, .. } => assert!(waited_ms >= 80),
            other => panic!("expected LockTimeout, got {other:?}"),
        }
    }

    #[test]
    fn drop_releases_the_lock() {
        let dir = TempDir::new().unwrap();
        let path = lock_path(&dir);
        drop(MapLock::acquire(&path, Duration::from_secs(1)).unwrap());
        MapLock::acquire(&path, Duration::from_millis(50)).unwrap();
    }

    #[test]
    fn lock_file_survives_release() {
        let dir = TempDir::new().unwrap();
        let path = lock_path(&dir);
        drop(MapLock::acquire(&path, Duration::from_secs(1)).unwrap());
        assert!(path.exists());
    }
}
