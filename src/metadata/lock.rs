// ABOUTME: Exclusive lock held across each load-modify-save cycle of the metadata file.
// ABOUTME: Uses atomic file creation with holder info stored next to containers.json.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::{Error, Result};

/// Locks older than this are assumed abandoned by a crashed process.
const STALE_AFTER: Duration = Duration::from_secs(60 * 60);

/// Information about who holds the metadata lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub started_at: DateTime<Utc>,
    /// Engine operation running under the lock.
    pub operation: String,
}

impl LockInfo {
    /// Create new lock info for the current process.
    pub fn new(operation: &str) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            operation: operation.to_string(),
        }
    }

    pub fn is_stale(&self) -> bool {
        (Utc::now() - self.started_at)
            .to_std()
            .is_ok_and(|age| age >= STALE_AFTER)
    }
}

/// A held metadata lock. The lock file is removed on drop.
#[derive(Debug)]
pub struct MetadataLock {
    path: PathBuf,
    released: bool,
}

impl MetadataLock {
    /// Acquire the lock at `path`.
    ///
    /// `create_new` makes acquisition atomic. Returns `Error::LockHeld` while
    /// another live process holds it; stale locks are broken with a warning.
    pub fn acquire(path: &Path, operation: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let info = LockInfo::new(operation);
        if Self::try_create(path, &info)? {
            tracing::debug!(operation, "acquired metadata lock");
            return Ok(Self {
                path: path.to_path_buf(),
                released: false,
            });
        }

        if let Some(observed) = Self::check_existing(path)? {
            Self::break_stale(path, &observed)?;
        }

        if !Self::try_create(path, &info)? {
            // Someone else won the race to re-acquire.
            Self::check_existing(path)?;
            return Err(Error::LockHeld {
                holder: "unknown".to_string(),
                pid: 0,
                started_at: Utc::now(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            released: false,
        })
    }

    /// Returns `Ok(false)` if the lock file already exists.
    fn try_create(path: &Path, info: &LockInfo) -> Result<bool> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == IoErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        file.write_all(serde_json::to_string(info)?.as_bytes())?;
        file.sync_all()?;
        Ok(true)
    }

    /// Content of the existing lock if it may be broken, `None` if it is
    /// already gone, `LockHeld` otherwise.
    fn check_existing(path: &Path) -> Result<Option<String>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<LockInfo>(&content) {
            Ok(existing) if existing.is_stale() => {
                tracing::warn!(
                    "Auto-breaking stale metadata lock held by {} (pid {}) since {}",
                    existing.holder,
                    existing.pid,
                    existing.started_at
                );
                Ok(Some(content))
            }
            Ok(existing) => Err(Error::LockHeld {
                holder: existing.holder,
                pid: existing.pid,
                started_at: existing.started_at,
            }),
            Err(_) => {
                // A holder may still be writing its info; only break old files.
                let modified = fs::metadata(path)?.modified()?;
                let age = SystemTime::now()
                    .duration_since(modified)
                    .unwrap_or_default();
                if age >= STALE_AFTER {
                    tracing::warn!("Metadata lock info corrupted, breaking lock");
                    Ok(Some(content))
                } else {
                    Err(Error::LockHeld {
                        holder: "unknown".to_string(),
                        pid: 0,
                        started_at: DateTime::<Utc>::from(modified),
                    })
                }
            }
        }
    }

    /// Remove a lock that `check_existing` judged stale.
    ///
    /// The file is moved aside first and compared with what was observed. If
    /// another process already replaced it with a fresh lock, that lock is
    /// put back and `LockHeld` is returned.
    fn break_stale(path: &Path, observed: &str) -> Result<()> {
        let aside = path.with_extension(format!("lock.{}.stale", std::process::id()));
        match fs::rename(path, &aside) {
            Ok(()) => {}
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        let moved = fs::read_to_string(&aside)?;
        if moved == observed {
            tracing::debug!("removed stale metadata lock at {}", path.display());
            fs::remove_file(&aside)?;
            return Ok(());
        }

        // hard_link never overwrites, so a lock created meanwhile wins.
        if let Err(e) = fs::hard_link(&aside, path) {
            tracing::debug!("could not restore metadata lock {}: {}", path.display(), e);
        }
        fs::remove_file(&aside)?;
        Err(match serde_json::from_str::<LockInfo>(&moved) {
            Ok(holder) => Error::LockHeld {
                holder: holder.holder,
                pid: holder.pid,
                started_at: holder.started_at,
            },
            Err(_) => Error::LockHeld {
                holder: "unknown".to_string(),
                pid: 0,
                started_at: Utc::now(),
            },
        })
    }

    /// Release the lock explicitly, reporting removal failures.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for MetadataLock {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = fs::remove_file(&self.path)
        {
            tracing::warn!("failed to remove metadata lock {}: {}", self.path.display(), e);
        }
    }
}
