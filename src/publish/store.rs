// src/publish/store.rs
//! Durable snapshot store: archive, prune, atomic replace, single publisher.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

use super::{merge_batches, read_json, write_json_atomic, Snapshot};
use crate::candidate::Candidate;
use crate::config::PublishConfig;
use crate::error::PersistenceError;

const ARCHIVE_PREFIX: &str = "rolling_";
/// Upper bound for `lock_stale_secs` (one year).
const MAX_LOCK_AGE_SECS: u64 = 365 * 24 * 3600;

/// Exclusive `<snapshot>.lock`, removed on drop.
///
/// The file records the holder's pid and acquisition time. A lock whose holder is
/// gone, or that is older than `stale_after`, is broken once with a warning.
#[derive(Debug)]
struct LockFile {
    path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct LockOwner {
    pid: u32,
    acquired_at: DateTime<Utc>,
}

impl LockFile {
    fn acquire(path: PathBuf, stale_after: Duration) -> Result<Self, PersistenceError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| PersistenceError::io(dir, e))?;
        }
        match Self::create(&path) {
            Err(PersistenceError::Busy(_)) if Self::is_stale(&path, stale_after) => {
                warn!(target: "curator::publish", path = %path.display(), "breaking stale lock file");
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(PersistenceError::io(&path, e)),
                }
                Self::create(&path)
            }
            other => other,
        }
    }

    fn create(path: &Path) -> Result<Self, PersistenceError> {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                let owner = LockOwner {
                    pid: std::process::id(),
                    acquired_at: Utc::now(),
                };
                let lock = Self {
                    path: path.to_path_buf(),
                };
                serde_json::to_writer(&mut file, &owner)
                    .map_err(|e| PersistenceError::io(path, std::io::Error::other(e)))?;
                file.flush().map_err(|e| PersistenceError::io(path, e))?;
                Ok(lock)
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(PersistenceError::Busy(path.display().to_string()))
            }
            Err(e) => Err(PersistenceError::io(path, e)),
        }
    }

    /// Held by a dead process, or older than `stale_after`. Unreadable owners fall
    /// back to the file's modification time.
    fn is_stale(path: &Path, stale_after: Duration) -> bool {
        let owner = fs::read_to_string(path)
            .ok()
            .and_then(|raw| serde_json::from_str::<LockOwner>(&raw).ok());
        let acquired_at = match &owner {
            Some(o) => Some(o.acquired_at),
            None => fs::metadata(path)
                .and_then(|m| m.modified())
                .ok()
                .map(DateTime::<Utc>::from),
        };
        if acquired_at.is_some_and(|t| Utc::now() - t > stale_after) {
            return true;
        }
        owner.is_some_and(|o| !process_alive(o.pid))
    }
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    pid == std::process::id() || Path::new("/proc").join(pid.to_string()).exists()
}

#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
    true
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(target: "curator::publish", path = %self.path.display(), error = %e, "could not remove lock file");
        }
    }
}

#[derive(Debug)]
pub struct SnapshotStore {
    path: PathBuf,
    archive_dir: PathBuf,
    archive_keep: usize,
    rolling_cap: usize,
    lock_stale_after: Duration,
    guard: Mutex<()>,
}

impl SnapshotStore {
    pub fn new(cfg: &PublishConfig) -> Self {
        Self {
            path: cfg.snapshot_path.clone(),
            archive_dir: cfg.archive_dir.clone(),
            archive_keep: cfg.archive_keep,
            rolling_cap: cfg.rolling_cap,
            lock_stale_after: Duration::seconds(cfg.lock_stale_secs.min(MAX_LOCK_AGE_SECS) as i64),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Published articles, or empty when nothing was published yet.
    ///
    /// Accepts `{ "articles": [...] }` or a bare array; entries that no longer decode are skipped.
    pub fn load(&self) -> Result<Vec<Candidate>, PersistenceError> {
        let Some(doc) = read_json::<Value>(&self.path)? else {
            return Ok(Vec::new());
        };
        let items = match doc {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("articles") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        let total = items.len();
        let articles: Vec<Candidate> = items
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect();
        if articles.len() < total {
            warn!(
                target: "curator::publish",
                skipped = total - articles.len(),
                "skipped undecodable snapshot entries"
            );
        }
        Ok(articles)
    }

    /// Full snapshot document, if one exists.
    pub fn load_snapshot(&self) -> Result<Option<Snapshot>, PersistenceError> {
        read_json(&self.path)
    }

    /// Merge `new` into the published batch and replace the snapshot atomically.
    ///
    /// Fails fast with [`PersistenceError::Busy`] when another live publisher holds the lock.
    /// On any error the previous snapshot stays in place.
    pub fn publish(
        &self,
        new: Vec<Candidate>,
        now: DateTime<Utc>,
    ) -> Result<Snapshot, PersistenceError> {
        let _in_process = self.guard.lock().unwrap_or_else(|p| p.into_inner());
        let _lock = LockFile::acquire(self.lock_path(), self.lock_stale_after)?;

        let existing = self.load()?;
        let incoming = new.len();
        let snapshot = merge_batches(existing, new, self.rolling_cap, now);

        self.archive_current(now)?;
        write_json_atomic(&self.path, &snapshot, "snapshot")?;

        info!(
            target: "curator::publish",
            incoming,
            total = snapshot.metadata.total,
            tier = ?snapshot.metadata.tier,
            "snapshot published"
        );
        Ok(snapshot)
    }

    /// Copy the current snapshot to `rolling_YYYYMMDD_HHMMSS.json` and prune old archives.
    fn archive_current(&self, now: DateTime<Utc>) -> Result<Option<PathBuf>, PersistenceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        fs::create_dir_all(&self.archive_dir).map_err(|e| PersistenceError::io(&self.archive_dir, e))?;
        let target = self.archive_dir.join(format!(
            "{ARCHIVE_PREFIX}{}.json",
            now.format("%Y%m%d_%H%M%S")
        ));
        fs::copy(&self.path, &target).map_err(|e| PersistenceError::io(&target, e))?;
        debug!(target: "curator::publish", archive = %target.display(), "previous snapshot archived");
        self.prune_archives()?;
        Ok(Some(target))
    }

    /// Keep the newest `archive_keep` archives. Returns how many were removed.
    pub fn prune_archives(&self) -> Result<usize, PersistenceError> {
        let entries = match fs::read_dir(&self.archive_dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(PersistenceError::io(&self.archive_dir, e)),
        };
        let mut archives: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(ARCHIVE_PREFIX) && n.ends_with(".json"))
            })
            .collect();
        // timestamped names sort chronologically
        archives.sort();
        let excess = archives.len().saturating_sub(self.archive_keep);
        for old in archives.iter().take(excess) {
            fs::remove_file(old).map_err(|e| PersistenceError::io(old, e))?;
        }
        Ok(excess)
    }

    pub fn archives(&self) -> Vec<PathBuf> {
        let mut out: Vec<PathBuf> = fs::read_dir(&self.archive_dir)
            .map(|rd| rd.flatten().map(|e| e.path()).collect())
            .unwrap_or_default();
        out.sort();
        out
    }
}
