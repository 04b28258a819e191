// src/publish/backlog.rs
//! Candidates whose enhancement failed, queued for a later backfill attempt.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use super::{read_json, write_json_atomic};
use crate::candidate::Candidate;
use crate::error::PersistenceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacklogEntry {
    pub candidate: Candidate,
    pub attempts: u32,
    pub queued_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Persisted as a bare JSON array of entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Backlog {
    pub entries: Vec<BacklogEntry>,
}

impl Backlog {
    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        Ok(read_json(path)?.unwrap_or_default())
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        write_json_atomic(path, self, "backlog")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, link: &str) -> bool {
        self.entries.iter().any(|e| e.candidate.link == link)
    }

    /// Queue a failed candidate. A link already queued keeps its `queued_at` and gains an attempt.
    pub fn push_failure(&mut self, mut candidate: Candidate, error: impl Into<String>, now: DateTime<Utc>) {
        let error = error.into();
        match self.entries.iter_mut().find(|e| e.candidate.link == candidate.link) {
            Some(entry) => {
                entry.attempts += 1;
                candidate.backfill_attempts = entry.attempts;
                entry.candidate = candidate;
                entry.last_error = Some(error);
            }
            None => {
                candidate.backfill_attempts = 1;
                self.entries.push(BacklogEntry {
                    candidate,
                    attempts: 1,
                    queued_at: now,
                    last_error: Some(error),
                });
            }
        }
    }

    /// Drop entries that are too old or out of attempts, then keep the newest `max_entries`.
    /// Returns how many were dropped.
    pub fn prune(
        &mut self,
        now: DateTime<Utc>,
        max_age_hours: i64,
        max_attempts: u32,
        max_entries: usize,
    ) -> usize {
        let before = self.entries.len();
        let cutoff = now - Duration::hours(max_age_hours);
        self.entries
            .retain(|e| e.queued_at >= cutoff && e.attempts < max_attempts);
        if self.entries.len() > max_entries {
            self.entries.sort_by_key(|e| e.queued_at);
            let excess = self.entries.len() - max_entries;
            self.entries.drain(..excess);
        }
        let dropped = before - self.entries.len();
        if dropped > 0 {
            debug!(target: "curator::publish", dropped, remaining = self.entries.len(), "backlog pruned");
        }
        dropped
    }

    /// Remove and return up to `limit` entries, oldest first.
    pub fn take_batch(&mut self, limit: usize) -> Vec<BacklogEntry> {
        self.entries.sort_by_key(|e| e.queued_at);
        let n = limit.min(self.entries.len());
        self.entries.drain(..n).collect()
    }

    /// Return a taken entry after another failed attempt.
    pub fn requeue(&mut self, mut entry: BacklogEntry, candidate: Candidate, error: impl Into<String>) {
        entry.attempts += 1;
        entry.candidate = candidate;
        entry.candidate.backfill_attempts = entry.attempts;
        entry.last_error = Some(error.into());
        self.entries.retain(|e| e.candidate.link != entry.candidate.link);
        self.entries.push(entry);
    }

    /// Put entries back, e.g. when a batch could not be processed.
    pub fn restore(&mut self, entries: Vec<BacklogEntry>) {
        for e in entries {
            if !self.contains(&e.candidate.link) {
                self.entries.push(e);
            }
        }
    }

    pub fn remove(&mut self, link: &str) -> Option<BacklogEntry> {
        let idx = self.entries.iter().position(|e| e.candidate.link == link)?;
        Some(self.entries.remove(idx))
    }
}
