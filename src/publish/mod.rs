// src/publish/mod.rs
//! Merge store for the published batch.
//!
//! [`merge_batches`] is pure: concatenate, keep the most recently processed version of
//! each link, keep only the best non-empty tier, order newest first and cap. The
//! [`store::SnapshotStore`] wraps it with archiving, atomic writes and locking.

pub mod backlog;
pub mod state;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::candidate::Candidate;
use crate::error::PersistenceError;

pub use backlog::{Backlog, BacklogEntry};
pub use state::DailyState;
pub use store::SnapshotStore;

pub const SCHEMA_VERSION: u32 = 1;
pub const ROLLING_CAP_RANGE: std::ops::RangeInclusive<usize> = 1..=1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    DisplayReady,
    Enhanced,
    Raw,
}

impl Tier {
    pub fn of(c: &Candidate) -> Tier {
        match &c.enhancement {
            Some(_) if c.display_ready => Tier::DisplayReady,
            Some(e) if c.enhanced && e.has_simplified_content() => Tier::Enhanced,
            _ => Tier::Raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub rolling_cap: usize,
    pub tier: Tier,
    /// Counts over the merged pool, before tier filtering.
    pub ready_count: usize,
    pub enhanced_count: usize,
    pub raw_count: usize,
    pub schema_version: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub metadata: SnapshotMetadata,
    pub articles: Vec<Candidate>,
}

/// Concatenate and keep one entry per link: the latest `processed_at`, later entry on ties.
/// Each link keeps the position of its first occurrence.
pub fn dedupe_by_link(existing: Vec<Candidate>, new: Vec<Candidate>) -> Vec<Candidate> {
    let mut slot_of: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<Candidate> = Vec::with_capacity(existing.len() + new.len());
    for c in existing.into_iter().chain(new) {
        match slot_of.get(&c.link) {
            Some(&i) => {
                if c.processed_at >= out[i].processed_at {
                    out[i] = c;
                }
            }
            None => {
                slot_of.insert(c.link.clone(), out.len());
                out.push(c);
            }
        }
    }
    out
}

/// Newest first by published time falling back to processed time; undated last.
pub fn by_recency(a: &Candidate, b: &Candidate) -> Ordering {
    match (a.recency_key(), b.recency_key()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// `publish(existing, new)`: the next published batch and its metadata.
pub fn merge_batches(
    existing: Vec<Candidate>,
    new: Vec<Candidate>,
    rolling_cap: usize,
    generated_at: DateTime<Utc>,
) -> Snapshot {
    let pool = dedupe_by_link(existing, new);

    let mut counts = [0usize; 3];
    for c in &pool {
        counts[Tier::of(c) as usize] += 1;
    }
    let tier = [Tier::DisplayReady, Tier::Enhanced, Tier::Raw]
        .into_iter()
        .find(|t| counts[*t as usize] > 0)
        .unwrap_or(Tier::Raw);

    let mut articles: Vec<Candidate> = pool.into_iter().filter(|c| Tier::of(c) == tier).collect();
    articles.sort_by(by_recency);
    articles.truncate(rolling_cap);

    Snapshot {
        metadata: SnapshotMetadata {
            generated_at,
            total: articles.len(),
            rolling_cap,
            tier,
            ready_count: counts[Tier::DisplayReady as usize],
            enhanced_count: counts[Tier::Enhanced as usize],
            raw_count: counts[Tier::Raw as usize],
            schema_version: SCHEMA_VERSION,
        },
        articles,
    }
}

/// Write JSON to `<path>.tmp`, fsync, then rename over `path`.
pub(crate) fn write_json_atomic<T: Serialize>(
    path: &Path,
    value: &T,
    what: &'static str,
) -> Result<(), PersistenceError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| PersistenceError::io(dir, e))?;
    }
    let json =
        serde_json::to_vec_pretty(value).map_err(|source| PersistenceError::Encode { what, source })?;
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);

    let mut f = fs::File::create(tmp).map_err(|e| PersistenceError::io(tmp, e))?;
    f.write_all(&json).map_err(|e| PersistenceError::io(tmp, e))?;
    f.sync_all().map_err(|e| PersistenceError::io(tmp, e))?;
    drop(f);
    fs::rename(tmp, path).map_err(|e| PersistenceError::io(path, e))
}

/// Read and decode a JSON file; `Ok(None)` when it does not exist.
pub(crate) fn read_json<T: for<'de> Deserialize<'de>>(
    path: &Path,
) -> Result<Option<T>, PersistenceError> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PersistenceError::io(path, e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| PersistenceError::Decode {
            path: path.display().to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::test_support::candidate;
    use crate::candidate::Enhancement;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap())
    }

    fn processed(link: &str, ts: Option<DateTime<Utc>>) -> Candidate {
        let mut c = candidate(link, 5.0);
        c.processed_at = ts;
        c
    }

    fn ready(link: &str) -> Candidate {
        let mut c = processed(link, at(2024, 3, 1));
        c.enhanced = true;
        c.display_ready = true;
        c.enhancement = Some(Enhancement {
            simplified_title_fr: "titre".into(),
            ..Default::default()
        });
        c
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn newer_version_replaces_older() {
        let existing = vec![processed("1", at(2024, 1, 1)), processed("2", at(2024, 1, 2))];
        let mut update = processed("1", at(2024, 2, 1));
        update.summary = "updated".into();
        let snap = merge_batches(existing, vec![update], 200, now());
        assert_eq!(snap.articles.len(), 2);
        let one = snap
            .articles
            .iter()
            .find(|c| c.link.ends_with("/1"))
            .unwrap();
        assert_eq!(one.processed_at, at(2024, 2, 1));
        assert_eq!(one.summary, "updated");
        // newest first
        assert!(snap.articles[0].link.ends_with("/1"));
    }

    #[test]
    fn older_incoming_version_loses_and_ties_go_to_new() {
        let existing = vec![processed("1", at(2024, 2, 1))];
        let stale = processed("1", at(2024, 1, 1));
        let snap = merge_batches(existing.clone(), vec![stale], 200, now());
        assert_eq!(snap.articles[0].processed_at, at(2024, 2, 1));

        let mut same = processed("1", at(2024, 2, 1));
        same.summary = "new".into();
        let snap = merge_batches(existing, vec![same], 200, now());
        assert_eq!(snap.articles[0].summary, "new");
    }

    #[test]
    fn highest_non_empty_tier_wins() {
        let existing = vec![processed("raw", at(2024, 5, 1))];
        let snap = merge_batches(existing, vec![ready("r1")], 200, now());
        assert_eq!(snap.metadata.tier, Tier::DisplayReady);
        assert_eq!(snap.articles.len(), 1);
        assert_eq!(snap.metadata.ready_count, 1);
        assert_eq!(snap.metadata.raw_count, 1);

        let snap = merge_batches(vec![processed("raw", None)], vec![], 200, now());
        assert_eq!(snap.metadata.tier, Tier::Raw);
        assert_eq!(snap.articles.len(), 1);
    }

    #[test]
    fn enhanced_without_content_counts_as_raw() {
        let mut c = processed("x", None);
        c.enhanced = true;
        c.enhancement = Some(Enhancement::default());
        assert_eq!(Tier::of(&c), Tier::Raw);
        c.display_ready = true;
        assert_eq!(Tier::of(&c), Tier::DisplayReady);
    }

    #[test]
    fn published_time_orders_before_processed_and_undated_last() {
        let mut a = processed("a", at(2024, 1, 5));
        a.published_at = at(2024, 1, 1);
        let b = processed("b", at(2024, 1, 3));
        let undated1 = processed("u1", None);
        let undated2 = processed("u2", None);
        let snap = merge_batches(vec![undated1, a, undated2, b], vec![], 200, now());
        let links: Vec<&str> = snap
            .articles
            .iter()
            .map(|c| c.link.trim_start_matches("https://news.example/"))
            .collect();
        assert_eq!(links, vec!["b", "a", "u1", "u2"]);
    }

    #[test]
    fn rolling_cap_truncates_oldest() {
        let batch: Vec<Candidate> = (1..=5).map(|d| processed(&format!("d{d}"), at(2024, 1, d))).collect();
        let snap = merge_batches(batch, vec![], 3, now());
        assert_eq!(snap.metadata.total, 3);
        assert!(snap.articles[0].link.ends_with("d5"));
        assert!(snap.articles[2].link.ends_with("d3"));
    }

    #[test]
    fn republishing_is_idempotent() {
        let batch = vec![
            processed("1", at(2024, 1, 1)),
            processed("2", None),
            processed("1", at(2024, 1, 9)),
            processed("3", at(2024, 1, 4)),
        ];
        let first = merge_batches(Vec::new(), batch, 200, now());
        let again = merge_batches(first.articles.clone(), Vec::new(), 200, now());
        assert_eq!(again.articles, first.articles);
        assert_eq!(again.metadata, first.metadata);
    }

    #[test]
    fn atomic_write_round_trips_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        write_json_atomic(&path, &vec![1, 2, 3], "numbers").unwrap();
        let back: Option<Vec<u32>> = read_json(&path).unwrap();
        assert_eq!(back, Some(vec![1, 2, 3]));
        assert!(!dir.path().join("nested").join("doc.json.tmp").exists());
        let missing: Option<Vec<u32>> = read_json(&dir.path().join("nope.json")).unwrap();
        assert!(missing.is_none());
    }
}
