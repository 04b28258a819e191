// src/select/mod.rs
//! Selection strategies.
//!
//! Both strategies take the deduplicated pool plus the topic counts already on the
//! published page and return at most `target` candidates with no topic tag over
//! `max_per_topic`. Upstream components never know which one is in use.

pub mod bucketed;
pub mod diversity;

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::candidate::Candidate;
use crate::config::{CurationConfig, StrategyKind};

pub use bucketed::BucketedStrategy;
pub use diversity::DiversityStrategy;

pub type TopicCounts = BTreeMap<String, usize>;

/// Per-run inputs that do not come from configuration.
#[derive(Debug, Clone, Default)]
pub struct SelectionContext {
    /// How often each tag already appears in the published batch.
    pub existing_topic_counts: TopicCounts,
    /// External relevance (0-10) keyed by link. Missing entries mean rule-only.
    pub external_scores: HashMap<String, f64>,
    /// Remaining daily allowance; `None` means unlimited.
    pub remaining_daily: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionOutcome {
    pub selected: Vec<Candidate>,
    /// Below the strategy's rule-score floor.
    pub rejected_by_score: usize,
    /// Below the quality threshold.
    pub rejected_by_quality: usize,
    /// Would have pushed a topic over `max_per_topic`.
    pub rejected_by_quota: usize,
    /// Eligible but the target count was already reached.
    pub overflow: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SelectionSummary {
    pub strategy: &'static str,
    pub selected: usize,
    pub rejected_by_score: usize,
    pub rejected_by_quality: usize,
    pub rejected_by_quota: usize,
    pub overflow: usize,
}

pub trait SelectionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn select(&self, deduped: Vec<Candidate>, ctx: &SelectionContext) -> SelectionOutcome;
}

pub fn strategy_from_config(cfg: &CurationConfig) -> Box<dyn SelectionStrategy> {
    match cfg.selection.strategy {
        StrategyKind::Diversity => Box::new(DiversityStrategy::new(cfg)),
        StrategyKind::Bucketed => Box::new(BucketedStrategy::new(cfg)),
    }
}

impl SelectionOutcome {
    pub fn summary(&self, strategy: &'static str) -> SelectionSummary {
        SelectionSummary {
            strategy,
            selected: self.selected.len(),
            rejected_by_score: self.rejected_by_score,
            rejected_by_quality: self.rejected_by_quality,
            rejected_by_quota: self.rejected_by_quota,
            overflow: self.overflow,
        }
    }
}

/// Mean over tags of `1 / (1 + count·decay)`. Untagged candidates are fully novel.
pub fn novelty(tags: &BTreeSet<String>, existing: &TopicCounts, decay: f64) -> f64 {
    if tags.is_empty() {
        return 1.0;
    }
    let sum: f64 = tags
        .iter()
        .map(|t| {
            let count = existing.get(t).copied().unwrap_or(0) as f64;
            1.0 / (1.0 + count * decay)
        })
        .sum();
    sum / tags.len() as f64
}

/// Count tags across a batch.
pub fn topic_counts<'a, I>(batch: I) -> TopicCounts
where
    I: IntoIterator<Item = &'a Candidate>,
{
    let mut counts = TopicCounts::new();
    for c in batch {
        for t in &c.topic_tags {
            *counts.entry(t.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Per-topic cap counted within the current selection.
#[derive(Debug, Clone)]
pub(crate) struct TopicQuota {
    max_per_topic: usize,
    counts: TopicCounts,
}

impl TopicQuota {
    pub(crate) fn new(max_per_topic: usize) -> Self {
        Self {
            max_per_topic,
            counts: TopicCounts::new(),
        }
    }

    pub(crate) fn fits(&self, tags: &BTreeSet<String>) -> bool {
        tags.iter()
            .all(|t| self.counts.get(t).copied().unwrap_or(0) < self.max_per_topic)
    }

    pub(crate) fn admit(&mut self, tags: &BTreeSet<String>) {
        for t in tags {
            *self.counts.entry(t.clone()).or_insert(0) += 1;
        }
    }
}

/// Effective target: configured cap bounded by the remaining daily allowance.
pub(crate) fn effective_target(cap: usize, remaining_daily: Option<usize>) -> usize {
    remaining_daily.map_or(cap, |r| cap.min(r))
}
