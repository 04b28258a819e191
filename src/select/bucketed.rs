// src/select/bucketed.rs
//! Bucket quotas first, blended leftovers second.
//!
//! Used for scheduled runs against a daily cap. Buckets are matched in configured
//! priority order; a bucket with no keywords catches everything unmatched.

use tracing::debug;

use super::{effective_target, novelty, SelectionContext, SelectionOutcome, SelectionStrategy, TopicQuota};
use crate::candidate::Candidate;
use crate::config::{BucketedConfig, CurationConfig, SelectionConfig};
use crate::text::{fold, KeywordBank};

#[derive(Debug, Clone)]
struct Bucket {
    name: String,
    quota: usize,
    keywords: KeywordBank,
}

#[derive(Debug, Clone)]
pub struct BucketedStrategy {
    selection: SelectionConfig,
    cfg: BucketedConfig,
    buckets: Vec<Bucket>,
}

struct Ranked {
    index: usize,
    blended: f64,
    candidate: Candidate,
}

impl BucketedStrategy {
    pub fn new(cfg: &CurationConfig) -> Self {
        let buckets = cfg
            .selection
            .bucketed
            .buckets
            .iter()
            .map(|b| Bucket {
                name: b.name.clone(),
                quota: b.quota,
                keywords: KeywordBank::new(&b.keywords),
            })
            .collect();
        Self {
            selection: cfg.selection.clone(),
            cfg: cfg.selection.bucketed.clone(),
            buckets,
        }
    }

    /// Blend rule quality with an external relevance score. Rule-only when absent.
    pub fn blended(&self, quality: f64, external: Option<f64>) -> f64 {
        let external = external.unwrap_or(quality);
        self.cfg.rule_weight * quality + self.cfg.model_weight * external
    }

    /// Index of the first bucket whose keywords match, falling back to the catch-all.
    pub fn bucket_for(&self, c: &Candidate) -> Option<usize> {
        let folded = fold(&c.text());
        self.buckets
            .iter()
            .position(|b| !b.keywords.is_empty() && b.keywords.matches(&folded))
            .or_else(|| self.buckets.iter().position(|b| b.keywords.is_empty()))
    }

    pub fn bucket_name(&self, idx: usize) -> Option<&str> {
        self.buckets.get(idx).map(|b| b.name.as_str())
    }
}

fn by_blended(a: &Ranked, b: &Ranked) -> std::cmp::Ordering {
    b.blended
        .total_cmp(&a.blended)
        .then_with(|| a.index.cmp(&b.index))
}

impl SelectionStrategy for BucketedStrategy {
    fn name(&self) -> &'static str {
        "bucketed"
    }

    fn select(&self, deduped: Vec<Candidate>, ctx: &SelectionContext) -> SelectionOutcome {
        let target = effective_target(self.cfg.per_run_cap, ctx.remaining_daily);
        let mut out = SelectionOutcome::default();

        let mut pools: Vec<Vec<Ranked>> = (0..self.buckets.len()).map(|_| Vec::new()).collect();
        let mut leftovers: Vec<Ranked> = Vec::new();

        for (index, mut c) in deduped.into_iter().enumerate() {
            if c.scores.total < self.cfg.min_rule_score {
                out.rejected_by_score += 1;
                continue;
            }
            if c.quality() < self.selection.quality_threshold {
                out.rejected_by_quality += 1;
                continue;
            }
            c.novelty = novelty(
                &c.topic_tags,
                &ctx.existing_topic_counts,
                self.selection.novelty_decay,
            );
            c.combined =
                self.selection.quality_weight * c.quality() + self.selection.novelty_weight * c.novelty;
            let ranked = Ranked {
                index,
                blended: self.blended(c.quality(), ctx.external_scores.get(&c.link).copied()),
                candidate: c,
            };
            match self.bucket_for(&ranked.candidate) {
                Some(b) => pools[b].push(ranked),
                None => leftovers.push(ranked),
            }
        }

        let mut quota = TopicQuota::new(self.selection.max_per_topic);

        for (bucket, mut pool) in self.buckets.iter().zip(pools) {
            pool.sort_by(by_blended);
            let mut taken = 0usize;
            for r in pool {
                if taken < bucket.quota
                    && out.selected.len() < target
                    && quota.fits(&r.candidate.topic_tags)
                {
                    quota.admit(&r.candidate.topic_tags);
                    out.selected.push(r.candidate);
                    taken += 1;
                } else {
                    leftovers.push(r);
                }
            }
            debug!(target: "curator::select", bucket = %bucket.name, taken, "bucket filled");
        }

        leftovers.sort_by(by_blended);
        for r in leftovers {
            if out.selected.len() >= target {
                out.overflow += 1;
                continue;
            }
            if !quota.fits(&r.candidate.topic_tags) {
                out.rejected_by_quota += 1;
                continue;
            }
            quota.admit(&r.candidate.topic_tags);
            out.selected.push(r.candidate);
        }

        debug!(
            target: "curator::select",
            strategy = "bucketed",
            target,
            selected = out.selected.len(),
            by_score = out.rejected_by_score,
            by_quality = out.rejected_by_quality,
            by_quota = out.rejected_by_quota,
            overflow = out.overflow,
            "selection done"
        );
        out
    }
}
