// src/select/diversity.rs
//! Quality + novelty ranking with a per-topic cap.

use tracing::debug;

use super::{effective_target, novelty, SelectionContext, SelectionOutcome, SelectionStrategy, TopicQuota};
use crate::candidate::Candidate;
use crate::config::{CurationConfig, SelectionConfig};

#[derive(Debug, Clone)]
pub struct DiversityStrategy {
    cfg: SelectionConfig,
}

impl DiversityStrategy {
    pub fn new(cfg: &CurationConfig) -> Self {
        Self {
            cfg: cfg.selection.clone(),
        }
    }

    /// Fill `novelty` and `combined` from the existing topic counts.
    pub fn rank(&self, pool: &mut [Candidate], ctx: &SelectionContext) {
        for c in pool.iter_mut() {
            c.novelty = novelty(&c.topic_tags, &ctx.existing_topic_counts, self.cfg.novelty_decay);
            c.combined = self.cfg.quality_weight * c.quality() + self.cfg.novelty_weight * c.novelty;
        }
        // stable: ties keep arrival order
        pool.sort_by(|a, b| b.combined.total_cmp(&a.combined));
    }
}

impl SelectionStrategy for DiversityStrategy {
    fn name(&self) -> &'static str {
        "diversity"
    }

    fn select(&self, mut deduped: Vec<Candidate>, ctx: &SelectionContext) -> SelectionOutcome {
        self.rank(&mut deduped, ctx);

        let target = effective_target(self.cfg.target_count, ctx.remaining_daily);
        let mut quota = TopicQuota::new(self.cfg.max_per_topic);
        let mut out = SelectionOutcome::default();

        for c in deduped {
            if c.quality() < self.cfg.quality_threshold {
                out.rejected_by_quality += 1;
                continue;
            }
            if out.selected.len() >= target {
                out.overflow += 1;
                continue;
            }
            if !quota.fits(&c.topic_tags) {
                out.rejected_by_quota += 1;
                continue;
            }
            quota.admit(&c.topic_tags);
            out.selected.push(c);
        }

        debug!(
            target: "curator::select",
            strategy = "diversity",
            selected = out.selected.len(),
            by_quality = out.rejected_by_quality,
            by_quota = out.rejected_by_quota,
            overflow = out.overflow,
            "selection done"
        );
        out
    }
}
