// src/pipeline.rs
//! Curation run: collect → score → fingerprint → dedupe → select → enhance → publish.
//!
//! [`CurationEngine`] is the pure, synchronous core. [`Curator`] adds the I/O around
//! it: collectors, the enrichment service, the snapshot store, the backlog and the
//! daily counter. Only configuration and persistence errors end a run early.

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::candidate::Candidate;
use crate::collect::{collect_all, Collector};
use crate::config::{CurationConfig, StrategyKind};
use crate::dedup::Deduplicator;
use crate::enrichment::enhance::{EnhanceStatus, Enhancer};
use crate::enrichment::{score_headlines, DynEnrichment};
use crate::error::CurationError;
use crate::fingerprint::Fingerprinter;
use crate::metrics::{
    ensure_described, ENRICHMENT_FAILURES_TOTAL, LAST_RUN_TS, PUBLISHED_ARTICLES,
    REJECTED_TOTAL, SELECTED_TOTAL,
};
use crate::publish::{Backlog, DailyState, SnapshotStore, Tier};
use crate::scoring::Scorer;
use crate::select::{
    strategy_from_config, topic_counts, SelectionContext, SelectionStrategy, SelectionSummary,
    TopicCounts,
};

pub const GLOBAL_TAG: &str = "global";

/// Counts for every stage of one run. Always returned, also on a no-op run.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RunReport {
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub collected: usize,
    pub source_errors: usize,
    pub rejected_by_validation: usize,
    pub scored: usize,
    pub rejected_by_score: usize,
    pub rejected_by_global_cap: usize,
    pub already_published: usize,
    pub rejected_by_dedup: usize,
    pub rejected_by_quality: usize,
    pub rejected_by_quota: usize,
    pub overflow: usize,
    pub selected: usize,
    pub selection: Option<SelectionSummary>,
    pub enhanced: usize,
    pub display_ready: usize,
    pub enrichment_failures: usize,
    pub backfilled: usize,
    pub backlog_size: usize,
    pub published_total: usize,
    pub published_tier: Option<Tier>,
    pub cost_usd: f64,
    /// The daily allowance was already used up; nothing was collected or published.
    pub skipped: bool,
}

/// Scored, tagged and deduplicated pool, ready for selection.
#[derive(Debug, Clone, Default)]
pub struct Prepared {
    pub pool: Vec<Candidate>,
    pub existing_topic_counts: TopicCounts,
    pub report: RunReport,
}

#[derive(Debug, Clone, Default)]
pub struct Curation {
    pub selected: Vec<Candidate>,
    pub report: RunReport,
}

pub struct CurationEngine {
    scorer: Scorer,
    fingerprinter: Fingerprinter,
    deduplicator: Deduplicator,
    strategy: Box<dyn SelectionStrategy>,
    global_event_cap: usize,
}

impl CurationEngine {
    pub fn new(cfg: &CurationConfig) -> Result<Self, CurationError> {
        Ok(Self {
            scorer: Scorer::new(cfg)?,
            fingerprinter: Fingerprinter::new(cfg),
            deduplicator: Deduplicator::new(cfg),
            strategy: strategy_from_config(cfg),
            global_event_cap: cfg.scoring.global_event_cap,
        })
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn fingerprinter(&self) -> &Fingerprinter {
        &self.fingerprinter
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Score, approve, tag, cap global events, skip published links, dedupe.
    pub fn prepare(&self, candidates: Vec<Candidate>, published: &[Candidate]) -> Prepared {
        let mut report = RunReport {
            scored: candidates.len(),
            ..Default::default()
        };

        let mut approved = Vec::with_capacity(candidates.len());
        for mut c in candidates {
            c.scores = self.scorer.score(&c);
            if self.scorer.is_approved(&c.scores) {
                self.fingerprinter.apply(&mut c);
                approved.push(c);
            } else {
                report.rejected_by_score += 1;
            }
        }

        let before = approved.len();
        let approved = cap_tagged(approved, GLOBAL_TAG, self.global_event_cap);
        report.rejected_by_global_cap = before - approved.len();

        let known: HashSet<&str> = published.iter().map(|c| c.link.as_str()).collect();
        let before = approved.len();
        let fresh: Vec<Candidate> = approved
            .into_iter()
            .filter(|c| !known.contains(c.link.as_str()))
            .collect();
        report.already_published = before - fresh.len();

        let dedup = self.deduplicator.dedupe(fresh);
        report.rejected_by_dedup = dedup.discarded();
        for cl in &dedup.clusters {
            debug!(
                target: "curator::dedup",
                discarded = cl.discarded,
                seed = %crate::candidate::short_hash(&cl.seed_link),
                survivor = %crate::candidate::short_hash(&cl.survivor_link),
                "cluster merged"
            );
        }

        Prepared {
            pool: dedup.survivors,
            existing_topic_counts: topic_counts(published),
            report,
        }
    }

    /// Run the configured strategy and stamp the selection with `now`.
    pub fn select(
        &self,
        prepared: Prepared,
        external_scores: HashMap<String, f64>,
        remaining_daily: Option<usize>,
        now: DateTime<Utc>,
    ) -> Curation {
        let ctx = SelectionContext {
            existing_topic_counts: prepared.existing_topic_counts,
            external_scores,
            remaining_daily,
        };
        let outcome = self.strategy.select(prepared.pool, &ctx);

        let mut report = prepared.report;
        report.rejected_by_score += outcome.rejected_by_score;
        report.rejected_by_quality = outcome.rejected_by_quality;
        report.rejected_by_quota = outcome.rejected_by_quota;
        report.overflow = outcome.overflow;
        report.selection = Some(outcome.summary(self.strategy.name()));

        let mut selected = outcome.selected;
        for c in &mut selected {
            c.processed_at = Some(now);
        }
        report.selected = selected.len();
        Curation { selected, report }
    }

    /// Pure curation of one batch.
    pub fn curate(
        &self,
        candidates: Vec<Candidate>,
        published: &[Candidate],
        external_scores: HashMap<String, f64>,
        remaining_daily: Option<usize>,
        now: DateTime<Utc>,
    ) -> Curation {
        let prepared = self.prepare(candidates, published);
        self.select(prepared, external_scores, remaining_daily, now)
    }
}

/// Keep at most `cap` candidates tagged `tag` (highest total first); others pass untouched.
/// Input order is preserved.
pub fn cap_tagged(candidates: Vec<Candidate>, tag: &str, cap: usize) -> Vec<Candidate> {
    let mut tagged: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.topic_tags.contains(tag))
        .map(|(i, _)| i)
        .collect();
    if tagged.len() <= cap {
        return candidates;
    }
    tagged.sort_by(|&a, &b| candidates[b].scores.total.total_cmp(&candidates[a].scores.total));
    let dropped: BTreeSet<usize> = tagged.into_iter().skip(cap).collect();
    candidates
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !dropped.contains(i))
        .map(|(_, c)| c)
        .collect()
}

/// One-shot curator with its collaborators.
pub struct Curator {
    config: CurationConfig,
    engine: CurationEngine,
    collectors: Vec<Box<dyn Collector>>,
    service: DynEnrichment,
    store: SnapshotStore,
}

impl Curator {
    pub fn new(
        config: CurationConfig,
        collectors: Vec<Box<dyn Collector>>,
        service: DynEnrichment,
    ) -> Result<Self, CurationError> {
        let engine = CurationEngine::new(&config)?;
        let store = SnapshotStore::new(&config.publish);
        Ok(Self {
            config,
            engine,
            collectors,
            service,
            store,
        })
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    fn enhancement_on(&self) -> bool {
        self.config.enrichment.enabled && self.config.enrichment.enhance
    }

    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<RunReport, CurationError> {
        ensure_described();
        let publish_cfg = &self.config.publish;
        let enrich_cfg = &self.config.enrichment;

        let mut state = DailyState::load(&publish_cfg.state_path, now.date_naive())?;
        let remaining = state.remaining(self.config.selection.bucketed.daily_cap);
        if remaining == Some(0) {
            info!(
                target: "curator::pipeline",
                published_today = state.published_today,
                "daily cap reached; nothing to do"
            );
            return Ok(RunReport {
                started_at: Some(now),
                finished_at: Some(Utc::now()),
                skipped: true,
                ..Default::default()
            });
        }

        let mut backlog = Backlog::load(&publish_cfg.backlog_path)?;
        backlog.prune(
            now,
            publish_cfg.backlog_max_age_hours,
            publish_cfg.max_backfill_attempts,
            publish_cfg.backlog_max_entries,
        );
        let published = self.store.load()?;

        let mut cost_usd = 0.0;
        let mut enrichment_failures = 0;
        let mut to_publish: Vec<Candidate> = Vec::new();

        // backfill first so retried items are not crowded out by fresh ones
        let mut backfilled = 0;
        if self.enhancement_on() {
            let enhancer = Enhancer::new(self.service.as_ref(), enrich_cfg.max_corrections);
            for entry in backlog.take_batch(enrich_cfg.backfill_limit) {
                let mut c = entry.candidate.clone();
                let outcome = enhancer.enhance(&mut c).await;
                cost_usd += outcome.cost_usd;
                c.processed_at = Some(now);
                if outcome.needs_backfill() {
                    enrichment_failures += 1;
                    backlog.requeue(entry, c.clone(), outcome.error.clone().unwrap_or_default());
                }
                if outcome.status != EnhanceStatus::Raw {
                    backfilled += 1;
                    to_publish.push(c);
                }
            }
        }

        let collected = collect_all(&self.collectors, &self.config.collect).await;
        let prepared = self.engine.prepare(collected.candidates, &published);

        let mut external = HashMap::new();
        if self.config.selection.strategy == StrategyKind::Bucketed && enrich_cfg.enabled {
            let scores = score_headlines(self.service.as_ref(), &prepared.pool).await;
            cost_usd += scores.cost_usd;
            enrichment_failures += scores.failures;
            external = scores.by_link;
        }

        let Curation {
            mut selected,
            mut report,
        } = self.engine.select(prepared, external, remaining, now);
        report.started_at = Some(now);
        report.collected = collected.fetched;
        report.source_errors = collected.source_errors;
        report.rejected_by_validation = collected.rejected_by_validation;

        if self.enhancement_on() {
            let enhancer = Enhancer::new(self.service.as_ref(), enrich_cfg.max_corrections);
            for c in &mut selected {
                let outcome = enhancer.enhance(c).await;
                cost_usd += outcome.cost_usd;
                if outcome.needs_backfill() {
                    enrichment_failures += 1;
                    backlog.push_failure(c.clone(), outcome.error.unwrap_or_default(), now);
                }
            }
        }
        let fresh: HashSet<String> = selected.iter().map(|c| c.link.clone()).collect();
        to_publish.extend(selected);

        let before = to_publish.len();
        to_publish.retain(|c| match c.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!(target: "curator::pipeline", id = %c.short_id(), error = %e, "dropped before publish");
                false
            }
        });
        report.rejected_by_validation += before - to_publish.len();

        report.enhanced = to_publish.iter().filter(|c| c.enhanced).count();
        report.display_ready = to_publish.iter().filter(|c| c.display_ready).count();

        // only fresh items that made it into the snapshot count against the daily cap
        let mut landed = 0;
        if to_publish.is_empty() {
            report.published_total = published.len();
        } else {
            let snapshot = self.store.publish(to_publish, now)?;
            landed = snapshot
                .articles
                .iter()
                .filter(|c| fresh.contains(&c.link))
                .count();
            report.published_total = snapshot.metadata.total;
            report.published_tier = Some(snapshot.metadata.tier);
            gauge!(PUBLISHED_ARTICLES).set(snapshot.metadata.total as f64);
        }

        state.record(landed);
        state.save(&publish_cfg.state_path)?;
        backlog.save(&publish_cfg.backlog_path)?;

        report.backfilled = backfilled;
        report.backlog_size = backlog.len();
        report.enrichment_failures = enrichment_failures;
        report.cost_usd = cost_usd;
        report.finished_at = Some(Utc::now());

        record_metrics(&report);
        info!(
            target: "curator::pipeline",
            strategy = self.engine.strategy_name(),
            collected = report.collected,
            selected = report.selected,
            rejected_by_score = report.rejected_by_score,
            rejected_by_dedup = report.rejected_by_dedup,
            rejected_by_quota = report.rejected_by_quota,
            enrichment_failures = report.enrichment_failures,
            published_total = report.published_total,
            cost_usd = report.cost_usd,
            "run complete"
        );
        Ok(report)
    }
}

fn record_metrics(r: &RunReport) {
    for (reason, n) in [
        ("score", r.rejected_by_score + r.rejected_by_global_cap),
        ("dedup", r.rejected_by_dedup),
        ("quota", r.rejected_by_quota),
        ("quality", r.rejected_by_quality),
    ] {
        counter!(REJECTED_TOTAL, "reason" => reason).increment(n as u64);
    }
    counter!(SELECTED_TOTAL).increment(r.selected as u64);
    counter!(ENRICHMENT_FAILURES_TOTAL).increment(r.enrichment_failures as u64);
    if let Some(done) = r.finished_at {
        gauge!(LAST_RUN_TS).set(done.timestamp() as f64);
    }
}
