// src/metrics.rs
//! Metric names, one-time descriptions, and the Prometheus `/metrics` route.

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub const CANDIDATES_TOTAL: &str = "curator_candidates_total";
pub const REJECTED_TOTAL: &str = "curator_rejected_total";
pub const SELECTED_TOTAL: &str = "curator_selected_total";
pub const SOURCE_ERRORS_TOTAL: &str = "curator_source_errors_total";
pub const ENRICHMENT_FAILURES_TOTAL: &str = "curator_enrichment_failures_total";
pub const PUBLISHED_ARTICLES: &str = "curator_published_articles";
pub const LAST_RUN_TS: &str = "curator_last_run_ts";

/// Register descriptions once so series show up on `/metrics` before first use.
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(CANDIDATES_TOTAL, "Valid candidates produced by collectors.");
        describe_counter!(
            REJECTED_TOTAL,
            "Candidates dropped, labelled by reason (score, dedup, quota, validation)."
        );
        describe_counter!(SELECTED_TOTAL, "Candidates selected for publishing.");
        describe_counter!(SOURCE_ERRORS_TOTAL, "Feed sources that failed or timed out.");
        describe_counter!(
            ENRICHMENT_FAILURES_TOTAL,
            "Enrichment calls that failed after retries."
        );
        describe_gauge!(PUBLISHED_ARTICLES, "Articles in the published snapshot.");
        describe_gauge!(LAST_RUN_TS, "Unix ts of the last completed curation run.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Fails if one is already installed.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("installing prometheus recorder")?;
        ensure_described();
        Ok(Self { handle })
    }

    /// Router exposing `/metrics` in the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
