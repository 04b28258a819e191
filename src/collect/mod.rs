// src/collect/mod.rs
//! Collectors and the concurrent collection stage.
//!
//! Sources are fetched concurrently under a fixed limit with a per-source timeout.
//! A failing or slow source is logged, counted and excluded; it never fails the batch.
//! Output order follows collector order, then record order within each source.

pub mod feeds;
pub mod rss;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::candidate::{Candidate, RawRecord};
use crate::config::CollectConfig;
use crate::error::CurationError;
use crate::metrics::{ensure_described, CANDIDATES_TOTAL, REJECTED_TOTAL, SOURCE_ERRORS_TOTAL};

pub use feeds::{build_collectors, load_feeds_default, load_feeds_from, FeedSpec};
pub use rss::RssCollector;

#[async_trait]
pub trait Collector: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<Vec<RawRecord>, CurationError>;
}

#[derive(Debug, Default)]
pub struct CollectOutcome {
    pub candidates: Vec<Candidate>,
    pub fetched: usize,
    pub source_errors: usize,
    pub rejected_by_validation: usize,
}

/// Decode entities, strip tags, unify quotes, collapse whitespace, cap length.
pub fn normalize_text(s: &str, max_chars: usize) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    static RE_WS: OnceCell<Regex> = OnceCell::new();

    let decoded = html_escape::decode_html_entities(s);
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("static regex"));
    let stripped = re_tags.replace_all(&decoded, " ");

    let quoted = stripped
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace('\u{00A0}', " ");

    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("static regex"));
    let collapsed = re_ws.replace_all(&quoted, " ");
    let out = collapsed.trim();

    if out.chars().count() > max_chars {
        out.chars().take(max_chars).collect::<String>().trim_end().to_string()
    } else {
        out.to_string()
    }
}

/// Run every collector once, validate records at the boundary, and keep source order.
pub async fn collect_all(collectors: &[Box<dyn Collector>], cfg: &CollectConfig) -> CollectOutcome {
    ensure_described();
    let limit = cfg.concurrency.max(1);
    let timeout = Duration::from_secs(cfg.timeout_secs);

    let results: Vec<(String, Result<Vec<RawRecord>, CurationError>)> = stream::iter(collectors)
        .map(|c| async move {
            let name = c.name().to_string();
            let res = match tokio::time::timeout(timeout, c.fetch()).await {
                Ok(r) => r,
                Err(_) => Err(CurationError::SourceFetch {
                    source_name: name.clone(),
                    message: format!("timed out after {}s", timeout.as_secs()),
                }),
            };
            (name, res)
        })
        .buffered(limit)
        .collect()
        .await;

    let mut out = CollectOutcome::default();
    for (name, res) in results {
        match res {
            Ok(records) => {
                debug!(target: "curator::collect", source = %name, records = records.len(), "source fetched");
                out.fetched += records.len();
                for raw in records {
                    match Candidate::from_raw(raw) {
                        Ok(c) => out.candidates.push(c),
                        Err(e) => {
                            debug!(target: "curator::collect", source = %name, error = %e, "record rejected");
                            out.rejected_by_validation += 1;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(target: "curator::collect", source = %name, error = %e, "source failed; excluded");
                out.source_errors += 1;
            }
        }
    }

    counter!(CANDIDATES_TOTAL).increment(out.candidates.len() as u64);
    counter!(SOURCE_ERRORS_TOTAL).increment(out.source_errors as u64);
    counter!(REJECTED_TOTAL, "reason" => "validation").increment(out.rejected_by_validation as u64);
    info!(
        target: "curator::collect",
        sources = collectors.len(),
        candidates = out.candidates.len(),
        source_errors = out.source_errors,
        rejected = out.rejected_by_validation,
        "collection done"
    );
    out
}

/// Collector over a fixed in-memory batch.
#[derive(Debug, Clone)]
pub struct StaticCollector {
    name: String,
    records: Vec<RawRecord>,
}

impl StaticCollector {
    pub fn new(name: impl Into<String>, records: Vec<RawRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}

#[async_trait]
impl Collector for StaticCollector {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, CurationError> {
        Ok(self.records.clone())
    }
}
