// src/config/mod.rs
//! Curation configuration: keyword banks, weights, thresholds and paths.
//!
//! Loaded once from TOML, validated, then passed by reference into every component.
//! Nothing here is mutated after [`CurationConfig::from_toml`] returns.

pub mod enrichment;
pub(crate) mod seed;

use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::CurationError;
use crate::source_weights::SourceTrustConfig;

pub use enrichment::EnrichmentConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/curation.toml";

pub const ENV_CONFIG_PATH: &str = "CURATOR_CONFIG_PATH";
pub const ENV_QUALITY_THRESHOLD: &str = "CURATOR_QUALITY_THRESHOLD";
pub const ENV_PER_RUN_CAP: &str = "CURATOR_PER_RUN_CAP";
pub const ENV_DAILY_CAP: &str = "CURATOR_DAILY_CAP";
pub const ENV_MIN_RULE_SCORE: &str = "CURATOR_MIN_RULE_SCORE";

/// topic → subtopic → keywords
pub type TopicTable = BTreeMap<String, BTreeMap<String, Vec<String>>>;

#[derive(Debug, Clone, Deserialize)]
pub struct CurationConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default = "SourceTrustConfig::default_seed")]
    pub source_trust: SourceTrustConfig,
    #[serde(default)]
    pub fingerprint: FingerprintConfig,
    #[serde(default = "seed::topics")]
    pub topics: TopicTable,
    #[serde(default)]
    pub markers: MarkerConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub collect: CollectConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub profile: Option<ProfileOverlay>,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            source_trust: SourceTrustConfig::default_seed(),
            fingerprint: FingerprintConfig::default(),
            topics: seed::topics(),
            markers: MarkerConfig::default(),
            dedup: DedupConfig::default(),
            selection: SelectionConfig::default(),
            publish: PublishConfig::default(),
            collect: CollectConfig::default(),
            enrichment: EnrichmentConfig::default(),
            profile: None,
        }
    }
}

/* ----------------------------
Scoring
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_approval_threshold")]
    pub approval_threshold: f64,
    #[serde(default)]
    pub weights: FactorWeights,
    #[serde(default)]
    pub tiers: RelevanceTiers,
    #[serde(default = "seed::high_relevance")]
    pub high_relevance: Vec<String>,
    #[serde(default = "seed::medium_relevance")]
    pub medium_relevance: Vec<String>,
    #[serde(default = "seed::national_terms")]
    pub national_terms: Vec<String>,
    #[serde(default)]
    pub practical: PracticalConfig,
    #[serde(default)]
    pub newsworthiness: NewsworthinessConfig,
    #[serde(default)]
    pub boosts: BoostConfig,
    /// Max approved items tagged `global` kept per run.
    #[serde(default = "default_global_event_cap")]
    pub global_event_cap: usize,
}

fn default_approval_threshold() -> f64 {
    10.0
}
fn default_global_event_cap() -> usize {
    5
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            approval_threshold: default_approval_threshold(),
            weights: FactorWeights::default(),
            tiers: RelevanceTiers::default(),
            high_relevance: seed::high_relevance(),
            medium_relevance: seed::medium_relevance(),
            national_terms: seed::national_terms(),
            practical: PracticalConfig::default(),
            newsworthiness: NewsworthinessConfig::default(),
            boosts: BoostConfig::default(),
            global_event_cap: default_global_event_cap(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FactorWeights {
    pub relevance: f64,
    pub practical: f64,
    pub newsworthiness: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            relevance: 1.2,
            practical: 1.0,
            newsworthiness: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RelevanceTiers {
    pub high: f64,
    pub medium: f64,
    pub profile: f64,
    pub baseline: f64,
}

impl Default for RelevanceTiers {
    fn default() -> Self {
        Self {
            high: 9.0,
            medium: 7.0,
            profile: 6.0,
            baseline: 4.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PracticalConfig {
    #[serde(default = "default_money")]
    pub money: f64,
    #[serde(default = "default_date")]
    pub date: f64,
    #[serde(default = "default_one")]
    pub percent: f64,
    #[serde(default = "default_one")]
    pub org: f64,
    #[serde(default = "default_practical_cap")]
    pub cap: f64,
    #[serde(default)]
    pub patterns: IndicatorPatterns,
}

fn default_money() -> f64 {
    3.0
}
fn default_date() -> f64 {
    2.0
}
fn default_one() -> f64 {
    1.0
}
fn default_practical_cap() -> f64 {
    9.0
}

impl Default for PracticalConfig {
    fn default() -> Self {
        Self {
            money: default_money(),
            date: default_date(),
            percent: default_one(),
            org: default_one(),
            cap: default_practical_cap(),
            patterns: IndicatorPatterns::default(),
        }
    }
}

/// Regexes used to detect indicator categories when the caller supplies none.
#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorPatterns {
    #[serde(default = "seed::money_pattern")]
    pub money: String,
    #[serde(default = "seed::date_pattern")]
    pub date: String,
    #[serde(default = "seed::percent_pattern")]
    pub percent: String,
    #[serde(default = "seed::org_pattern")]
    pub org: String,
}

impl Default for IndicatorPatterns {
    fn default() -> Self {
        Self {
            money: seed::money_pattern(),
            date: seed::date_pattern(),
            percent: seed::percent_pattern(),
            org: seed::org_pattern(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NewsworthinessConfig {
    pub base: f64,
    pub words_per_point: f64,
    pub cap: f64,
}

impl Default for NewsworthinessConfig {
    fn default() -> Self {
        Self {
            base: 6.0,
            words_per_point: 100.0,
            cap: 4.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoostConfig {
    #[serde(default = "seed::breaking_terms")]
    pub breaking: Vec<String>,
    #[serde(default = "default_one")]
    pub breaking_per_hit: f64,
    #[serde(default = "default_boost_cap")]
    pub breaking_cap: f64,
    #[serde(default = "seed::geopolitical_patterns")]
    pub geopolitical: Vec<String>,
    #[serde(default = "default_geo_per_hit")]
    pub geopolitical_per_hit: f64,
    #[serde(default = "default_boost_cap")]
    pub geopolitical_cap: f64,
}

fn default_boost_cap() -> f64 {
    3.0
}
fn default_geo_per_hit() -> f64 {
    1.5
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            breaking: seed::breaking_terms(),
            breaking_per_hit: default_one(),
            breaking_cap: default_boost_cap(),
            geopolitical: seed::geopolitical_patterns(),
            geopolitical_per_hit: default_geo_per_hit(),
            geopolitical_cap: default_boost_cap(),
        }
    }
}

/// Keyword overlay built from a reader profile. Feeds the profile relevance tier only.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ProfileOverlay {
    #[serde(default)]
    pub work_domains: Vec<String>,
    #[serde(default)]
    pub pain_points: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

impl ProfileOverlay {
    pub fn keywords(&self) -> impl Iterator<Item = &String> {
        self.work_domains
            .iter()
            .chain(self.pain_points.iter())
            .chain(self.interests.iter())
    }
}

/* ----------------------------
Fingerprint / markers / dedup
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct FingerprintConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "seed::stopwords")]
    pub stopwords: Vec<String>,
}

fn default_max_tokens() -> usize {
    10
}
fn default_delimiter() -> String {
    "|".to_string()
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            delimiter: default_delimiter(),
            stopwords: seed::stopwords(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkerConfig {
    #[serde(default = "seed::location_markers")]
    pub location: BTreeMap<String, Vec<String>>,
    #[serde(default = "seed::urgency_markers")]
    pub urgency: Vec<String>,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            location: seed::location_markers(),
            urgency: seed::urgency_markers(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DedupConfig {
    pub token_weight: f64,
    pub topic_weight: f64,
    pub threshold: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            token_weight: 0.7,
            topic_weight: 0.3,
            threshold: 0.7,
        }
    }
}

/* ----------------------------
Selection
---------------------------- */

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Diversity,
    Bucketed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectionConfig {
    #[serde(default)]
    pub strategy: StrategyKind,
    #[serde(default = "default_target_count")]
    pub target_count: usize,
    #[serde(default = "default_max_per_topic")]
    pub max_per_topic: usize,
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: f64,
    #[serde(default = "default_quality_weight")]
    pub quality_weight: f64,
    #[serde(default = "default_novelty_weight")]
    pub novelty_weight: f64,
    #[serde(default = "default_novelty_decay")]
    pub novelty_decay: f64,
    #[serde(default)]
    pub bucketed: BucketedConfig,
}

fn default_target_count() -> usize {
    20
}
fn default_max_per_topic() -> usize {
    3
}
fn default_quality_threshold() -> f64 {
    5.0
}
fn default_quality_weight() -> f64 {
    0.6
}
fn default_novelty_weight() -> f64 {
    0.4
}
fn default_novelty_decay() -> f64 {
    0.2
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            target_count: default_target_count(),
            max_per_topic: default_max_per_topic(),
            quality_threshold: default_quality_threshold(),
            quality_weight: default_quality_weight(),
            novelty_weight: default_novelty_weight(),
            novelty_decay: default_novelty_decay(),
            bucketed: BucketedConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BucketedConfig {
    #[serde(default = "default_quality_weight")]
    pub rule_weight: f64,
    #[serde(default = "default_novelty_weight")]
    pub model_weight: f64,
    #[serde(default = "default_min_rule_score")]
    pub min_rule_score: f64,
    #[serde(default = "default_per_run_cap")]
    pub per_run_cap: usize,
    /// `None` means unlimited.
    #[serde(default)]
    pub daily_cap: Option<usize>,
    #[serde(default = "default_buckets")]
    pub buckets: Vec<BucketConfig>,
}

fn default_min_rule_score() -> f64 {
    12.0
}
fn default_per_run_cap() -> usize {
    20
}

fn default_buckets() -> Vec<BucketConfig> {
    vec![
        BucketConfig {
            name: "work_tech".into(),
            quota: 4,
            keywords: seed::work_tech_bucket(),
        },
        BucketConfig {
            name: "global_breaking".into(),
            quota: 3,
            keywords: seed::global_breaking_bucket(),
        },
        BucketConfig {
            name: "general".into(),
            quota: 3,
            keywords: Vec::new(),
        },
    ]
}

impl Default for BucketedConfig {
    fn default() -> Self {
        Self {
            rule_weight: default_quality_weight(),
            model_weight: default_novelty_weight(),
            min_rule_score: default_min_rule_score(),
            per_run_cap: default_per_run_cap(),
            daily_cap: None,
            buckets: default_buckets(),
        }
    }
}

/// A named bucket. An empty keyword list makes it the catch-all.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BucketConfig {
    pub name: String,
    pub quota: usize,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/* ----------------------------
Publish / collect
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct PublishConfig {
    #[serde(default = "default_rolling_cap")]
    pub rolling_cap: usize,
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
    #[serde(default = "default_backlog_path")]
    pub backlog_path: PathBuf,
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,
    #[serde(default = "default_archive_keep")]
    pub archive_keep: usize,
    #[serde(default = "default_max_backfill_attempts")]
    pub max_backfill_attempts: u32,
    #[serde(default = "default_backlog_max_age_hours")]
    pub backlog_max_age_hours: i64,
    #[serde(default = "default_backlog_max_entries")]
    pub backlog_max_entries: usize,
    /// A lock file older than this is treated as left behind by a dead publisher.
    #[serde(default = "default_lock_stale_secs")]
    pub lock_stale_secs: u64,
}

fn default_rolling_cap() -> usize {
    200
}
fn default_snapshot_path() -> PathBuf {
    PathBuf::from("data/live/rolling_articles.json")
}
fn default_backlog_path() -> PathBuf {
    PathBuf::from("data/live/backlog.json")
}
fn default_state_path() -> PathBuf {
    PathBuf::from("data/state.json")
}
fn default_archive_dir() -> PathBuf {
    PathBuf::from("data/backups")
}
fn default_archive_keep() -> usize {
    50
}
fn default_max_backfill_attempts() -> u32 {
    3
}
fn default_backlog_max_age_hours() -> i64 {
    24
}
fn default_backlog_max_entries() -> usize {
    100
}
fn default_lock_stale_secs() -> u64 {
    600
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            rolling_cap: default_rolling_cap(),
            snapshot_path: default_snapshot_path(),
            backlog_path: default_backlog_path(),
            state_path: default_state_path(),
            archive_dir: default_archive_dir(),
            archive_keep: default_archive_keep(),
            max_backfill_attempts: default_max_backfill_attempts(),
            backlog_max_age_hours: default_backlog_max_age_hours(),
            backlog_max_entries: default_backlog_max_entries(),
            lock_stale_secs: default_lock_stale_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_feeds_path")]
    pub feeds_path: PathBuf,
}

fn default_concurrency() -> usize {
    4
}
fn default_fetch_timeout_secs() -> u64 {
    20
}
fn default_feeds_path() -> PathBuf {
    PathBuf::from("config/feeds.toml")
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_secs: default_fetch_timeout_secs(),
            feeds_path: default_feeds_path(),
        }
    }
}

/* ----------------------------
Loading & validation
---------------------------- */

impl CurationConfig {
    /// Load using `CURATOR_CONFIG_PATH`, else `config/curation.toml`, else built-in defaults.
    /// An explicit env path that does not exist is an error. Env overrides are applied last,
    /// then the result is validated.
    pub fn from_toml() -> Result<Self, CurationError> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => Self::read_path(Path::new(&p))?,
            Err(_) => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::read_path(&default_path)?
                } else {
                    warn!(
                        target: "curator::config",
                        path = DEFAULT_CONFIG_PATH,
                        "config file not found, using built-in defaults"
                    );
                    Self::default()
                }
            }
        };
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load and validate one file. Env overrides are not applied.
    pub fn from_path(path: &Path) -> Result<Self, CurationError> {
        let cfg = Self::read_path(path)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load one file, apply env overrides, then validate.
    pub fn from_path_with_env(path: &Path) -> Result<Self, CurationError> {
        let mut cfg = Self::read_path(path)?;
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn read_path(path: &Path) -> Result<Self, CurationError> {
        let content = fs::read_to_string(path).map_err(|e| {
            CurationError::config(format!(
                "failed to read curation config at {}: {}",
                path.display(),
                e
            ))
        })?;
        let cfg = Self::parse(&content)?;
        info!(target: "curator::config", path = %path.display(), "curation config loaded");
        Ok(cfg)
    }

    fn parse(toml_str: &str) -> Result<Self, CurationError> {
        toml::from_str(toml_str).map_err(|e| CurationError::config(format!("malformed TOML: {e}")))
    }

    /// Parse and validate a TOML document. Env overrides are not applied.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, CurationError> {
        let cfg = Self::parse(toml_str)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `CURATOR_*` overrides. Unparseable values are configuration errors.
    pub fn apply_env_overrides(&mut self) -> Result<(), CurationError> {
        if let Some(v) = env_f64(ENV_QUALITY_THRESHOLD)? {
            self.selection.quality_threshold = v;
        }
        if let Some(v) = env_f64(ENV_MIN_RULE_SCORE)? {
            self.selection.bucketed.min_rule_score = v;
        }
        if let Ok(raw) = std::env::var(ENV_PER_RUN_CAP) {
            self.selection.bucketed.per_run_cap = raw.trim().parse().map_err(|_| {
                CurationError::config(format!("{ENV_PER_RUN_CAP} is not a count: {raw}"))
            })?;
        }
        if let Ok(raw) = std::env::var(ENV_DAILY_CAP) {
            self.selection.bucketed.daily_cap = parse_daily_cap(&raw)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), CurationError> {
        let s = &self.scoring;
        if s.high_relevance.iter().all(|k| k.trim().is_empty()) {
            return Err(CurationError::config("keyword bank `high_relevance` is empty"));
        }
        if s.medium_relevance.iter().all(|k| k.trim().is_empty()) {
            return Err(CurationError::config("keyword bank `medium_relevance` is empty"));
        }

        let named = [
            ("scoring.weights.relevance", s.weights.relevance),
            ("scoring.weights.practical", s.weights.practical),
            ("scoring.weights.newsworthiness", s.weights.newsworthiness),
            ("scoring.practical.cap", s.practical.cap),
            ("scoring.newsworthiness.words_per_point", s.newsworthiness.words_per_point),
            ("scoring.boosts.breaking_cap", s.boosts.breaking_cap),
            ("scoring.boosts.geopolitical_cap", s.boosts.geopolitical_cap),
            ("dedup.token_weight", self.dedup.token_weight),
            ("dedup.topic_weight", self.dedup.topic_weight),
            ("selection.quality_weight", self.selection.quality_weight),
            ("selection.novelty_weight", self.selection.novelty_weight),
            ("selection.novelty_decay", self.selection.novelty_decay),
            ("selection.bucketed.rule_weight", self.selection.bucketed.rule_weight),
            ("selection.bucketed.model_weight", self.selection.bucketed.model_weight),
        ];
        for (name, v) in named {
            if !v.is_finite() || v < 0.0 {
                return Err(CurationError::config(format!(
                    "`{name}` must be a finite, non-negative number (got {v})"
                )));
            }
        }
        if s.newsworthiness.words_per_point == 0.0 {
            return Err(CurationError::config(
                "`scoring.newsworthiness.words_per_point` must be positive",
            ));
        }

        let wsum = self.dedup.token_weight + self.dedup.topic_weight;
        if (wsum - 1.0).abs() > 1e-6 {
            return Err(CurationError::config(format!(
                "dedup weights must sum to 1.0 (got {wsum})"
            )));
        }
        if !(0.0..=1.0).contains(&self.dedup.threshold) {
            return Err(CurationError::config("`dedup.threshold` must be within 0..=1"));
        }
        if !(0.0..=10.0).contains(&self.selection.quality_threshold) {
            return Err(CurationError::config(
                "`selection.quality_threshold` must be within 0..=10",
            ));
        }
        if self.fingerprint.max_tokens == 0 {
            return Err(CurationError::config("`fingerprint.max_tokens` must be > 0"));
        }
        if !(1..=1000).contains(&self.publish.rolling_cap) {
            return Err(CurationError::config(
                "`publish.rolling_cap` must be within 1..=1000",
            ));
        }
        if self.collect.concurrency == 0 {
            return Err(CurationError::config("`collect.concurrency` must be > 0"));
        }

        let p = &s.practical.patterns;
        for (name, pat) in [
            ("money", &p.money),
            ("date", &p.date),
            ("percent", &p.percent),
            ("org", &p.org),
        ] {
            Regex::new(pat).map_err(|e| {
                CurationError::config(format!("indicator pattern `{name}` regex error: {e}"))
            })?;
        }

        for (topic, subs) in &self.topics {
            if subs.values().all(|kws| kws.is_empty()) {
                return Err(CurationError::config(format!(
                    "topic `{topic}` has no keywords"
                )));
            }
        }
        Ok(())
    }
}

fn env_f64(name: &str) -> Result<Option<f64>, CurationError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| CurationError::config(format!("{name} is not a number: {raw}"))),
        Err(_) => Ok(None),
    }
}

/// `""`, `"0"`, `"none"` and `"unlimited"` mean no daily ceiling.
pub fn parse_daily_cap(raw: &str) -> Result<Option<usize>, CurationError> {
    let v = raw.trim().to_ascii_lowercase();
    if matches!(v.as_str(), "" | "0" | "none" | "unlimited") {
        return Ok(None);
    }
    v.parse::<usize>()
        .map(Some)
        .map_err(|_| CurationError::config(format!("{ENV_DAILY_CAP} is not a count: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn defaults_validate() {
        CurationConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_toml_is_the_default_seed() {
        let cfg = CurationConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.scoring.high_relevance, seed::high_relevance());
        assert_eq!(cfg.dedup.threshold, 0.7);
        assert_eq!(cfg.selection.strategy, StrategyKind::Diversity);
        assert_eq!(cfg.topics, seed::topics());
    }

    #[test]
    fn empty_high_bank_is_rejected() {
        let err = CurationConfig::from_toml_str("[scoring]\nhigh_relevance = []\n").unwrap_err();
        assert!(matches!(err, CurationError::Configuration(_)));
    }

    #[test]
    fn dedup_weights_must_sum_to_one() {
        let err = CurationConfig::from_toml_str(
            "[dedup]\ntoken_weight = 0.5\ntopic_weight = 0.2\nthreshold = 0.7\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn negative_weight_is_rejected() {
        let err = CurationConfig::from_toml_str(
            "[scoring.weights]\nrelevance = -1.0\npractical = 1.0\nnewsworthiness = 0.8\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("scoring.weights.relevance"));
    }

    #[test]
    fn bad_indicator_regex_is_rejected() {
        let err =
            CurationConfig::from_toml_str("[scoring.practical.patterns]\nmoney = \"(\"\n")
                .unwrap_err();
        assert!(err.to_string().contains("money"));
    }

    #[test]
    fn daily_cap_parsing() {
        assert_eq!(parse_daily_cap("").unwrap(), None);
        assert_eq!(parse_daily_cap("unlimited").unwrap(), None);
        assert_eq!(parse_daily_cap(" 0 ").unwrap(), None);
        assert_eq!(parse_daily_cap("30").unwrap(), Some(30));
        assert!(parse_daily_cap("many").is_err());
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_apply() {
        env::set_var(ENV_QUALITY_THRESHOLD, "6.5");
        env::set_var(ENV_PER_RUN_CAP, "7");
        env::set_var(ENV_DAILY_CAP, "none");
        let mut cfg = CurationConfig::default();
        cfg.apply_env_overrides().unwrap();
        assert_eq!(cfg.selection.quality_threshold, 6.5);
        assert_eq!(cfg.selection.bucketed.per_run_cap, 7);
        assert_eq!(cfg.selection.bucketed.daily_cap, None);

        env::set_var(ENV_QUALITY_THRESHOLD, "abc");
        assert!(cfg.apply_env_overrides().is_err());

        env::remove_var(ENV_QUALITY_THRESHOLD);
        env::remove_var(ENV_PER_RUN_CAP);
        env::remove_var(ENV_DAILY_CAP);
    }

    #[serial_test::serial]
    #[test]
    fn missing_env_path_is_an_error() {
        env::set_var(ENV_CONFIG_PATH, "__curation_config_should_not_exist__.toml");
        let err = CurationConfig::from_toml().unwrap_err();
        assert!(err.is_fatal());
        env::remove_var(ENV_CONFIG_PATH);
    }
}
