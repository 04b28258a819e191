// src/scoring/mod.rs
//! Multi-factor scorer: relevance, practical impact, newsworthiness.
//!
//! `total = (w_r·relevance + w_p·practical + w_n·newsworthiness + boosts) · trust`
//! and `quality = min(total / 3, 10)`. Every input comes from the injected
//! [`CurationConfig`]; the same text and config always produce the same scores.

pub mod indicators;

use serde::Serialize;

use crate::candidate::{Candidate, ScoreBreakdown};
use crate::config::{CurationConfig, ProfileOverlay, ScoringConfig};
use crate::error::CurationError;
use crate::source_weights::SourceTrustConfig;
use crate::text::{fold, KeywordBank};

pub use indicators::{EntityIndicators, IndicatorDetector};

/// Which relevance tier matched. First match wins, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceTier {
    High,
    Medium,
    National,
    Profile,
    Baseline,
}

/// Score breakdown plus the evidence behind it, for the debug endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreExplanation {
    pub scores: ScoreBreakdown,
    pub tier: RelevanceTier,
    pub matched_keyword: Option<String>,
    pub indicators: EntityIndicators,
    pub indicator_reasons: Vec<String>,
    pub boost: f64,
    pub trust: f64,
}

#[derive(Debug, Clone)]
pub struct Scorer {
    cfg: ScoringConfig,
    trust: SourceTrustConfig,
    high: KeywordBank,
    medium: KeywordBank,
    national: KeywordBank,
    profile: KeywordBank,
    breaking: KeywordBank,
    geopolitical: KeywordBank,
    detector: IndicatorDetector,
}

impl Scorer {
    pub fn new(config: &CurationConfig) -> Result<Self, CurationError> {
        let cfg = config.scoring.clone();
        let detector = IndicatorDetector::new(&cfg.practical.patterns)?;
        let mut scorer = Self {
            high: KeywordBank::new(&cfg.high_relevance),
            medium: KeywordBank::new(&cfg.medium_relevance),
            national: KeywordBank::new(&cfg.national_terms),
            profile: KeywordBank::default(),
            breaking: KeywordBank::new(&cfg.boosts.breaking),
            geopolitical: KeywordBank::new(&cfg.boosts.geopolitical),
            trust: config.source_trust.clone(),
            detector,
            cfg,
        };
        if let Some(p) = &config.profile {
            scorer = scorer.with_profile(p);
        }
        Ok(scorer)
    }

    /// Replace the profile keyword overlay.
    pub fn with_profile(mut self, overlay: &ProfileOverlay) -> Self {
        self.profile = KeywordBank::new(overlay.keywords());
        self
    }

    /// Score a candidate, detecting indicators from its text.
    pub fn score(&self, c: &Candidate) -> ScoreBreakdown {
        self.score_with(c, None)
    }

    /// Score a candidate with caller-supplied indicators when available.
    pub fn score_with(&self, c: &Candidate, indicators: Option<EntityIndicators>) -> ScoreBreakdown {
        self.explain_parts(
            &c.title,
            &c.summary,
            c.content.as_deref(),
            &c.source_name,
            indicators,
        )
        .scores
    }

    pub fn explain(&self, c: &Candidate) -> ScoreExplanation {
        self.explain_parts(
            &c.title,
            &c.summary,
            c.content.as_deref(),
            &c.source_name,
            None,
        )
    }

    /// Score loose text (debug endpoint and CLI).
    pub fn explain_text(&self, text: &str, source: &str) -> ScoreExplanation {
        self.explain_parts(text, "", None, source, None)
    }

    pub fn is_approved(&self, scores: &ScoreBreakdown) -> bool {
        scores.total >= self.cfg.approval_threshold
    }

    pub fn approval_threshold(&self) -> f64 {
        self.cfg.approval_threshold
    }

    fn explain_parts(
        &self,
        title: &str,
        summary: &str,
        content: Option<&str>,
        source: &str,
        indicators: Option<EntityIndicators>,
    ) -> ScoreExplanation {
        let folded = fold(&format!("{title} {summary}"));

        let (relevance, tier, matched_keyword) = self.relevance(&folded);

        // practical indicators come from the summary, or the title when there is none
        let practical_text = if summary.trim().is_empty() { title } else { summary };
        let indicators = indicators.unwrap_or_else(|| self.detector.detect(practical_text));
        let practical = self.practical(indicators);

        let body = if summary.trim().is_empty() {
            content.unwrap_or_default()
        } else {
            summary
        };
        let newsworthiness = self.newsworthiness(body);

        let w = &self.cfg.weights;
        let weighted =
            w.relevance * relevance + w.practical * practical + w.newsworthiness * newsworthiness;
        let boost = self.boost(&folded);
        let trust = self.trust.factor_for(source);
        let total = (weighted + boost) * trust;
        let quality = round3((total / 3.0).clamp(0.0, 10.0));

        ScoreExplanation {
            scores: ScoreBreakdown {
                relevance,
                practical,
                newsworthiness,
                total,
                quality,
            },
            tier,
            matched_keyword,
            indicators,
            indicator_reasons: self.detector.reasons(practical_text),
            boost,
            trust,
        }
    }

    /// Tiered lookup on folded text.
    pub fn relevance(&self, folded: &str) -> (f64, RelevanceTier, Option<String>) {
        let t = &self.cfg.tiers;
        let tiers = [
            (&self.high, t.high, RelevanceTier::High),
            (&self.medium, t.medium, RelevanceTier::Medium),
            (&self.national, t.medium, RelevanceTier::National),
            (&self.profile, t.profile, RelevanceTier::Profile),
        ];
        for (bank, value, tier) in tiers {
            if let Some(kw) = bank.first_match(folded) {
                return (value, tier, Some(kw.to_string()));
            }
        }
        (t.baseline, RelevanceTier::Baseline, None)
    }

    pub fn practical(&self, ind: EntityIndicators) -> f64 {
        let p = &self.cfg.practical;
        let mut score = 0.0;
        if ind.money {
            score += p.money;
        }
        if ind.date {
            score += p.date;
        }
        if ind.percent {
            score += p.percent;
        }
        if ind.org {
            score += p.org;
        }
        score.min(p.cap)
    }

    pub fn newsworthiness(&self, body: &str) -> f64 {
        let n = &self.cfg.newsworthiness;
        let words = body.split_whitespace().count() as f64;
        n.base + (words / n.words_per_point).min(n.cap)
    }

    /// Breaking and geopolitical boosts, each capped independently.
    pub fn boost(&self, folded: &str) -> f64 {
        let b = &self.cfg.boosts;
        let breaking = (self.breaking.count_matches(folded) as f64 * b.breaking_per_hit)
            .min(b.breaking_cap);
        let geo = (self.geopolitical.count_matches(folded) as f64 * b.geopolitical_per_hit)
            .min(b.geopolitical_cap);
        breaking + geo
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
