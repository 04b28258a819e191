// src/candidate.rs
//! The one record type that flows through the pipeline.
//!
//! Collectors emit [`RawRecord`]s; [`Candidate::from_raw`] is the only way in, so every
//! candidate downstream has a non-empty title, a source and an absolute http(s) link.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::CurationError;

/// Record as produced by a collector, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawRecord {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: Option<String>,
    pub link: String,
    pub source_name: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    pub relevance: f64,
    pub practical: f64,
    pub newsworthiness: f64,
    pub total: f64,
    pub quality: f64,
}

/// One contextual explanation (tooltip) for a word in the simplified text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Explanation {
    pub original_word: String,
    pub display_format: String,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_note: Option<String>,
}

/// Output of the enhancement step.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Enhancement {
    pub simplified_title_fr: String,
    pub simplified_title_en: String,
    pub summary_fr: String,
    pub summary_en: String,
    pub difficulty: String,
    pub tone: String,
    #[serde(default)]
    pub explanations: Vec<Explanation>,
}

impl Enhancement {
    pub fn has_simplified_content(&self) -> bool {
        !self.simplified_title_fr.trim().is_empty() || !self.summary_fr.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub link: String,
    pub source_name: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub topic_tags: BTreeSet<String>,
    #[serde(default)]
    pub scores: ScoreBreakdown,
    #[serde(default)]
    pub novelty: f64,
    #[serde(default)]
    pub combined: f64,
    #[serde(default)]
    pub fingerprint: String,
    #[serde(default)]
    pub display_ready: bool,
    #[serde(default)]
    pub enhanced: bool,
    #[serde(default)]
    pub backfill_attempts: u32,
    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhancement: Option<Enhancement>,
}

/// Fields handed to downstream enhancement.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HandOff<'a> {
    pub title: &'a str,
    pub link: &'a str,
    pub source: &'a str,
    pub published_at: Option<DateTime<Utc>>,
    pub score_breakdown: ScoreBreakdown,
}

impl Candidate {
    /// Validate a raw record at the collector boundary.
    pub fn from_raw(raw: RawRecord) -> Result<Self, CurationError> {
        let link = raw.link.trim().to_string();
        check_required(&raw.title, &link, &raw.source_name)?;

        Ok(Self {
            title: raw.title.trim().to_string(),
            summary: raw.summary.trim().to_string(),
            content: raw.content.filter(|c| !c.trim().is_empty()),
            link,
            source_name: raw.source_name.trim().to_string(),
            published_at: raw.published_at,
            topic_tags: BTreeSet::new(),
            scores: ScoreBreakdown::default(),
            novelty: 0.0,
            combined: 0.0,
            fingerprint: String::new(),
            display_ready: false,
            enhanced: false,
            backfill_attempts: 0,
            processed_at: None,
            enhancement: None,
        })
    }

    /// Re-check required fields right before publishing.
    pub fn validate(&self) -> Result<(), CurationError> {
        check_required(&self.title, &self.link, &self.source_name)
    }

    /// Title and summary joined, the input of scoring and fingerprinting.
    pub fn text(&self) -> String {
        if self.summary.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.title, self.summary)
        }
    }

    pub fn quality(&self) -> f64 {
        self.scores.quality
    }

    /// Published timestamp, falling back to processing time.
    pub fn recency_key(&self) -> Option<DateTime<Utc>> {
        self.published_at.or(self.processed_at)
    }

    /// Short, non-reversible identifier for logs.
    pub fn short_id(&self) -> String {
        short_hash(&self.link)
    }

    pub fn handoff(&self) -> HandOff<'_> {
        HandOff {
            title: &self.title,
            link: &self.link,
            source: &self.source_name,
            published_at: self.published_at,
            score_breakdown: self.scores,
        }
    }
}

fn check_required(title: &str, link: &str, source: &str) -> Result<(), CurationError> {
    let invalid = |reason: &str| CurationError::Validation {
        link: link.to_string(),
        reason: reason.to_string(),
    };

    if title.trim().is_empty() {
        return Err(invalid("missing title"));
    }
    if source.trim().is_empty() {
        return Err(invalid("missing source name"));
    }
    match url::Url::parse(link.trim()) {
        Ok(u) if matches!(u.scheme(), "http" | "https") && u.host_str().is_some() => Ok(()),
        Ok(_) => Err(invalid("link is not http(s)")),
        Err(_) => Err(invalid("link is not an absolute URL")),
    }
}

/// First 6 bytes of SHA-256, hex encoded.
pub(crate) fn short_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;

    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}


#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str, link: &str) -> RawRecord {
        RawRecord {
            title: title.into(),
            summary: " résumé ".into(),
            content: Some("   ".into()),
            link: link.into(),
            source_name: "Le Monde".into(),
            published_at: None,
        }
    }

    #[test]
    fn from_raw_trims_and_drops_blank_content() {
        let c = Candidate::from_raw(raw(" Grève SNCF ", " https://lemonde.fr/a ")).unwrap();
        assert_eq!(c.title, "Grève SNCF");
        assert_eq!(c.summary, "résumé");
        assert_eq!(c.link, "https://lemonde.fr/a");
        assert!(c.content.is_none());
        assert_eq!(c.text(), "Grève SNCF résumé");
    }

    #[test]
    fn from_raw_rejects_missing_title_and_bad_links() {
        for (title, link) in [
            ("", "https://lemonde.fr/a"),
            ("ok", "lemonde.fr/a"),
            ("ok", "ftp://lemonde.fr/a"),
            ("ok", ""),
        ] {
            let err = Candidate::from_raw(raw(title, link)).unwrap_err();
            assert!(matches!(err, CurationError::Validation { .. }), "{title} {link}");
        }
    }

    #[test]
    fn short_id_is_stable_and_short() {
        let c = Candidate::from_raw(raw("t", "https://lemonde.fr/a")).unwrap();
        assert_eq!(c.short_id(), c.short_id());
        assert_eq!(c.short_id().len(), 12);
    }

    #[test]
    fn recency_falls_back_to_processed_at() {
        let mut c = Candidate::from_raw(raw("t", "https://lemonde.fr/a")).unwrap();
        assert!(c.recency_key().is_none());
        let now = Utc::now();
        c.processed_at = Some(now);
        assert_eq!(c.recency_key(), Some(now));
    }
}
