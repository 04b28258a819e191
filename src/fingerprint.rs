// src/fingerprint.rs
//! Text signature and topic tags.
//!
//! The signature is the first K distinct content tokens in lexicographic order, so
//! word order and repeated words never change it. Topic tags come from a nested
//! `{topic → {subtopic → [keywords]}}` table plus location and urgency markers.

use std::collections::{BTreeSet, HashSet};

use crate::candidate::Candidate;
use crate::config::CurationConfig;
use crate::text::{fold, KeywordBank};

pub const URGENT_TAG: &str = "urgent";
pub const LOCATION_PREFIX: &str = "loc:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub signature: String,
    pub tags: BTreeSet<String>,
}

#[derive(Debug, Clone)]
struct Topic {
    name: String,
    subtopics: Vec<(String, KeywordBank)>,
}

#[derive(Debug, Clone)]
pub struct Fingerprinter {
    max_tokens: usize,
    delimiter: String,
    stopwords: HashSet<String>,
    topics: Vec<Topic>,
    locations: Vec<(String, KeywordBank)>,
    urgency: KeywordBank,
}

impl Fingerprinter {
    pub fn new(cfg: &CurationConfig) -> Self {
        let topics = cfg
            .topics
            .iter()
            .map(|(name, subs)| Topic {
                name: name.clone(),
                subtopics: subs
                    .iter()
                    .map(|(sub, kws)| (sub.clone(), KeywordBank::new(kws)))
                    .collect(),
            })
            .collect();

        Self {
            max_tokens: cfg.fingerprint.max_tokens,
            delimiter: cfg.fingerprint.delimiter.clone(),
            stopwords: cfg.fingerprint.stopwords.iter().map(|s| fold(s)).collect(),
            topics,
            locations: cfg
                .markers
                .location
                .iter()
                .map(|(name, kws)| (name.clone(), KeywordBank::new(kws)))
                .collect(),
            urgency: KeywordBank::new(&cfg.markers.urgency),
        }
    }

    pub fn fingerprint(&self, c: &Candidate) -> Fingerprint {
        let folded = fold(&format!("{} {}", c.title, c.summary));
        Fingerprint {
            signature: self.signature_of_folded(&folded),
            tags: self.tags(&folded),
        }
    }

    /// Fingerprint and tag a candidate in place.
    pub fn apply(&self, c: &mut Candidate) {
        let fp = self.fingerprint(c);
        c.fingerprint = fp.signature;
        c.topic_tags = fp.tags;
    }

    pub fn signature(&self, title: &str, summary: &str) -> String {
        self.signature_of_folded(&fold(&format!("{title} {summary}")))
    }

    fn signature_of_folded(&self, folded: &str) -> String {
        let spaced;
        let source = if self.delimiter.trim().is_empty() {
            folded
        } else {
            spaced = folded.replace(self.delimiter.as_str(), " ");
            spaced.as_str()
        };

        let tokens: BTreeSet<&str> = source
            .split_whitespace()
            .map(strip_token)
            .filter(|t| !t.is_empty() && !self.stopwords.contains(*t))
            .collect();

        tokens
            .into_iter()
            .take(self.max_tokens)
            .collect::<Vec<_>>()
            .join(&self.delimiter)
    }

    /// Split a stored signature back into its token set.
    pub fn signature_tokens<'a>(&self, signature: &'a str) -> BTreeSet<&'a str> {
        split_signature(signature, &self.delimiter)
    }

    /// One tag per topic (first matching subtopic), plus marker tags.
    pub fn tags(&self, folded: &str) -> BTreeSet<String> {
        let mut tags = BTreeSet::new();
        for topic in &self.topics {
            if topic.subtopics.iter().any(|(_, bank)| bank.matches(folded)) {
                tags.insert(topic.name.clone());
            }
        }
        for (name, bank) in &self.locations {
            if bank.matches(folded) {
                tags.insert(format!("{LOCATION_PREFIX}{name}"));
            }
        }
        if self.urgency.matches(folded) {
            tags.insert(URGENT_TAG.to_string());
        }
        tags
    }

    /// `topic:subtopic` for every matched topic, for diagnostics.
    pub fn topic_details(&self, text: &str) -> Vec<String> {
        let folded = fold(text);
        self.topics
            .iter()
            .filter_map(|t| {
                t.subtopics
                    .iter()
                    .find(|(_, bank)| bank.matches(&folded))
                    .map(|(sub, _)| format!("{}:{}", t.name, sub))
            })
            .collect()
    }
}

pub(crate) fn split_signature<'a>(signature: &'a str, delimiter: &str) -> BTreeSet<&'a str> {
    if signature.is_empty() {
        return BTreeSet::new();
    }
    if delimiter.is_empty() {
        return signature.split_whitespace().collect();
    }
    signature
        .split(delimiter)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Trim punctuation from token edges and drop a short elided prefix (`l'`, `d'`, `qu'`).
fn strip_token(raw: &str) -> &str {
    let t = raw.trim_matches(|c: char| !c.is_alphanumeric());
    match t.rfind(['\'', '’']) {
        Some(idx) if t[..idx].chars().count() <= 2 => {
            let rest = &t[idx..];
            let skip = rest.chars().next().map(char::len_utf8).unwrap_or(0);
            rest[skip..].trim_matches(|c: char| !c.is_alphanumeric())
        }
        _ => t,
    }
}
