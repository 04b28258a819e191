// src/enrichment/enhance.rs
//! Titles + explanations enhancement of selected candidates.
//!
//! A valid titles payload makes a candidate `enhanced`; valid explanations on top make
//! it `display_ready`. Anything short of that is reported so the caller can queue the
//! candidate for backfill.

use tracing::{debug, warn};

use super::correction::request_validated;
use super::validate::{validate_explanations, validate_titles, TitlesPayload};
use super::{ChatMessage, EnrichmentService};
use crate::candidate::{Candidate, Enhancement};

const SYSTEM_PROMPT: &str = "You simplify French news for English-speaking learners of French.";
const EXCERPT_CHARS: usize = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhanceStatus {
    DisplayReady,
    /// Titles ok, explanations missing.
    Enhanced,
    /// Titles failed; candidate unchanged.
    Raw,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnhanceReport {
    pub status: EnhanceStatus,
    pub error: Option<String>,
    pub cost_usd: f64,
}

impl EnhanceReport {
    pub fn needs_backfill(&self) -> bool {
        self.status != EnhanceStatus::DisplayReady
    }
}

fn excerpt(c: &Candidate) -> String {
    let body = c.content.as_deref().unwrap_or(&c.summary);
    body.chars().take(EXCERPT_CHARS).collect()
}

pub(crate) fn titles_prompt(c: &Candidate) -> String {
    format!(
        "Rewrite this French news item for a B1 learner. Return ONLY a JSON object with keys \
         simplified_french_title, simplified_english_title (each at most 70 characters), \
         french_summary, english_summary (each 30-40 words), difficulty (CEFR A1-C2) and \
         tone (neutral, opinion, satire or other).\n\nTITLE: {}\n\nTEXT: {}",
        c.title,
        excerpt(c)
    )
}

pub(crate) fn explanations_prompt(c: &Candidate, titles: &TitlesPayload) -> String {
    format!(
        "For the difficult words of this French headline, return ONLY a JSON list of objects \
         with keys original_word, display_format, explanation and optional cultural_note.\n\n\
         HEADLINE: {}\nSIMPLIFIED: {}",
        c.title, titles.simplified_french_title
    )
}

pub struct Enhancer<'a> {
    service: &'a dyn EnrichmentService,
    max_corrections: usize,
}

impl<'a> Enhancer<'a> {
    pub fn new(service: &'a dyn EnrichmentService, max_corrections: usize) -> Self {
        Self {
            service,
            max_corrections,
        }
    }

    /// Enhance in place. Sets `enhanced` / `display_ready` and the payload.
    pub async fn enhance(&self, c: &mut Candidate) -> EnhanceReport {
        let titles = request_validated(
            self.service,
            vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(titles_prompt(c)),
            ],
            validate_titles,
            self.max_corrections,
        )
        .await;
        let mut cost_usd = titles.cost_usd;

        let titles = match titles.payload {
            Ok(t) => t,
            Err(reason) => {
                warn!(target: "curator::enrichment", id = %c.short_id(), reason = %reason, "titles failed");
                return EnhanceReport {
                    status: EnhanceStatus::Raw,
                    error: Some(reason),
                    cost_usd,
                };
            }
        };

        let explanations = request_validated(
            self.service,
            vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(explanations_prompt(c, &titles)),
            ],
            validate_explanations,
            self.max_corrections,
        )
        .await;
        cost_usd += explanations.cost_usd;

        let (status, error, items) = match explanations.payload {
            Ok(items) => (EnhanceStatus::DisplayReady, None, items),
            Err(reason) => {
                warn!(target: "curator::enrichment", id = %c.short_id(), reason = %reason, "explanations failed");
                (EnhanceStatus::Enhanced, Some(reason), Vec::new())
            }
        };

        c.enhancement = Some(Enhancement {
            simplified_title_fr: titles.simplified_french_title,
            simplified_title_en: titles.simplified_english_title,
            summary_fr: titles.french_summary,
            summary_en: titles.english_summary,
            difficulty: titles.difficulty,
            tone: titles.tone,
            explanations: items,
        });
        c.enhanced = true;
        c.display_ready = status == EnhanceStatus::DisplayReady;
        debug!(target: "curator::enrichment", id = %c.short_id(), ?status, "candidate enhanced");

        EnhanceReport {
            status,
            error,
            cost_usd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::test_support::candidate;
    use crate::enrichment::test_support::ScriptedService;
    use crate::enrichment::DisabledService;

    fn titles_reply() -> String {
        let summary = vec!["mot"; 32].join(" ");
        serde_json::json!({
            "simplified_french_title": "Il fait très chaud à Paris",
            "simplified_english_title": "It is very hot in Paris",
            "french_summary": summary,
            "english_summary": summary,
            "difficulty": "A2",
            "tone": "neutral",
        })
        .to_string()
    }

    const EXPLANATIONS: &str =
        r#"[{"original_word": "canicule", "display_format": "canicule", "explanation": "heat wave"}]"#;

    #[tokio::test]
    async fn both_payloads_make_display_ready() {
        let svc = ScriptedService::new([Ok(titles_reply()), Ok(EXPLANATIONS.to_string())]);
        let mut c = candidate("heat", 7.0);
        let report = Enhancer::new(&svc, 2).enhance(&mut c).await;
        assert_eq!(report.status, EnhanceStatus::DisplayReady);
        assert!(!report.needs_backfill());
        assert!(c.display_ready && c.enhanced);
        let e = c.enhancement.unwrap();
        assert_eq!(e.difficulty, "A2");
        assert_eq!(e.explanations.len(), 1);
    }

    #[tokio::test]
    async fn explanations_failure_leaves_enhanced_only() {
        let svc = ScriptedService::new([
            Ok(titles_reply()),
            Ok("nope".to_string()),
            Ok("still nope".to_string()),
        ]);
        let mut c = candidate("heat", 7.0);
        let report = Enhancer::new(&svc, 1).enhance(&mut c).await;
        assert_eq!(report.status, EnhanceStatus::Enhanced);
        assert!(report.needs_backfill());
        assert!(c.enhanced && !c.display_ready);
        assert!(c.enhancement.unwrap().has_simplified_content());
        assert_eq!(svc.calls(), 3);
    }

    #[tokio::test]
    async fn titles_failure_leaves_candidate_raw() {
        let mut c = candidate("heat", 7.0);
        let before = c.clone();
        let report = Enhancer::new(&DisabledService, 2).enhance(&mut c).await;
        assert_eq!(report.status, EnhanceStatus::Raw);
        assert!(report.error.unwrap().contains("disabled"));
        assert_eq!(c, before);
    }

    #[test]
    fn prompt_uses_bounded_excerpt() {
        let mut c = candidate("long", 7.0);
        c.content = Some("é".repeat(5_000));
        let prompt = titles_prompt(&c);
        assert_eq!(prompt.matches('é').count(), EXCERPT_CHARS);
    }
}
