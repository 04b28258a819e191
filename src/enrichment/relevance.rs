// src/enrichment/relevance.rs
//! External headline relevance used by the bucketed strategy.

use std::collections::HashMap;
use tracing::{debug, warn};

use super::EnrichmentService;
use crate::candidate::Candidate;
use crate::error::EnrichmentError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlineScore {
    pub relevance: f64,
    pub cost_usd: f64,
}

/// Scores gathered for one run. Candidates that failed are simply absent.
#[derive(Debug, Clone, Default)]
pub struct ExternalScores {
    pub by_link: HashMap<String, f64>,
    pub failures: usize,
    pub cost_usd: f64,
}

pub(crate) fn headline_prompt(headline: &str) -> String {
    format!(
        "You are ranking French and world news for an expat professional living in France. \
         On a scale 0-10 (10 = extremely relevant), rate the relevance of this headline:\n\
         HEADLINE: \"{headline}\"\n\nRespond with ONLY the number."
    )
}

/// Parse a bare number in `[0, 10]`.
pub fn parse_relevance(reply: &str) -> Result<f64, EnrichmentError> {
    let trimmed = reply.trim().trim_end_matches('.');
    let value: f64 = trimmed
        .parse()
        .map_err(|_| EnrichmentError::InvalidResponse(format!("not a number: {trimmed:?}")))?;
    if !(0.0..=10.0).contains(&value) {
        return Err(EnrichmentError::InvalidResponse(format!(
            "relevance {value} outside 0-10"
        )));
    }
    Ok(value)
}

/// Score each candidate's title sequentially. Never fails: errors are counted.
pub async fn score_headlines(
    service: &dyn EnrichmentService,
    candidates: &[Candidate],
) -> ExternalScores {
    let mut out = ExternalScores::default();
    for c in candidates {
        match service.score_headline(&c.title).await {
            Ok(score) => {
                debug!(target: "curator::enrichment", id = %c.short_id(), relevance = score.relevance, "headline scored");
                out.cost_usd += score.cost_usd;
                out.by_link.insert(c.link.clone(), score.relevance);
            }
            Err(EnrichmentError::Disabled) => return out,
            Err(e) => {
                warn!(target: "curator::enrichment", id = %c.short_id(), error = %e, "headline scoring failed; rule-only");
                out.failures += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::test_support::candidate;
    use crate::enrichment::test_support::ScriptedService;
    use crate::enrichment::DisabledService;

    #[test]
    fn parses_bare_numbers_only() {
        assert_eq!(parse_relevance("8").unwrap(), 8.0);
        assert_eq!(parse_relevance(" 6.5.\n").unwrap(), 6.5);
        assert!(parse_relevance("eight").is_err());
        assert!(parse_relevance("11").is_err());
        assert!(parse_relevance("-1").is_err());
    }

    #[tokio::test]
    async fn failures_degrade_to_missing_scores() {
        let svc = ScriptedService::new([
            Ok("9".to_string()),
            Err(EnrichmentError::Timeout(30_000)),
            Ok("not a number".to_string()),
        ]);
        let batch = vec![candidate("a", 5.0), candidate("b", 5.0), candidate("c", 5.0)];
        let scores = score_headlines(&svc, &batch).await;
        assert_eq!(scores.by_link.len(), 1);
        assert_eq!(scores.by_link["https://news.example/a"], 9.0);
        assert_eq!(scores.failures, 2);
        assert!((scores.cost_usd - 0.001).abs() < 1e-12);
    }

    #[tokio::test]
    async fn disabled_service_stops_early_without_failures() {
        let batch = vec![candidate("a", 5.0), candidate("b", 5.0)];
        let scores = score_headlines(&DisabledService, &batch).await;
        assert!(scores.by_link.is_empty());
        assert_eq!(scores.failures, 0);
    }
}
