// src/enrichment/mod.rs
//! Enrichment service: provider abstraction, retries, and the disabled fallback.
//!
//! The curation core never depends on this module succeeding. Every call is bounded
//! by a timeout and a fixed retry budget; callers treat an error as "no signal".

pub mod correction;
pub mod enhance;
pub mod openrouter;
pub mod relevance;
pub mod retry;
pub mod validate;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::config::enrichment::EnrichmentConfig;
use crate::error::{CurationError, EnrichmentError};

pub use openrouter::OpenRouterService;
pub use relevance::{score_headlines, ExternalScores, HeadlineScore};
pub use retry::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub text: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub cost_usd: f64,
}

#[async_trait]
pub trait EnrichmentService: Send + Sync {
    /// Provider name for logs and diagnostics.
    fn name(&self) -> &'static str;

    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, EnrichmentError>;

    /// Relevance of a headline on 0-10, plus the call's cost.
    async fn score_headline(&self, headline: &str) -> Result<HeadlineScore, EnrichmentError> {
        let reply = self
            .complete(&[ChatMessage::user(relevance::headline_prompt(headline))])
            .await?;
        Ok(HeadlineScore {
            relevance: relevance::parse_relevance(&reply.text)?,
            cost_usd: reply.cost_usd,
        })
    }
}

pub type DynEnrichment = Arc<dyn EnrichmentService>;

/// Always fails with [`EnrichmentError::Disabled`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledService;

#[async_trait]
impl EnrichmentService for DisabledService {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn complete(&self, _messages: &[ChatMessage]) -> Result<Completion, EnrichmentError> {
        Err(EnrichmentError::Disabled)
    }
}

/// Wraps a provider with per-call timeout and backoff.
pub struct RetryingService<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: EnrichmentService> RetryingService<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<S: EnrichmentService> EnrichmentService for RetryingService<S> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, EnrichmentError> {
        self.policy
            .run(self.inner.name(), || self.inner.complete(messages))
            .await
    }
}

/// Build the configured service. Disabled config yields [`DisabledService`].
pub fn build_service(cfg: &EnrichmentConfig) -> Result<DynEnrichment, CurationError> {
    if !cfg.enabled {
        info!(target: "curator::enrichment", "enrichment disabled; rule-only scores");
        return Ok(Arc::new(DisabledService));
    }
    let provider = OpenRouterService::new(cfg)?;
    info!(
        target: "curator::enrichment",
        provider = provider.name(),
        model = %cfg.model,
        "enrichment enabled"
    );
    Ok(Arc::new(RetryingService::new(
        provider,
        RetryPolicy::from_config(cfg),
    )))
}


#[cfg(test)]
mod tests {
    use super::test_support::ScriptedService;
    use super::*;

    #[tokio::test]
    async fn disabled_service_never_scores() {
        let err = DisabledService.score_headline("x").await.unwrap_err();
        assert!(matches!(err, EnrichmentError::Disabled));
    }

    #[tokio::test]
    async fn default_score_headline_parses_reply() {
        let svc = ScriptedService::new([Ok(" 7.5\n".to_string())]);
        let score = svc.score_headline("Grève SNCF").await.unwrap();
        assert_eq!(score.relevance, 7.5);
        assert_eq!(score.cost_usd, 0.001);
        let sent = svc.requests.lock().unwrap();
        assert!(sent[0][0].content.contains("Grève SNCF"));
    }

    #[test]
    fn disabled_config_builds_disabled_service() {
        let svc = build_service(&EnrichmentConfig::default()).unwrap();
        assert_eq!(svc.name(), "disabled");
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&ChatMessage::system("hi")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"hi"}"#);
    }
}
