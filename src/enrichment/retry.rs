// src/enrichment/retry.rs
//! Timeout + exponential backoff with full jitter for enrichment calls.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::config::enrichment::EnrichmentConfig;
use crate::error::EnrichmentError;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts including the first; at least 1.
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Bound on each individual attempt.
    pub timeout: Duration,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&EnrichmentConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &EnrichmentConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::from_millis(cfg.base_delay_ms),
            max_delay: Duration::from_millis(cfg.max_delay_ms),
            timeout: Duration::from_secs(cfg.timeout_secs),
            jitter: true,
        }
    }

    /// Upper bound of the wait after attempt `attempt` (0-based): `base·2^attempt`, capped.
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let millis = (self.base_delay.as_millis() as u64).saturating_mul(factor);
        Duration::from_millis(millis).min(self.max_delay)
    }

    /// Full jitter: uniform in `[0, ceiling]`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let ceiling = self.ceiling(attempt);
        if !self.jitter || ceiling.is_zero() {
            return ceiling;
        }
        let millis = rand::rng().random_range(0..=ceiling.as_millis() as u64);
        Duration::from_millis(millis)
    }

    /// Run `call` until it succeeds, fails with a non-retryable error, or the budget is spent.
    pub async fn run<T, F, Fut>(&self, op: &str, mut call: F) -> Result<T, EnrichmentError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, EnrichmentError>> + Send,
        T: Send,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0usize;
        loop {
            let result = match tokio::time::timeout(self.timeout, call()).await {
                Ok(r) => r,
                Err(_) => Err(EnrichmentError::Timeout(self.timeout.as_millis() as u64)),
            };
            match result {
                Ok(v) => return Ok(v),
                Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                    let wait = self.delay_for(attempt as u32);
                    warn!(
                        target: "curator::enrichment",
                        op,
                        attempt = attempt + 1,
                        wait_ms = wait.as_millis() as u64,
                        error = %e,
                        "enrichment call failed; retrying"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
