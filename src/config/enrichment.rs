// src/config/enrichment.rs
use serde::Deserialize;
use std::env;

use crate::error::CurationError;

pub const ENV_OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Only "openrouter" is supported (case-insensitive).
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from OPENROUTER_API_KEY.
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempts per call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Corrective re-prompts allowed after the first invalid payload.
    #[serde(default = "default_max_corrections")]
    pub max_corrections: usize,
    /// Backlog entries retried per run.
    #[serde(default = "default_backfill_limit")]
    pub backfill_limit: usize,
    /// Run the titles/explanations enhancement on selected items.
    #[serde(default = "default_enhance")]
    pub enhance: bool,
    /// USD per 1k prompt tokens.
    #[serde(default = "default_price_in")]
    pub price_in_per_1k: f64,
    /// USD per 1k completion tokens.
    #[serde(default = "default_price_out")]
    pub price_out_per_1k: f64,
}

fn default_provider() -> String {
    "openrouter".into()
}
fn default_model() -> String {
    "mistralai/mistral-large-2411".into()
}
fn default_api_key() -> String {
    "ENV".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_attempts() -> usize {
    3
}
fn default_base_delay_ms() -> u64 {
    500
}
fn default_max_delay_ms() -> u64 {
    8_000
}
fn default_max_corrections() -> usize {
    2
}
fn default_backfill_limit() -> usize {
    10
}
fn default_enhance() -> bool {
    true
}
fn default_price_in() -> f64 {
    0.002
}
fn default_price_out() -> f64 {
    0.006
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            model: default_model(),
            api_key: default_api_key(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_corrections: default_max_corrections(),
            backfill_limit: default_backfill_limit(),
            enhance: default_enhance(),
            price_in_per_1k: default_price_in(),
            price_out_per_1k: default_price_out(),
        }
    }
}

impl EnrichmentConfig {
    /// Resolve the API key, reading the provider's env var when configured as "ENV".
    pub fn resolve_api_key(&self) -> Result<String, CurationError> {
        let provider = self.provider.to_lowercase();
        if provider != "openrouter" {
            return Err(CurationError::config(format!(
                "unsupported enrichment provider: {}",
                self.provider
            )));
        }
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            return env::var(ENV_OPENROUTER_API_KEY).map_err(|_| {
                CurationError::config(format!("missing {ENV_OPENROUTER_API_KEY} env var"))
            });
        }
        Ok(self.api_key.trim().to_string())
    }

    /// Cost of one call in USD.
    pub fn cost_usd(&self, prompt_tokens: u64, completion_tokens: u64) -> f64 {
        (prompt_tokens as f64 / 1000.0) * self.price_in_per_1k
            + (completion_tokens as f64 / 1000.0) * self.price_out_per_1k
    }
}
