// src/enrichment/openrouter.rs
//! OpenRouter chat-completions provider.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{ChatMessage, Completion, EnrichmentService};
use crate::config::enrichment::EnrichmentConfig;
use crate::error::{CurationError, EnrichmentError};

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

pub struct OpenRouterService {
    http: reqwest::Client,
    api_key: String,
    model: String,
    cfg: EnrichmentConfig,
}

impl OpenRouterService {
    pub fn new(cfg: &EnrichmentConfig) -> Result<Self, CurationError> {
        let api_key = cfg.resolve_api_key()?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("news-curator/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| CurationError::config(format!("http client: {e}")))?;
        Ok(Self {
            http,
            api_key,
            model: cfg.model.clone(),
            cfg: cfg.clone(),
        })
    }

    fn headers(&self) -> Result<HeaderMap, EnrichmentError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| EnrichmentError::InvalidResponse("API key is not a valid header".into()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("X-Title", HeaderValue::from_static("news-curator"));
        Ok(headers)
    }
}

#[async_trait]
impl EnrichmentService for OpenRouterService {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, EnrichmentError> {
        let url = format!("{OPENROUTER_API_URL}/chat/completions");
        debug!(target: "curator::enrichment", model = %self.model, turns = messages.len(), "chat request");

        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: 0.2,
        };
        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::Api {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let body: ChatResponse = response.json().await?;
        let usage = body.usage.unwrap_or_default();
        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| EnrichmentError::InvalidResponse("no choices in response".into()))?;

        Ok(Completion {
            text,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            cost_usd: self.cfg.cost_usd(usage.prompt_tokens, usage.completion_tokens),
        })
    }
}
