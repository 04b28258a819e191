// src/api.rs
//! Read-only HTTP surface for `serve` mode.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::candidate::Candidate;
use crate::config::CurationConfig;
use crate::error::{CurationError, PersistenceError};
use crate::fingerprint::Fingerprinter;
use crate::publish::{Backlog, Snapshot, SnapshotStore};
use crate::scoring::{ScoreExplanation, Scorer};

#[derive(Clone)]
pub struct AppState {
    scorer: Arc<Scorer>,
    fingerprinter: Arc<Fingerprinter>,
    store: Arc<SnapshotStore>,
    backlog_path: PathBuf,
}

impl AppState {
    pub fn new(cfg: &CurationConfig) -> Result<Self, CurationError> {
        Ok(Self {
            scorer: Arc::new(Scorer::new(cfg)?),
            fingerprinter: Arc::new(Fingerprinter::new(cfg)),
            store: Arc::new(SnapshotStore::new(&cfg.publish)),
            backlog_path: cfg.publish.backlog_path.clone(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/articles", get(articles))
        .route("/backlog", get(backlog))
        .route("/debug/score", get(debug_score))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

struct ApiError(PersistenceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(target: "curator::api", error = %self.0, "read failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

#[derive(Serialize)]
struct ArticlesOut {
    metadata: Option<crate::publish::SnapshotMetadata>,
    articles: Vec<Candidate>,
}

async fn articles(State(state): State<AppState>) -> Result<Json<ArticlesOut>, ApiError> {
    let out = match state.store.load_snapshot().map_err(ApiError)? {
        Some(Snapshot { metadata, articles }) => ArticlesOut {
            metadata: Some(metadata),
            articles,
        },
        None => ArticlesOut {
            metadata: None,
            articles: Vec::new(),
        },
    };
    Ok(Json(out))
}

async fn backlog(State(state): State<AppState>) -> Result<Json<Backlog>, ApiError> {
    Backlog::load(&state.backlog_path).map(Json).map_err(ApiError)
}

#[derive(Deserialize)]
struct ScoreQuery {
    #[serde(default)]
    text: String,
    #[serde(default)]
    source: String,
}

#[derive(Serialize)]
struct ScoreOut {
    #[serde(flatten)]
    explanation: ScoreExplanation,
    approved: bool,
    tags: BTreeSet<String>,
    topic_details: Vec<String>,
    fingerprint: String,
}

async fn debug_score(State(state): State<AppState>, Query(q): Query<ScoreQuery>) -> Json<ScoreOut> {
    Json(score_text(&state.scorer, &state.fingerprinter, &q.text, &q.source))
}

fn score_text(scorer: &Scorer, fp: &Fingerprinter, text: &str, source: &str) -> ScoreOut {
    let explanation = scorer.explain_text(text, source);
    let folded = crate::text::fold(text);
    ScoreOut {
        approved: scorer.is_approved(&explanation.scores),
        tags: fp.tags(&folded),
        topic_details: fp.topic_details(text),
        fingerprint: fp.signature(text, ""),
        explanation,
    }
}
