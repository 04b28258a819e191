// src/error.rs
//! Error taxonomy for the curation pipeline.
//!
//! Only [`CurationError::Configuration`] and [`CurationError::Persistence`] escalate to
//! the top-level run result. Source, enrichment and validation failures are absorbed at
//! their component boundary and surface as counters in the run report.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CurationError>;

#[derive(Debug, Error)]
pub enum CurationError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("source `{source_name}` failed: {message}")]
    SourceFetch {
        source_name: String,
        message: String,
    },

    #[error(transparent)]
    Enrichment(#[from] EnrichmentError),

    #[error("invalid candidate `{link}`: {reason}")]
    Validation { link: String, reason: String },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl CurationError {
    /// Fatal errors abort the run; everything else is counted and skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CurationError::Configuration(_) | CurationError::Persistence(_)
        )
    }

    pub fn config(msg: impl Into<String>) -> Self {
        CurationError::Configuration(msg.into())
    }
}

/// Per-call failure of the enrichment service.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("enrichment service disabled")]
    Disabled,

    #[error("enrichment call timed out after {0} ms")]
    Timeout(u64),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("unusable response: {0}")]
    InvalidResponse(String),
}

impl EnrichmentError {
    /// Timeouts, network errors, 5xx and 429 are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            EnrichmentError::Timeout(_) | EnrichmentError::Network(_) => true,
            EnrichmentError::Api { status, .. } => *status >= 500 || *status == 429,
            EnrichmentError::Disabled | EnrichmentError::InvalidResponse(_) => false,
        }
    }
}

impl From<reqwest::Error> for EnrichmentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return EnrichmentError::Timeout(0);
        }
        match err.status() {
            Some(status) => EnrichmentError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => EnrichmentError::Network(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("snapshot {0} is locked by another publisher")]
    Busy(String),
}

impl PersistenceError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        PersistenceError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
