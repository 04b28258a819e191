// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod candidate;
pub mod collect;
pub mod config;
pub mod dedup;
pub mod enrichment;
pub mod error;
pub mod fingerprint;
pub mod metrics;
pub mod pipeline;
pub mod publish;
pub mod scoring;
pub mod select;
pub mod source_weights;
pub mod text;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::candidate::{Candidate, RawRecord};
pub use crate::config::CurationConfig;
pub use crate::error::{CurationError, EnrichmentError, PersistenceError};
pub use crate::pipeline::{CurationEngine, Curator, RunReport};
