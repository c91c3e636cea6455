//! scantde-triage library interface
//!
//! Staged triage of nightly transient candidates: algorithmic cuts,
//! classifier scoring per maturity window, best-score reduction, quality
//! tagging and per-night caches.

pub mod cache;
pub mod collaborators;
pub mod error;
pub mod models;
pub mod processing_log;
pub mod services;
pub mod workflow;

pub use crate::cache::CachePaths;
pub use crate::collaborators::{
    FeatureSource, JsonLinesRejectionSink, MemoryRejectionSink, RejectionSink, StaticFeatureSource,
};
pub use crate::error::{TriageError, TriageResult};
pub use crate::models::{Candidate, CandidateTable, FeatureTable, SelectionVariant, TriageParameters};
pub use crate::processing_log::{ProcessingLog, ProcessingStageRecord};
pub use crate::workflow::{RunOutcome, RunSummary, TriagePipeline};
