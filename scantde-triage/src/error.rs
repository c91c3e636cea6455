//! Error types for scantde-triage
//!
//! Data-shape conditions (an emptied table) are recovered by the workflow and
//! recorded in the processing log. Configuration and artifact errors abort the
//! run. Unscorable rows are never errors; they travel as masks.

use std::path::PathBuf;
use thiserror::Error;

/// Pipeline error type
#[derive(Debug, Error)]
pub enum TriageError {
    /// A stage was handed an empty table; terminal for the run, not retried
    #[error("No candidates left before stage '{stage}'")]
    NoCandidates { stage: String },

    /// A requested cache (candidates/results/log) does not exist
    #[error("No {kind} cache found at {}", path.display())]
    MissingCache { kind: CacheKind, path: PathBuf },

    /// A classifier artifact is missing, unreadable or produced invalid output
    #[error("Model artifact error for '{variant}': {reason}")]
    ModelArtifact { variant: String, reason: String },

    /// Invalid pipeline configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input to a stage (e.g. mask not aligned to the table)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// scantde-common error
    #[error("Common error: {0}")]
    Common(#[from] scantde_common::Error),
}

impl TriageError {
    /// True for the recoverable "table emptied" condition
    pub fn is_terminal_data_condition(&self) -> bool {
        matches!(self, TriageError::NoCandidates { .. })
    }

    pub(crate) fn model(variant: &str, reason: impl Into<String>) -> Self {
        TriageError::ModelArtifact {
            variant: variant.to_string(),
            reason: reason.into(),
        }
    }
}

/// Which cache a [`TriageError::MissingCache`] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Candidates,
    Results,
    ProcessingLog,
}

impl std::fmt::Display for CacheKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKind::Candidates => write!(f, "candidates"),
            CacheKind::Results => write!(f, "results"),
            CacheKind::ProcessingLog => write!(f, "processing log"),
        }
    }
}

/// Result type for pipeline operations
pub type TriageResult<T> = Result<T, TriageError>;
