//! Pipeline Orchestrator
//!
//! Runs one selection variant end-to-end over one night's candidates.
//!
//! # Phases
//! - **Cuts**: algorithmic and crossmatch cuts, deduplication
//! - **Host**: host-only classifier and its early-exit floor
//! - **Lightcurve**: lightcurve availability, ages and windows, infant/week
//!   classifiers
//! - **Thermal**: one classifier per maturity window, on that window's rows
//! - **Finalize**: full-history classifier, score reduction, terminal cuts,
//!   quality tags, caches
//!
//! # Early termination
//! A stage handed an empty table ends the run cleanly: the processing log up
//! to that stage is kept and persisted, and the candidate caches are written
//! empty. Configuration and artifact errors abort the run.

mod phase_cuts;
mod phase_finalize;
mod phase_host;
mod phase_lightcurve;
mod phase_thermal;

use crate::cache::CachePaths;
use crate::collaborators::{FeatureSource, RejectionSink};
use crate::error::{TriageError, TriageResult};
use crate::models::{
    Candidate, CandidateTable, FeatureTable, ScorePrecedence, SelectionConfig, SelectionVariant,
    TriageParameters,
};
use crate::processing_log::ProcessingLog;
use crate::services::{
    apply_stage, reduce, AttributionSink, ClassifierOutput, ModelStore, WindowSelector,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Names of the scoring stages
pub mod stages {
    pub const HOST_UNSCORABLE: &str = "TDEScore nans with full host data";
    pub const HOST_FLOOR: &str = "TDEScore cuts with full crossmatch data";
    pub const HAS_LIGHTCURVE: &str = "Has lightcurve data";
    pub const INFANT_UNSCORABLE: &str = "TDEScore nans with infant data";
    pub const LC_FIT_FAILED: &str = "LC Fit failed";
    pub const IMMATURE_AGE: &str = "Algorithmic cuts - age";
    pub const SCORE_FLOOR: &str = "TDEScore cuts";
}

/// Whether a stage's rejected rows go to the rejection sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageExport {
    Persist,
    Skip,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    /// A stage found the table already empty
    TerminatedEarly { stage: String },
}

/// Result of one run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub night: String,
    pub selection: SelectionVariant,
    pub outcome: RunOutcome,
    pub log: ProcessingLog,
    /// Surviving candidates, tagged and sorted by winning score
    pub candidates: CandidateTable,
    /// Features gathered for the candidates during the run
    pub features: FeatureTable,
    /// Surviving candidates younger than the young-transient limit
    pub young: Vec<String>,
    /// Rows rejected across all stages
    pub n_rejected: usize,
}

impl RunSummary {
    pub fn is_complete(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }
}

/// Mutable state threaded through the phases of one run
struct RunState {
    night: String,
    table: CandidateTable,
    features: FeatureTable,
    log: ProcessingLog,
    outputs: Vec<ClassifierOutput>,
    n_rejected: usize,
}

/// Orchestrates one selection variant
pub struct TriagePipeline {
    selection: SelectionVariant,
    config: SelectionConfig,
    params: TriageParameters,
    selector: WindowSelector,
    precedence: ScorePrecedence,
    models: Box<dyn ModelStore>,
    feature_source: Box<dyn FeatureSource>,
    rejection_sink: Option<Box<dyn RejectionSink>>,
    attribution_sink: Option<Box<dyn AttributionSink>>,
    cache: Option<CachePaths>,
}

impl TriagePipeline {
    /// Pipeline with default thresholds and maturity windows
    pub fn new(
        selection: SelectionVariant,
        models: Box<dyn ModelStore>,
        feature_source: Box<dyn FeatureSource>,
    ) -> Self {
        let selector = WindowSelector::default();
        let precedence = ScorePrecedence::standard(&selector.windows());
        Self {
            selection,
            config: selection.config(),
            params: TriageParameters::default(),
            selector,
            precedence,
            models,
            feature_source,
            rejection_sink: None,
            attribution_sink: None,
            cache: None,
        }
    }

    pub fn with_parameters(mut self, params: TriageParameters) -> Self {
        self.params = params;
        self
    }

    /// Replace the maturity windows; the score precedence follows them
    pub fn with_windows(mut self, selector: WindowSelector) -> Self {
        self.precedence = ScorePrecedence::standard(&selector.windows());
        self.selector = selector;
        self
    }

    pub fn with_rejection_sink(mut self, sink: Box<dyn RejectionSink>) -> Self {
        self.rejection_sink = Some(sink);
        self
    }

    pub fn with_attribution_sink(mut self, sink: Box<dyn AttributionSink>) -> Self {
        self.attribution_sink = Some(sink);
        self
    }

    /// Persist log and caches under this data directory after each run
    pub fn with_cache(mut self, cache: CachePaths) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn selection(&self) -> SelectionVariant {
        self.selection
    }

    pub fn parameters(&self) -> &TriageParameters {
        &self.params
    }

    /// Triage one night's raw detections
    ///
    /// # Errors
    /// Configuration, artifact and IO errors. An emptied table is not an
    /// error: it yields [`RunOutcome::TerminatedEarly`].
    pub fn run(&self, night: &str, mut candidates: CandidateTable) -> TriageResult<RunSummary> {
        scantde_common::time::parse_datestr(night)?;
        // Rows re-fed from a cache arrive with last run's windows and scores
        for candidate in candidates.iter_mut() {
            candidate.reset_derived();
        }
        if let Some(sink) = &self.rejection_sink {
            sink.begin_run(self.selection.as_str())?;
        }
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            run_id = %run_id,
            night = %night,
            selection = %self.selection,
            sources = candidates.len(),
            known_positives = candidates.known_positive_count(),
            "Starting triage run"
        );

        let mut state = RunState {
            night: night.to_string(),
            table: candidates,
            features: FeatureTable::new(),
            log: ProcessingLog::new(),
            outputs: Vec::new(),
            n_rejected: 0,
        };

        let outcome = match self.execute(&mut state) {
            Ok(()) => RunOutcome::Completed,
            Err(TriageError::NoCandidates { stage }) => {
                warn!(
                    run_id = %run_id,
                    stage = %stage,
                    "Terminated early due to lack of sources"
                );
                state.table = CandidateTable::default();
                RunOutcome::TerminatedEarly { stage }
            }
            Err(e) => return Err(e),
        };

        let young = state
            .table
            .iter()
            .filter(|c| c.age_days.is_some_and(|a| a < self.params.young_age_days))
            .map(|c| c.name.clone())
            .collect::<Vec<_>>();

        if let Some(cache) = &self.cache {
            cache.save_log(night, self.selection, &state.log)?;
            cache.save_candidates(night, self.selection, &state.table)?;
            cache.save_results(night, self.selection, &state.table, &state.features)?;
        }

        info!(
            run_id = %run_id,
            outcome = ?outcome,
            final_sources = state.table.len(),
            young = young.len(),
            rejected = state.n_rejected,
            elapsed_ms = (Utc::now() - started_at).num_milliseconds(),
            "Triage run finished"
        );

        Ok(RunSummary {
            run_id,
            started_at,
            night: state.night,
            selection: self.selection,
            outcome,
            log: state.log,
            candidates: state.table,
            features: state.features,
            young,
            n_rejected: state.n_rejected,
        })
    }

    fn execute(&self, state: &mut RunState) -> TriageResult<()> {
        self.phase_cuts(state)?;
        self.phase_host(state)?;
        self.phase_lightcurve(state)?;
        self.phase_thermal(state)?;
        self.phase_finalize(state)
    }

    /// Apply a per-row predicate as a named stage
    fn stage<F>(
        &self,
        state: &mut RunState,
        stage: &str,
        export: StageExport,
        keep: F,
    ) -> TriageResult<()>
    where
        F: Fn(&Candidate) -> bool,
    {
        let mask = state.table.mask(keep);
        self.stage_mask(state, stage, export, mask)
    }

    /// Apply a precomputed mask as a named stage
    fn stage_mask(
        &self,
        state: &mut RunState,
        stage: &str,
        export: StageExport,
        mask: Vec<bool>,
    ) -> TriageResult<()> {
        let table = std::mem::take(&mut state.table);
        let outcome = apply_stage(table, &mask, stage, &mut state.log)?;
        state.table = outcome.kept;
        state.n_rejected += outcome.rejected.len();

        if export == StageExport::Persist && !outcome.rejected.is_empty() {
            self.export_rejected(state, outcome.rejected);
        }
        Ok(())
    }

    /// Hand rejected rows, with the scores they earned so far, to the sink
    fn export_rejected(&self, state: &RunState, rejected: CandidateTable) {
        let Some(sink) = &self.rejection_sink else {
            return;
        };
        let rejected = match reduce(rejected, &self.precedence, &state.outputs) {
            Ok(scored) => scored,
            Err(e) => {
                warn!(error = %e, "Could not attach scores to rejected rows");
                return;
            }
        };
        if let Err(e) = sink.export(self.selection.as_str(), &rejected) {
            warn!(
                selection = %self.selection,
                rows = rejected.len(),
                error = %e,
                "Failed to export rejected rows"
            );
        }
    }
}
