//! Host phase: host-only classifier, its early-exit floor, lightcurve availability

use super::{stages, RunState, StageExport, TriagePipeline};
use crate::error::TriageResult;
use crate::models::ClassifierVariant;
use crate::services::invoke;
use std::collections::{HashMap, HashSet};
use tracing::info;

impl TriagePipeline {
    /// Execute the host phase
    ///
    /// **Algorithm:**
    /// 1. Score with the host-only classifier (if the selection uses one)
    /// 2. Reject rows the host classifier could not score
    /// 3. Keep host scores above the host floor
    /// 4. Keep rows whose lightcurve the feature source can serve
    pub(super) fn phase_host(&self, state: &mut RunState) -> TriageResult<()> {
        if self.config.host_classifier {
            let output = invoke(
                &state.table,
                &state.features,
                &ClassifierVariant::host(),
                self.models.as_ref(),
                self.attribution_sink.as_deref(),
            )?;
            info!(
                variant = %output.variant,
                scored = output.n_scored(),
                unscorable = output.n_unscorable(),
                "Host classifier applied"
            );

            let scorable = output.rows.iter().map(|r| r.score.is_some()).collect();
            let host_scores: HashMap<String, f64> = output
                .scored()
                .map(|(name, score)| (name.to_string(), score))
                .collect();
            state.outputs.push(output);

            self.stage_mask(state, stages::HOST_UNSCORABLE, StageExport::Persist, scorable)?;

            let floor = self.params.host_score_floor;
            self.stage(state, stages::HOST_FLOOR, StageExport::Persist, |c| {
                host_scores.get(&c.name).is_some_and(|s| *s > floor)
            })?;
        }

        let available: HashSet<String> = self
            .feature_source
            .lightcurve_available(&state.table.names())
            .into_iter()
            .collect();
        self.stage(state, stages::HAS_LIGHTCURVE, StageExport::Persist, |c| {
            available.contains(&c.name)
        })
    }
}
