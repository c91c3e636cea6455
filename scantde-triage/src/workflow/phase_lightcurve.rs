//! Lightcurve phase: ages, maturity windows and the early lightcurve classifiers

use super::{stages, RunState, StageExport, TriagePipeline};
use crate::error::TriageResult;
use crate::models::ClassifierVariant;
use crate::services::invoke;
use crate::services::window_selector::assign_windows;
use tracing::info;

impl TriagePipeline {
    /// Execute the lightcurve phase
    ///
    /// Ages are measured at the decision time of the night. The infant
    /// classifier is a hard requirement: rows it cannot score are rejected.
    /// The week classifier only contributes scores.
    pub(super) fn phase_lightcurve(&self, state: &mut RunState) -> TriageResult<()> {
        assign_windows(
            &mut state.table,
            &self.selector,
            &state.night,
            self.params.decision_hour_utc,
        )?;

        if !self.config.early_lightcurve_classifiers {
            return Ok(());
        }

        let infant = invoke(
            &state.table,
            &state.features,
            &ClassifierVariant::infant(),
            self.models.as_ref(),
            self.attribution_sink.as_deref(),
        )?;
        info!(
            variant = %infant.variant,
            scored = infant.n_scored(),
            unscorable = infant.n_unscorable(),
            "Infant classifier applied"
        );
        let scorable = infant.rows.iter().map(|r| r.score.is_some()).collect();
        state.outputs.push(infant);
        self.stage_mask(state, stages::INFANT_UNSCORABLE, StageExport::Persist, scorable)?;

        let week = invoke(
            &state.table,
            &state.features,
            &ClassifierVariant::week(),
            self.models.as_ref(),
            self.attribution_sink.as_deref(),
        )?;
        info!(
            variant = %week.variant,
            scored = week.n_scored(),
            unscorable = week.n_unscorable(),
            "Week classifier applied"
        );
        state.outputs.push(week);
        Ok(())
    }
}
