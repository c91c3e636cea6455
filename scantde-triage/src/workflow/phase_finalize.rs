//! Finalize phase: full-history classifier, reduction, terminal cuts, tagging

use super::{stages, RunState, StageExport, TriagePipeline};
use crate::error::TriageResult;
use crate::models::{ClassifierVariant, ScorePrecedence};
use crate::processing_log::FINAL_STAGE;
use crate::services::{invoke, reduce, tag};
use tracing::info;

impl TriagePipeline {
    /// Execute the finalize phase
    ///
    /// **Algorithm:**
    /// 1. Score with the full-history classifier (if the selection uses one)
    /// 2. Reduce every classifier output into one winner per row
    /// 3. Reject rows no classifier scored
    /// 4. Reject stale immature winners and low winning scores (if enabled)
    /// 5. Tag quality flags, sort by winning score and record the final table
    pub(super) fn phase_finalize(&self, state: &mut RunState) -> TriageResult<()> {
        if self.config.full_classifier {
            let full = invoke(
                &state.table,
                &state.features,
                &ClassifierVariant::full(),
                self.models.as_ref(),
                self.attribution_sink.as_deref(),
            )?;
            info!(
                variant = %full.variant,
                scored = full.n_scored(),
                unscorable = full.n_unscorable(),
                "Full-history classifier applied"
            );
            state.outputs.push(full);
        }

        state.table = reduce(
            std::mem::take(&mut state.table),
            &self.precedence,
            &state.outputs,
        )?;

        self.stage(state, stages::LC_FIT_FAILED, StageExport::Persist, |c| {
            c.winner.is_some()
        })?;

        let params = &self.params;
        if self.config.immature_age_cut {
            let immature = ScorePrecedence::immature_names();
            self.stage(state, stages::IMMATURE_AGE, StageExport::Skip, |c| {
                let stale = c.age_days.is_some_and(|a| a > params.max_immature_age_days);
                let won_immature = c
                    .winning_classifier()
                    .is_some_and(|w| immature.contains(&w));
                !(stale && won_immature)
            })?;
        }

        if self.config.min_winning_score {
            self.stage(state, stages::SCORE_FLOOR, StageExport::Skip, |c| {
                c.winning_score()
                    .is_some_and(|s| s > params.min_winning_score)
            })?;
        }

        let mut table = tag(std::mem::take(&mut state.table), &state.features, params);
        table.sort_by_winning_score();
        state.log.snapshot(FINAL_STAGE, &table)?;
        state.table = table;

        if let Some(best) = state.table.iter().next() {
            info!(
                name = %best.name,
                score = ?best.winning_score(),
                classifier = ?best.winning_classifier(),
                "Top ranked source"
            );
        }
        Ok(())
    }
}
