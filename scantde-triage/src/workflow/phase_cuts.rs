//! Cuts phase: algorithmic and crossmatch filters before any classifier

use super::{RunState, StageExport, TriagePipeline};
use crate::error::TriageResult;
use crate::processing_log::INITIAL_STAGE;
use crate::services::algorithmic_cuts as cuts;
use crate::services::deduplicate;
use tracing::info;

impl TriagePipeline {
    /// Execute the cuts phase
    ///
    /// **Algorithm:**
    /// 1. Record the raw table
    /// 2. sgscore cut, then deduplicate by name (earliest detection kept)
    /// 3. Positional and catalog cuts, gated by the selection's flags
    /// 4. Fetch crossmatch features for the survivors
    /// 5. Parallax/quasar cut, then the optional CatWISE colour cut
    pub(super) fn phase_cuts(&self, state: &mut RunState) -> TriageResult<()> {
        let params = &self.params;
        state.log.snapshot(INITIAL_STAGE, &state.table)?;

        // Runs per detection, before dedup: a rejected detection may belong
        // to a source that survives, so nothing is exported
        self.stage(state, cuts::SGSCORE_STAGE, StageExport::Skip, |c| {
            cuts::passes_sgscore(c, params)
        })?;

        let before = state.table.len();
        state.table = deduplicate(std::mem::take(&mut state.table));
        info!(
            before,
            after = state.table.len(),
            "Removed duplicate detections"
        );
        state.log.snapshot(cuts::DEDUPLICATED_STAGE, &state.table)?;

        self.stage(state, cuts::GALACTIC_LATITUDE_STAGE, StageExport::Skip, |c| {
            cuts::passes_galactic_latitude(c, params)
        })?;

        if self.config.require_nuclear {
            self.stage(state, cuts::NUCLEAR_DISTANCE_STAGE, StageExport::Persist, |c| {
                cuts::passes_nuclear_distance(c, params)
            })?;
        }

        if self.config.require_multiple_detections {
            self.stage(
                state,
                cuts::MULTIPLE_DETECTIONS_STAGE,
                StageExport::Persist,
                |c| cuts::passes_multiple_detections(c, params),
            )?;
        }

        self.stage(state, cuts::BRIGHT_HOST_STAGE, StageExport::Persist, |c| {
            cuts::passes_bright_host(c, params)
        })?;

        self.stage(state, cuts::NEAR_GAIA_BRIGHT_STAGE, StageExport::Persist, |c| {
            cuts::passes_near_gaia_bright(c, params)
        })?;

        let crossmatch = self.feature_source.features(&state.table.names());
        info!(
            requested = state.table.len(),
            matched = crossmatch.len(),
            "Fetched crossmatch features"
        );
        state.features.merge(crossmatch);

        let mask = state
            .table
            .mask(|c| cuts::passes_fast_crossmatch(c, &state.features, params));
        self.stage_mask(state, cuts::FAST_CROSSMATCH_STAGE, StageExport::Persist, mask)?;

        if self.config.cut_wise {
            let mask = state
                .table
                .mask(|c| cuts::passes_catwise(c, &state.features, params));
            self.stage_mask(state, cuts::CATWISE_STAGE, StageExport::Persist, mask)?;
        }

        Ok(())
    }
}
