//! Thermal phase: one classifier per maturity window

use super::{RunState, TriagePipeline};
use crate::error::TriageResult;
use crate::models::ClassifierVariant;
use crate::services::{invoke, lightcurve_fit};
use tracing::{debug, info};

impl TriagePipeline {
    /// Execute the thermal phase
    ///
    /// **Algorithm:**
    /// 1. For each window, select the rows assigned to it
    /// 2. Skip windows without rows; otherwise score the sub-table with that
    ///    window's variant
    /// 3. Copy each row's own-window lightcurve fit onto the row
    ///
    /// Rows without a window are never thermally scored.
    pub(super) fn phase_thermal(&self, state: &mut RunState) -> TriageResult<()> {
        for window in self.selector.windows() {
            let members = state.table.filtered(|c| c.window == Some(window));
            if members.is_empty() {
                debug!(window = %window.label(), "No sources in window");
                continue;
            }

            let variant = ClassifierVariant::thermal(window, self.config.thermal_include_host);
            let output = invoke(
                &members,
                &state.features,
                &variant,
                self.models.as_ref(),
                self.attribution_sink.as_deref(),
            )?;
            info!(
                variant = %output.variant,
                artifact = %variant.artifact,
                sources = members.len(),
                scored = output.n_scored(),
                unscorable = output.n_unscorable(),
                "Thermal classifier applied"
            );
            state.outputs.push(output);
        }

        lightcurve_fit::relabel(&mut state.table, &state.features);
        Ok(())
    }
}
