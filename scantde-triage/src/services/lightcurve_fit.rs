//! Lightcurve-fit relabelling
//!
//! The lightcurve collaborator reports fit quantities per maturity window
//! (`thermal_30d_score`, `thermal_all_high_noise`, ...). Each candidate only
//! cares about the window it was assigned to, so those values are copied to
//! window-independent fields on the candidate.

use crate::models::features::keys;
use crate::models::{Candidate, CandidateTable, FeatureTable, LightcurveFit};

/// Fit quantities of the candidate's own window, `None` if it has no window or no fit
pub fn fit_for(candidate: &Candidate, features: &FeatureTable) -> Option<LightcurveFit> {
    let window = candidate.window?;
    let name = candidate.name.as_str();

    let high_noise = features.flag(name, &window.feature_key(keys::LC_HIGH_NOISE));
    let lc_score = features.get(name, &window.feature_key(keys::LC_SCORE));
    let n_detections = features.get(name, &window.feature_key(keys::LC_N_DETECTIONS));

    if high_noise.is_none() && lc_score.is_none() && n_detections.is_none() {
        return None;
    }
    Some(LightcurveFit {
        high_noise: high_noise.unwrap_or(false),
        lc_score,
        n_detections,
    })
}

/// Fill `lightcurve_fit` on every row from its window's feature columns
pub fn relabel(table: &mut CandidateTable, features: &FeatureTable) {
    for candidate in table.iter_mut() {
        candidate.lightcurve_fit = fit_for(candidate, features);
    }
}

/// Historical detections before the fit window (`ndethist - n_detections`)
pub fn predetections(candidate: &Candidate) -> Option<f64> {
    let used = candidate.lightcurve_fit.as_ref()?.n_detections?;
    Some(f64::from(candidate.ndethist) - used)
}
