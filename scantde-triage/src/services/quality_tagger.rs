//! Quality Tagger
//!
//! Post-hoc presentation flags over the fully scored table. Tagging only
//! annotates: it never removes a row and never touches a score.

use crate::models::features::keys;
use crate::models::{Candidate, CandidateTable, FeatureTable, ScorePrecedence, TriageParameters};
use crate::services::{cosmology, lightcurve_fit};
use tracing::info;

/// Set `is_junk` and `is_dwarf` on every row
pub fn tag(
    mut table: CandidateTable,
    features: &FeatureTable,
    params: &TriageParameters,
) -> CandidateTable {
    for candidate in table.iter_mut() {
        candidate.flags.is_junk = is_junk(candidate, params);
        candidate.flags.is_dwarf = is_dwarf(candidate, features, params);
    }

    let junk = table.iter().filter(|c| c.flags.is_junk).count();
    let dwarf = table.iter().filter(|c| c.flags.is_dwarf).count();
    info!(sources = table.len(), junk, dwarf, "Tagged quality flags");
    table
}

/// Low-quality candidate, deprioritised for review
///
/// **Rules** (any one suffices):
/// - immature winner (host/infant/week) older than the staleness limit
/// - the window's lightcurve fit flagged high noise
/// - late-window winner (>= 180 d or all history) with a poor fit score
/// - old source with both a low winning score and a poor fit score
/// - ancient source, regardless of score
/// - many detections before the fit window, more than the window used
pub fn is_junk(candidate: &Candidate, params: &TriageParameters) -> bool {
    let age = candidate.age_days;
    let fit = candidate.lightcurve_fit.as_ref();
    let lc_score = fit.and_then(|f| f.lc_score);
    let older_than = |limit: f64| age.is_some_and(|a| a > limit);
    let poor_fit = |floor: f64| lc_score.is_some_and(|s| s < floor);

    let winner_immature = candidate
        .winning_classifier()
        .is_some_and(|w| ScorePrecedence::immature_names().contains(&w));
    if winner_immature && older_than(params.stale_immature_age_days) {
        return true;
    }

    if fit.is_some_and(|f| f.high_noise) {
        return true;
    }

    let winner_late_window = candidate
        .winning_classifier()
        .is_some_and(|w| w.starts_with("thermal_"))
        && candidate
            .window
            .is_some_and(|w| w.is_at_least(params.late_window_min_days));
    if winner_late_window && poor_fit(params.late_window_lc_floor) {
        return true;
    }

    let low_score = candidate
        .winning_score()
        .is_some_and(|s| s < params.old_score_floor);
    if older_than(params.old_age_days) && low_score && poor_fit(params.old_score_floor) {
        return true;
    }

    if older_than(params.ancient_age_days) {
        return true;
    }

    match (lightcurve_fit::predetections(candidate), fit.and_then(|f| f.n_detections)) {
        (Some(predets), Some(used)) => predets > params.max_predetections && predets > used,
        _ => false,
    }
}

/// Best host redshift: spectroscopic, then photometric, then externally reported
///
/// Negative values are treated as missing.
pub fn best_redshift(features: &FeatureTable, name: &str) -> Option<f64> {
    [keys::Z_SPEC, keys::Z_PHOT, keys::Z_EXTERNAL]
        .iter()
        .filter_map(|key| features.get(name, key))
        .find(|z| *z >= 0.0)
}

/// Dwarf host: faint absolute magnitude, or faint apparent magnitude without a redshift
pub fn is_dwarf(candidate: &Candidate, features: &FeatureTable, params: &TriageParameters) -> bool {
    let Some(apparent) = features.get(&candidate.name, keys::HOST_R_KRON_MAG) else {
        return false;
    };
    let absolute = best_redshift(features, &candidate.name)
        .and_then(|z| cosmology::absolute_magnitude(apparent, z));
    match absolute {
        Some(abs_mag) => abs_mag > params.dwarf_abs_mag,
        None => apparent > params.dwarf_apparent_mag,
    }
}
