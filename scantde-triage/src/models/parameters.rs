//! Triage thresholds
//!
//! Every numeric constant used by the cuts, the reducer's neighbouring
//! filter stages and the quality tagger. Any field may be overridden from
//! the `[parameters]` table of the TOML config; absent fields keep their
//! defaults.

use crate::error::{TriageError, TriageResult};
use serde::{Deserialize, Serialize};

/// Pipeline thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageParameters {
    /// Hour (UTC) on the night's date at which ages are evaluated (default: 15)
    #[serde(default = "default_decision_hour_utc")]
    pub decision_hour_utc: u32,

    /// Maximum PS1 star/galaxy score (default: 0.5)
    #[serde(default = "default_max_sgscore")]
    pub max_sgscore: f64,

    /// Beyond this distance (arcsec) the PS1 match is not considered the host (default: 3.0)
    #[serde(default = "default_crossmatch_radius_arcsec")]
    pub crossmatch_radius_arcsec: f64,

    /// Maximum distance from the host nucleus (arcsec) (default: 0.9)
    #[serde(default = "default_max_nuclear_distance_arcsec")]
    pub max_nuclear_distance_arcsec: f64,

    /// Minimum |Galactic latitude| in degrees (default: 10)
    #[serde(default = "default_min_galactic_latitude_deg")]
    pub min_galactic_latitude_deg: f64,

    /// Minimum historical detections for multi-detection selections (default: 2)
    #[serde(default = "default_min_detections")]
    pub min_detections: u32,

    /// Host PS1 magnitudes must be fainter than this (default: 12.0)
    #[serde(default = "default_bright_host_mag")]
    pub bright_host_mag: f64,

    /// Minimum distance to a bright Gaia star (arcsec) (default: 5.0)
    #[serde(default = "default_min_neargaiabright_arcsec")]
    pub min_neargaiabright_arcsec: f64,

    /// Maximum Gaia parallax significance (default: 3.0)
    #[serde(default = "default_max_gaia_parallax_significance")]
    pub max_gaia_parallax_significance: f64,

    /// Maximum CatWISE W1 - W2 colour (default: 0.7)
    #[serde(default = "default_max_catwise_w1_m_w2")]
    pub max_catwise_w1_m_w2: f64,

    /// Host-only score floor for the early-exit filter (default: 0.0001)
    #[serde(default = "default_host_score_floor")]
    pub host_score_floor: f64,

    /// Winning score must exceed this in the terminal filter (default: 0.01)
    #[serde(default = "default_min_winning_score")]
    pub min_winning_score: f64,

    /// Immature winners older than this are cut (days) (default: 14.0)
    #[serde(default = "default_max_immature_age_days")]
    pub max_immature_age_days: f64,

    /// Ages below this form the young-transient subset (days) (default: 14.0)
    #[serde(default = "default_young_age_days")]
    pub young_age_days: f64,

    /// Immature winners older than this are tagged junk (days) (default: 30.0)
    #[serde(default = "default_stale_immature_age_days")]
    pub stale_immature_age_days: f64,

    /// Windows at least this long count as late maturity (days) (default: 180.0)
    #[serde(default = "default_late_window_min_days")]
    pub late_window_min_days: f64,

    /// Late-window winners need at least this fit score (default: 0.5)
    #[serde(default = "default_late_window_lc_floor")]
    pub late_window_lc_floor: f64,

    /// Sources older than this are old (days) (default: 365.0)
    #[serde(default = "default_old_age_days")]
    pub old_age_days: f64,

    /// Old sources need a winning score and fit score above this (default: 0.5)
    #[serde(default = "default_old_score_floor")]
    pub old_score_floor: f64,

    /// Sources older than this are junk regardless of score (days) (default: 1000.0)
    #[serde(default = "default_ancient_age_days")]
    pub ancient_age_days: f64,

    /// Pre-window detections above this suggest undercounted history (default: 20)
    #[serde(default = "default_max_predetections")]
    pub max_predetections: f64,

    /// Hosts fainter than this absolute r magnitude are dwarfs (default: -19.0)
    #[serde(default = "default_dwarf_abs_mag")]
    pub dwarf_abs_mag: f64,

    /// Without a redshift, hosts fainter than this apparent r magnitude are dwarfs (default: 22.0)
    #[serde(default = "default_dwarf_apparent_mag")]
    pub dwarf_apparent_mag: f64,
}

// Default value functions
fn default_decision_hour_utc() -> u32 {
    15
}

fn default_max_sgscore() -> f64 {
    0.5
}

fn default_crossmatch_radius_arcsec() -> f64 {
    3.0
}

fn default_max_nuclear_distance_arcsec() -> f64 {
    0.9
}

fn default_min_galactic_latitude_deg() -> f64 {
    10.0
}

fn default_min_detections() -> u32 {
    2
}

fn default_bright_host_mag() -> f64 {
    12.0
}

fn default_min_neargaiabright_arcsec() -> f64 {
    5.0
}

fn default_max_gaia_parallax_significance() -> f64 {
    3.0
}

fn default_max_catwise_w1_m_w2() -> f64 {
    0.7
}

fn default_host_score_floor() -> f64 {
    0.0001
}

fn default_min_winning_score() -> f64 {
    0.01
}

fn default_max_immature_age_days() -> f64 {
    14.0
}

fn default_young_age_days() -> f64 {
    14.0
}

fn default_stale_immature_age_days() -> f64 {
    30.0
}

fn default_late_window_min_days() -> f64 {
    180.0
}

fn default_late_window_lc_floor() -> f64 {
    0.5
}

fn default_old_age_days() -> f64 {
    365.0
}

fn default_old_score_floor() -> f64 {
    0.5
}

fn default_ancient_age_days() -> f64 {
    1000.0
}

fn default_max_predetections() -> f64 {
    20.0
}

fn default_dwarf_abs_mag() -> f64 {
    -19.0
}

fn default_dwarf_apparent_mag() -> f64 {
    22.0
}

impl Default for TriageParameters {
    fn default() -> Self {
        Self {
            decision_hour_utc: default_decision_hour_utc(),
            max_sgscore: default_max_sgscore(),
            crossmatch_radius_arcsec: default_crossmatch_radius_arcsec(),
            max_nuclear_distance_arcsec: default_max_nuclear_distance_arcsec(),
            min_galactic_latitude_deg: default_min_galactic_latitude_deg(),
            min_detections: default_min_detections(),
            bright_host_mag: default_bright_host_mag(),
            min_neargaiabright_arcsec: default_min_neargaiabright_arcsec(),
            max_gaia_parallax_significance: default_max_gaia_parallax_significance(),
            max_catwise_w1_m_w2: default_max_catwise_w1_m_w2(),
            host_score_floor: default_host_score_floor(),
            min_winning_score: default_min_winning_score(),
            max_immature_age_days: default_max_immature_age_days(),
            young_age_days: default_young_age_days(),
            stale_immature_age_days: default_stale_immature_age_days(),
            late_window_min_days: default_late_window_min_days(),
            late_window_lc_floor: default_late_window_lc_floor(),
            old_age_days: default_old_age_days(),
            old_score_floor: default_old_score_floor(),
            ancient_age_days: default_ancient_age_days(),
            max_predetections: default_max_predetections(),
            dwarf_abs_mag: default_dwarf_abs_mag(),
            dwarf_apparent_mag: default_dwarf_apparent_mag(),
        }
    }
}

impl TriageParameters {
    /// Build from the `[parameters]` table of the TOML config
    pub fn from_toml_table(table: Option<&toml::Table>) -> TriageResult<Self> {
        match table {
            None => Ok(Self::default()),
            Some(table) => toml::Value::Table(table.clone())
                .try_into()
                .map_err(|e| TriageError::Config(format!("Invalid [parameters]: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = TriageParameters::default();
        assert_eq!(params.max_sgscore, 0.5);
        assert_eq!(params.host_score_floor, 0.0001);
        assert_eq!(params.min_winning_score, 0.01);
        assert_eq!(params.decision_hour_utc, 15);
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let table: toml::Table = toml::from_str("max_sgscore = 0.3\nmin_detections = 3").unwrap();
        let params = TriageParameters::from_toml_table(Some(&table)).unwrap();
        assert_eq!(params.max_sgscore, 0.3);
        assert_eq!(params.min_detections, 3);
        assert_eq!(params.bright_host_mag, 12.0);
    }

    #[test]
    fn test_bad_override_is_config_error() {
        let table: toml::Table = toml::from_str("max_sgscore = \"high\"").unwrap();
        let err = TriageParameters::from_toml_table(Some(&table)).unwrap_err();
        assert!(matches!(err, TriageError::Config(_)));
    }
}
