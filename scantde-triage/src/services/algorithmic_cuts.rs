//! Algorithmic cut predicates
//!
//! Cheap per-row tests applied before any classifier runs. Each predicate
//! returns `true` for rows to keep. Missing catalog values are handled per
//! cut: an absent PS1 match cannot be a star, an absent nuclear distance
//! cannot be nuclear.

use crate::models::features::keys;
use crate::models::{Candidate, FeatureTable, TriageParameters};
use crate::services::sky;

pub const SGSCORE_STAGE: &str = "Algorithmic cuts - sgscore";
pub const DEDUPLICATED_STAGE: &str = "De-duplicated";
pub const GALACTIC_LATITUDE_STAGE: &str = "Algorithmic cuts - Galactic latitude";
pub const NUCLEAR_DISTANCE_STAGE: &str = "Algorithmic cuts - nuclear distance";
pub const MULTIPLE_DETECTIONS_STAGE: &str = "Algorithmic cuts - multiple detections";
pub const BRIGHT_HOST_STAGE: &str = "Algorithmic cuts - bright host (stellar)";
pub const NEAR_GAIA_BRIGHT_STAGE: &str = "Algorithmic cuts - neargaiabright";
pub const FAST_CROSSMATCH_STAGE: &str = "Algorithmic crossmatch cuts - fast";
pub const CATWISE_STAGE: &str = "CatWISE cuts";

/// Not star-like: low star/galaxy score, no PS1 match, or the match is too far to be the source
pub fn passes_sgscore(candidate: &Candidate, params: &TriageParameters) -> bool {
    match candidate.sgscore1 {
        None => true,
        Some(sgscore) => {
            sgscore < params.max_sgscore
                || candidate
                    .distpsnr1
                    .is_some_and(|d| d > params.crossmatch_radius_arcsec)
        }
    }
}

/// Away from the Galactic plane
pub fn passes_galactic_latitude(candidate: &Candidate, params: &TriageParameters) -> bool {
    sky::galactic_latitude(candidate.ra, candidate.dec).abs() > params.min_galactic_latitude_deg
}

/// Close to the nucleus of the nearest PS1 source
///
/// A candidate with no PS1 match has no nucleus to be close to and fails.
pub fn passes_nuclear_distance(candidate: &Candidate, params: &TriageParameters) -> bool {
    candidate
        .distpsnr1
        .is_some_and(|d| d >= 0.0 && d < params.max_nuclear_distance_arcsec)
}

pub fn passes_multiple_detections(candidate: &Candidate, params: &TriageParameters) -> bool {
    candidate.ndethist >= params.min_detections
}

/// Every PS1 host magnitude fainter than the bright-star limit (or absent)
pub fn passes_bright_host(candidate: &Candidate, params: &TriageParameters) -> bool {
    candidate
        .host_mags()
        .iter()
        .all(|mag| mag.map_or(true, |m| m > params.bright_host_mag))
}

/// No bright Gaia star nearby; negative distances mean no star was found
pub fn passes_near_gaia_bright(candidate: &Candidate, params: &TriageParameters) -> bool {
    candidate
        .neargaiabright
        .map_or(true, |d| d > params.min_neargaiabright_arcsec || d < 0.0)
}

/// No significant Gaia parallax and no Milliquas quasar match
pub fn passes_fast_crossmatch(
    candidate: &Candidate,
    features: &FeatureTable,
    params: &TriageParameters,
) -> bool {
    let name = candidate.name.as_str();
    let parallax_ok = features
        .get(name, keys::GAIA_PARALLAX_SIGNIFICANCE)
        .map_or(true, |aplx| aplx < params.max_gaia_parallax_significance);
    let quasar = features.flag(name, keys::HAS_MILLIQUAS).unwrap_or(false);
    parallax_ok && !quasar
}

/// Not AGN-like in CatWISE colour
pub fn passes_catwise(
    candidate: &Candidate,
    features: &FeatureTable,
    params: &TriageParameters,
) -> bool {
    features
        .get(&candidate.name, keys::CATWISE_W1_M_W2)
        .map_or(true, |colour| colour <= params.max_catwise_w1_m_w2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TriageParameters {
        TriageParameters::default()
    }

    fn candidate() -> Candidate {
        Candidate::new("a", 150.0, 40.0, 1.0)
    }

    #[test]
    fn test_sgscore() {
        let mut c = candidate();
        assert!(passes_sgscore(&c, &params()));

        c.sgscore1 = Some(0.9);
        c.distpsnr1 = Some(0.5);
        assert!(!passes_sgscore(&c, &params()));

        c.distpsnr1 = Some(3.5);
        assert!(passes_sgscore(&c, &params()));

        c.sgscore1 = Some(0.49);
        c.distpsnr1 = Some(0.5);
        assert!(passes_sgscore(&c, &params()));
    }

    #[test]
    fn test_galactic_latitude() {
        assert!(passes_galactic_latitude(&candidate(), &params()));
        let plane = Candidate::new("sgra", 266.405, -28.936, 1.0);
        assert!(!passes_galactic_latitude(&plane, &params()));
    }

    #[test]
    fn test_nuclear_distance() {
        let mut c = candidate();
        assert!(!passes_nuclear_distance(&c, &params()));
        c.distpsnr1 = Some(0.3);
        assert!(passes_nuclear_distance(&c, &params()));
        c.distpsnr1 = Some(0.9);
        assert!(!passes_nuclear_distance(&c, &params()));
    }

    #[test]
    fn test_nuclear_distance_fails_without_ps1_match() {
        let json = r#"{"name": "a", "ra": 150.0, "dec": 40.0, "jd": 1.0, "distpsnr1": -999.0}"#;
        let c: Candidate = serde_json::from_str(json).unwrap();
        assert_eq!(c.distpsnr1, None);
        assert!(!passes_nuclear_distance(&c, &params()));
    }

    #[test]
    fn test_multiple_detections() {
        let mut c = candidate();
        c.ndethist = 1;
        assert!(!passes_multiple_detections(&c, &params()));
        c.ndethist = 2;
        assert!(passes_multiple_detections(&c, &params()));
    }

    #[test]
    fn test_bright_host() {
        let mut c = candidate();
        assert!(passes_bright_host(&c, &params()));
        c.srmag1 = Some(15.0);
        assert!(passes_bright_host(&c, &params()));
        c.szmag1 = Some(11.5);
        assert!(!passes_bright_host(&c, &params()));
    }

    #[test]
    fn test_near_gaia_bright() {
        let mut c = candidate();
        assert!(passes_near_gaia_bright(&c, &params()));
        c.neargaiabright = Some(2.0);
        assert!(!passes_near_gaia_bright(&c, &params()));
        c.neargaiabright = Some(-1.0);
        assert!(passes_near_gaia_bright(&c, &params()));
        c.neargaiabright = Some(8.0);
        assert!(passes_near_gaia_bright(&c, &params()));
    }

    #[test]
    fn test_fast_crossmatch() {
        let c = candidate();
        let mut features = FeatureTable::new();
        assert!(passes_fast_crossmatch(&c, &features, &params()));

        features.insert("a", keys::GAIA_PARALLAX_SIGNIFICANCE, 5.0);
        assert!(!passes_fast_crossmatch(&c, &features, &params()));

        features.insert("a", keys::GAIA_PARALLAX_SIGNIFICANCE, 1.0);
        features.insert("a", keys::HAS_MILLIQUAS, 1.0);
        assert!(!passes_fast_crossmatch(&c, &features, &params()));
    }

    #[test]
    fn test_catwise() {
        let c = candidate();
        let mut features = FeatureTable::new();
        assert!(passes_catwise(&c, &features, &params()));
        features.insert("a", keys::CATWISE_W1_M_W2, 0.9);
        assert!(!passes_catwise(&c, &features, &params()));
        features.insert("a", keys::CATWISE_W1_M_W2, 0.2);
        assert!(passes_catwise(&c, &features, &params()));
    }
}
