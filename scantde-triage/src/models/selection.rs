//! Selection variants
//!
//! A selection is one configuration of required filters and classifier set.
//! Its identifier is threaded through every cache filename so variants never
//! collide.

use crate::error::TriageError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Known selection variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionVariant {
    /// Nuclear candidates scored with host and lightcurve classifiers
    #[serde(rename = "tdescore")]
    Classic,
    /// Nuclear candidates scored without host information
    #[serde(rename = "tdescore_nohostinfo")]
    NoHostInfo,
    /// Off-nuclear candidates with multiple detections
    #[serde(rename = "tdescore_offnuclear")]
    OffNuclear,
}

impl SelectionVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionVariant::Classic => "tdescore",
            SelectionVariant::NoHostInfo => "tdescore_nohostinfo",
            SelectionVariant::OffNuclear => "tdescore_offnuclear",
        }
    }

    pub fn all() -> [SelectionVariant; 3] {
        [
            SelectionVariant::Classic,
            SelectionVariant::NoHostInfo,
            SelectionVariant::OffNuclear,
        ]
    }

    /// Stage and classifier configuration of this variant
    pub fn config(&self) -> SelectionConfig {
        match self {
            SelectionVariant::Classic => SelectionConfig {
                name: self.as_str().to_string(),
                require_nuclear: true,
                require_multiple_detections: false,
                cut_wise: true,
                host_classifier: true,
                early_lightcurve_classifiers: true,
                thermal_include_host: true,
                full_classifier: true,
                immature_age_cut: true,
                min_winning_score: true,
            },
            SelectionVariant::NoHostInfo => SelectionConfig {
                name: self.as_str().to_string(),
                require_nuclear: true,
                require_multiple_detections: false,
                cut_wise: true,
                host_classifier: false,
                early_lightcurve_classifiers: false,
                thermal_include_host: false,
                full_classifier: false,
                immature_age_cut: false,
                min_winning_score: false,
            },
            SelectionVariant::OffNuclear => SelectionConfig {
                name: self.as_str().to_string(),
                require_nuclear: false,
                require_multiple_detections: true,
                cut_wise: true,
                host_classifier: false,
                early_lightcurve_classifiers: false,
                thermal_include_host: true,
                full_classifier: false,
                immature_age_cut: false,
                min_winning_score: false,
            },
        }
    }
}

impl std::fmt::Display for SelectionVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionVariant {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tdescore" | "classic" => Ok(SelectionVariant::Classic),
            "tdescore_nohostinfo" | "nohostinfo" => Ok(SelectionVariant::NoHostInfo),
            "tdescore_offnuclear" | "offnuclear" => Ok(SelectionVariant::OffNuclear),
            other => Err(TriageError::Config(format!("Unknown selection '{}'", other))),
        }
    }
}

/// Which stages and classifiers a selection runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Identifier used in cache keys
    pub name: String,
    /// Apply the nuclear-distance cut
    pub require_nuclear: bool,
    /// Apply the multiple-detection cut
    pub require_multiple_detections: bool,
    /// Apply the CatWISE colour cut
    pub cut_wise: bool,
    /// Score with the host-only classifier and apply its floor
    pub host_classifier: bool,
    /// Score with the infant (required) and week classifiers
    pub early_lightcurve_classifiers: bool,
    /// Thermal artifacts trained with host features
    pub thermal_include_host: bool,
    /// Score with the full-history classifier
    pub full_classifier: bool,
    /// Cut immature winners older than the immature-age limit
    pub immature_age_cut: bool,
    /// Apply the terminal winning-score threshold
    pub min_winning_score: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_identifiers() {
        for variant in SelectionVariant::all() {
            let parsed: SelectionVariant = variant.as_str().parse().unwrap();
            assert_eq!(parsed, variant);
            assert_eq!(variant.config().name, variant.as_str());
        }
    }

    #[test]
    fn test_short_aliases() {
        assert_eq!(
            "offnuclear".parse::<SelectionVariant>().unwrap(),
            SelectionVariant::OffNuclear
        );
        assert!("bogus".parse::<SelectionVariant>().is_err());
    }

    #[test]
    fn test_offnuclear_drops_nuclear_requirement() {
        let config = SelectionVariant::OffNuclear.config();
        assert!(!config.require_nuclear);
        assert!(config.require_multiple_detections);
        assert!(!config.host_classifier);
    }

    #[test]
    fn test_nohostinfo_uses_host_free_thermal_artifacts() {
        assert!(!SelectionVariant::NoHostInfo.config().thermal_include_host);
        assert!(SelectionVariant::Classic.config().thermal_include_host);
    }
}
