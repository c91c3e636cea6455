//! Feature table supplied by the crossmatch and lightcurve collaborators
//!
//! Features are numeric and keyed by candidate name, then feature name.
//! Booleans are stored as 0.0/1.0. A missing key and a non-finite value both
//! mean "not available"; nothing is ever imputed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known feature keys consumed by the pipeline itself
pub mod keys {
    /// Gaia parallax significance (parallax / error)
    pub const GAIA_PARALLAX_SIGNIFICANCE: &str = "gaia_aplx";
    /// Matched to a Milliquas quasar
    pub const HAS_MILLIQUAS: &str = "has_milliquas";
    /// CatWISE W1 - W2 colour
    pub const CATWISE_W1_M_W2: &str = "catwise_w1_m_w2";
    /// Lightcurve data could be served for the candidate
    pub const HAS_LIGHTCURVE: &str = "has_lightcurve";
    /// Host r-band Kron magnitude (PS1)
    pub const HOST_R_KRON_MAG: &str = "rMeanKronMag";
    /// Spectroscopic host redshift
    pub const Z_SPEC: &str = "z_spec";
    /// Photometric host redshift (median)
    pub const Z_PHOT: &str = "z_phot_median";
    /// Redshift reported by an external service
    pub const Z_EXTERNAL: &str = "external_redshift";

    /// Per-window lightcurve-fit quantities (prefixed by the window)
    pub const LC_HIGH_NOISE: &str = "high_noise";
    pub const LC_SCORE: &str = "score";
    pub const LC_N_DETECTIONS: &str = "n_detections";
}

/// Features of one candidate
pub type FeatureRow = BTreeMap<String, f64>;

/// Features of many candidates, joined by candidate name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureTable {
    rows: BTreeMap<String, FeatureRow>,
}

impl FeatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, name: &str) -> Option<&FeatureRow> {
        self.rows.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rows.contains_key(name)
    }

    /// Set one feature value
    pub fn insert(&mut self, name: &str, key: &str, value: f64) {
        self.rows
            .entry(name.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Replace a candidate's whole row
    pub fn insert_row(&mut self, name: &str, row: FeatureRow) {
        self.rows.insert(name.to_string(), row);
    }

    /// Finite feature value, `None` if absent or non-finite
    pub fn get(&self, name: &str, key: &str) -> Option<f64> {
        self.rows
            .get(name)
            .and_then(|row| row.get(key))
            .copied()
            .filter(|v| v.is_finite())
    }

    /// Boolean feature (non-zero is true), `None` if absent
    pub fn flag(&self, name: &str, key: &str) -> Option<bool> {
        self.get(name, key).map(|v| v != 0.0)
    }

    /// Merge another table in; values from `other` win on conflict
    pub fn merge(&mut self, other: FeatureTable) {
        for (name, row) in other.rows {
            self.rows.entry(name).or_default().extend(row);
        }
    }

    /// Restrict to the named candidates
    pub fn subset<'a, I>(&self, names: I) -> FeatureTable
    where
        I: IntoIterator<Item = &'a String>,
    {
        let rows = names
            .into_iter()
            .filter_map(|n| self.rows.get(n).map(|row| (n.clone(), row.clone())))
            .collect();
        FeatureTable { rows }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FeatureRow)> {
        self.rows.iter()
    }
}
