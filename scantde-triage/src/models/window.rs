//! Maturity ("thermal") windows
//!
//! Each window bounds how much observation history a classifier was trained
//! on. Finite windows carry their threshold in days; `AllHistory` is the
//! unbounded bucket that applies once a candidate outgrows every threshold.

use serde::{Deserialize, Serialize};

/// One discrete maturity bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaturityWindow {
    /// Applies to ages up to and including this many days
    Days(f64),
    /// Unbounded bucket, all available history
    AllHistory,
}

impl MaturityWindow {
    /// Threshold in days, `None` for the unbounded bucket
    pub fn days(&self) -> Option<f64> {
        match self {
            MaturityWindow::Days(days) => Some(*days),
            MaturityWindow::AllHistory => None,
        }
    }

    /// Short label: "30" for a 30-day window, "all" for the unbounded one
    pub fn label(&self) -> String {
        match self {
            MaturityWindow::Days(days) if days.fract() == 0.0 => format!("{:.0}", days),
            MaturityWindow::Days(days) => format!("{}", days),
            MaturityWindow::AllHistory => "all".to_string(),
        }
    }

    /// Classifier variant name for this window, e.g. "thermal_30"
    pub fn variant_name(&self) -> String {
        format!("thermal_{}", self.label())
    }

    /// Prefix of this window's lightcurve-fit feature keys
    ///
    /// `thermal_30d_` for a 30-day window, `thermal_all_` for all history.
    pub fn feature_prefix(&self) -> String {
        match self {
            MaturityWindow::Days(_) => format!("thermal_{}d_", self.label()),
            MaturityWindow::AllHistory => "thermal_all_".to_string(),
        }
    }

    /// Key of one lightcurve-fit quantity for this window
    pub fn feature_key(&self, quantity: &str) -> String {
        format!("{}{}", self.feature_prefix(), quantity)
    }

    /// True for windows at or beyond `min_days`; the unbounded window always is
    pub fn is_at_least(&self, min_days: f64) -> bool {
        match self {
            MaturityWindow::Days(days) => *days >= min_days,
            MaturityWindow::AllHistory => true,
        }
    }
}
