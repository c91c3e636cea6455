//! Classifier variants and their precedence
//!
//! A variant is a named scoring function bound to one maturity window, or to
//! one of the age-independent stages (host-only, infant, week, full history).
//! The precedence list orders variants by increasing data maturity; the
//! Best-Score Reducer consumes it as-is.

use crate::error::{TriageError, TriageResult};
use crate::models::window::MaturityWindow;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What a variant was trained on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    /// Host-galaxy crossmatch data only, age independent
    Host,
    /// Earliest lightcurve data
    Infant,
    /// First week of lightcurve data
    Week,
    /// Lightcurve fit restricted to one maturity window
    Thermal(MaturityWindow),
    /// Full lightcurve history
    Full,
}

/// A named, versioned scoring function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierVariant {
    /// Name used in score maps and as the winning-classifier label
    pub name: String,
    /// Model artifact to load from the model store
    pub artifact: String,
    pub kind: VariantKind,
}

impl ClassifierVariant {
    pub fn host() -> Self {
        Self::plain("host", VariantKind::Host)
    }

    pub fn infant() -> Self {
        Self::plain("infant", VariantKind::Infant)
    }

    pub fn week() -> Self {
        Self::plain("week", VariantKind::Week)
    }

    pub fn full() -> Self {
        Self::plain("full", VariantKind::Full)
    }

    /// Thermal-window variant; host-free artifacts live under `thermal_nohostinfo_*`
    pub fn thermal(window: MaturityWindow, include_host: bool) -> Self {
        let artifact = if include_host {
            window.variant_name()
        } else {
            format!("thermal_nohostinfo_{}", window.label())
        };
        Self {
            name: window.variant_name(),
            artifact,
            kind: VariantKind::Thermal(window),
        }
    }

    fn plain(name: &str, kind: VariantKind) -> Self {
        Self {
            name: name.to_string(),
            artifact: name.to_string(),
            kind,
        }
    }

    /// Host, infant and week variants are trained on little or no history
    pub fn is_immature(&self) -> bool {
        matches!(
            self.kind,
            VariantKind::Host | VariantKind::Infant | VariantKind::Week
        )
    }

    pub fn window(&self) -> Option<MaturityWindow> {
        match self.kind {
            VariantKind::Thermal(window) => Some(window),
            _ => None,
        }
    }
}

/// Variant names in increasing order of data maturity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScorePrecedence {
    order: Vec<String>,
}

impl ScorePrecedence {
    pub fn new(order: Vec<String>) -> TriageResult<Self> {
        let mut seen = HashSet::new();
        for name in &order {
            if !seen.insert(name.as_str()) {
                return Err(TriageError::Config(format!(
                    "Variant '{}' appears twice in score precedence",
                    name
                )));
            }
        }
        Ok(Self { order })
    }

    /// host → infant → week → thermal windows (increasing) → full
    pub fn standard(windows: &[MaturityWindow]) -> Self {
        let mut order: Vec<String> = ["host", "infant", "week"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        order.extend(windows.iter().map(|w| w.variant_name()));
        order.push("full".to_string());
        Self { order }
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|n| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Names of the immature (host/infant/week) variants
    pub fn immature_names() -> [&'static str; 3] {
        ["host", "infant", "week"]
    }
}
