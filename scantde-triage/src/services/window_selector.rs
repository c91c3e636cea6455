//! Thermal Window Selector
//!
//! Maps a candidate's age (days since first detection) to the maturity window
//! whose classifier applies. The finite thresholds come from configuration;
//! the unbounded bucket always closes the list.

use crate::error::{TriageError, TriageResult};
use crate::models::{CandidateTable, MaturityWindow};
use scantde_common::time;
use tracing::{debug, info};

/// Default finite thresholds in days
pub const DEFAULT_THRESHOLDS: [f64; 6] = [14.0, 30.0, 60.0, 90.0, 180.0, 365.0];

/// Selects the smallest window whose threshold is not exceeded by the age
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSelector {
    thresholds: Vec<f64>,
}

impl Default for WindowSelector {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
        }
    }
}

impl WindowSelector {
    /// Build from finite, strictly increasing thresholds
    pub fn new(thresholds: Vec<f64>) -> TriageResult<Self> {
        if let Some(bad) = thresholds.iter().find(|t| !t.is_finite() || **t < 0.0) {
            return Err(TriageError::Config(format!(
                "Thermal window threshold {} must be finite and non-negative",
                bad
            )));
        }
        if thresholds.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(TriageError::Config(format!(
                "Thermal window thresholds must be strictly increasing: {:?}",
                thresholds
            )));
        }
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Every window in increasing order, the unbounded bucket last
    pub fn windows(&self) -> Vec<MaturityWindow> {
        self.thresholds
            .iter()
            .map(|t| MaturityWindow::Days(*t))
            .chain(std::iter::once(MaturityWindow::AllHistory))
            .collect()
    }

    /// Window for an age in days
    ///
    /// An age exactly on a threshold belongs to that threshold's window;
    /// `age > t` is what excludes a window. Non-finite ages have no window.
    pub fn select(&self, age_days: f64) -> Option<MaturityWindow> {
        if age_days.is_nan() {
            return None;
        }
        if age_days == f64::INFINITY {
            return Some(MaturityWindow::AllHistory);
        }
        if !age_days.is_finite() {
            return None;
        }
        let window = self
            .thresholds
            .iter()
            .find(|t| age_days <= **t)
            .map(|t| MaturityWindow::Days(*t))
            .unwrap_or(MaturityWindow::AllHistory);
        Some(window)
    }
}

/// Canonical age: decision time minus first detection, in days
pub fn age_days(first_detection_jd: f64, decision_jd: f64) -> f64 {
    decision_jd - first_detection_jd
}

/// Compute ages and assign windows for every candidate
///
/// Ages are evaluated at `decision_hour_utc` on `night` (YYYYMMDD). Rows
/// whose age cannot be computed keep `window = None` and are left for the
/// unscored bucket downstream.
pub fn assign_windows(
    table: &mut CandidateTable,
    selector: &WindowSelector,
    night: &str,
    decision_hour_utc: u32,
) -> TriageResult<()> {
    let decision_jd = time::decision_julian_date(night, decision_hour_utc)?;
    let mut unassigned = 0usize;

    for candidate in table.iter_mut() {
        let age = age_days(candidate.first_detection_jd(), decision_jd);
        candidate.age_days = age.is_finite().then_some(age);
        match selector.select(age) {
            Some(window) => candidate.assign_window(window)?,
            None => {
                debug!(name = %candidate.name, "No finite age, no maturity window");
                unassigned += 1;
            }
        }
    }

    info!(
        night = %night,
        decision_jd,
        unassigned,
        "Assigned maturity windows to {} sources",
        table.len() - unassigned
    );
    Ok(())
}
