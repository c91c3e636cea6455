//! Test fixtures for pipeline integration tests
//!
//! Every fixture model is a one-feature logistic model whose input is the
//! logit of the score it should produce, so a candidate's score for a
//! variant is set directly through its feature row.

#![allow(dead_code)]

use scantde_common::time::decision_julian_date;
use scantde_triage::models::{Candidate, FeatureTable, MaturityWindow};
use scantde_triage::services::window_selector::DEFAULT_THRESHOLDS;
use scantde_triage::services::{LogisticModel, StaticModelStore};
use scantde_triage::StaticFeatureSource;

pub const NIGHT: &str = "20240110";

pub const HOST: &str = "host_logit";
pub const INFANT: &str = "infant_logit";
pub const WEEK: &str = "week_logit";
pub const THERMAL: &str = "thermal_logit";
pub const FULL: &str = "full_logit";

/// Decision time of [`NIGHT`] as a Julian date
pub fn decision_jd() -> f64 {
    decision_julian_date(NIGHT, 15).unwrap()
}

pub fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

/// Nuclear, extragalactic candidate that passes every algorithmic cut
pub fn galaxy(name: &str, age_days: f64) -> Candidate {
    let start = decision_jd() - age_days;
    let mut c = Candidate::new(name, 150.0, 40.0, start + age_days / 2.0);
    c.jdstarthist = Some(start);
    c.sgscore1 = Some(0.1);
    c.distpsnr1 = Some(0.3);
    c.ndethist = 5;
    c.magpsf = Some(19.0);
    c
}

/// Star-like detection removed by the sgscore cut
pub fn star(name: &str) -> Candidate {
    let mut c = galaxy(name, 20.0);
    c.sgscore1 = Some(0.9);
    c
}

pub fn known(mut candidate: Candidate) -> Candidate {
    candidate.is_known_positive = true;
    candidate
}

pub fn model_for(feature: &str) -> LogisticModel {
    LogisticModel::new(vec![feature.to_string()], vec![1.0], 0.0).unwrap()
}

fn all_windows() -> Vec<MaturityWindow> {
    let mut windows: Vec<MaturityWindow> = DEFAULT_THRESHOLDS
        .iter()
        .map(|d| MaturityWindow::Days(*d))
        .collect();
    windows.push(MaturityWindow::AllHistory);
    windows
}

/// Store with every artifact the three selections load
pub fn model_store() -> StaticModelStore {
    let mut store = StaticModelStore::new()
        .with("host", model_for(HOST))
        .with("infant", model_for(INFANT))
        .with("week", model_for(WEEK))
        .with("full", model_for(FULL));
    for window in all_windows() {
        store.insert(&window.variant_name(), model_for(THERMAL));
        store.insert(&format!("thermal_nohostinfo_{}", window.label()), model_for(THERMAL));
    }
    store
}

/// Builder for per-candidate features
#[derive(Default)]
pub struct Features {
    table: FeatureTable,
}

impl Features {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lightcurve available and every classifier able to score at `p`
    pub fn scorable(self, name: &str, p: f64) -> Self {
        self.lightcurve(name)
            .score(name, HOST, p)
            .score(name, INFANT, p)
            .score(name, WEEK, p)
            .score(name, THERMAL, p)
            .score(name, FULL, p)
    }

    pub fn lightcurve(mut self, name: &str) -> Self {
        self.table.insert(name, "has_lightcurve", 1.0);
        self
    }

    pub fn score(mut self, name: &str, feature: &str, p: f64) -> Self {
        self.table.insert(name, feature, logit(p));
        self
    }

    pub fn value(mut self, name: &str, key: &str, value: f64) -> Self {
        self.table.insert(name, key, value);
        self
    }

    pub fn table(&self) -> &FeatureTable {
        &self.table
    }

    pub fn source(self) -> StaticFeatureSource {
        StaticFeatureSource::new(self.table)
    }
}
