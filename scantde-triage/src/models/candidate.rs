//! Candidate rows and the candidate table
//!
//! A [`Candidate`] starts as one raw detection at ingestion. Observational
//! fields are fixed; derived fields are filled in additively by the pipeline
//! stages. A [`CandidateTable`] is the unit every stage consumes and returns.

use crate::error::{TriageError, TriageResult};
use crate::models::window::MaturityWindow;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Catalog value used upstream for "no match"
pub const MISSING_SENTINEL: f64 = -999.0;

/// Deserialize an optional catalog float, mapping the `-999` sentinel and NaN to `None`
pub(crate) mod sentinel {
    use super::MISSING_SENTINEL;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<f64>::deserialize(deserializer)?;
        Ok(value.filter(|v| v.is_finite() && *v != MISSING_SENTINEL))
    }
}

/// Winning score and the classifier variant that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinningScore {
    pub score: f64,
    pub classifier: String,
}

/// Lightcurve-fit quantities for the candidate's own maturity window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightcurveFit {
    /// Fit flagged the lightcurve as noise dominated
    pub high_noise: bool,
    /// Fit quality score
    pub lc_score: Option<f64>,
    /// Detections used by the window's fit
    pub n_detections: Option<f64>,
}

/// Post-hoc presentation flags; never affect the winning score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityFlags {
    pub is_junk: bool,
    pub is_dwarf: bool,
}

/// One physical source under triage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Stable source name, unique within a run after deduplication
    #[serde(alias = "ztf_name")]
    pub name: String,

    pub ra: f64,
    pub dec: f64,

    /// Epoch of this detection (JD)
    pub jd: f64,

    /// Epoch of the first detection in the alert history (JD)
    #[serde(default, with = "sentinel_opt")]
    pub jdstarthist: Option<f64>,

    /// Photometric band id (1 = g, 2 = r, 3 = i)
    #[serde(default)]
    pub fid: Option<u8>,

    #[serde(default, with = "sentinel_opt")]
    pub magpsf: Option<f64>,

    #[serde(default, with = "sentinel_opt")]
    pub sigmapsf: Option<f64>,

    /// Star/galaxy score of the nearest PS1 source
    #[serde(default, with = "sentinel_opt")]
    pub sgscore1: Option<f64>,

    /// Distance to the nearest PS1 source (arcsec)
    #[serde(default, with = "sentinel_opt")]
    pub distpsnr1: Option<f64>,

    #[serde(default, with = "sentinel_opt")]
    pub sgmag1: Option<f64>,
    #[serde(default, with = "sentinel_opt")]
    pub srmag1: Option<f64>,
    #[serde(default, with = "sentinel_opt")]
    pub simag1: Option<f64>,
    #[serde(default, with = "sentinel_opt")]
    pub szmag1: Option<f64>,

    /// Distance to the nearest bright Gaia star (arcsec)
    #[serde(default, with = "sentinel_opt")]
    pub neargaiabright: Option<f64>,

    /// Number of historical detections
    #[serde(default)]
    pub ndethist: u32,

    /// Member of the curated known-positive set
    #[serde(default, alias = "is_tde")]
    pub is_known_positive: bool,

    /// Position in the raw ingestion order; breaks deduplication ties
    #[serde(default)]
    pub ingest_index: usize,

    /// Days from first detection to decision time
    #[serde(default)]
    pub age_days: Option<f64>,

    /// Maturity window, set once per run
    #[serde(default)]
    pub window: Option<MaturityWindow>,

    /// Every non-null score ever assigned, by classifier variant
    #[serde(default)]
    pub variant_scores: BTreeMap<String, f64>,

    #[serde(default)]
    pub winner: Option<WinningScore>,

    #[serde(default)]
    pub lightcurve_fit: Option<LightcurveFit>,

    #[serde(default)]
    pub flags: QualityFlags,

    /// Name of the stage that rejected this candidate
    #[serde(default)]
    pub fail_step: Option<String>,
}

/// Serde adapter: sentinel-aware on the way in, plain `Option` on the way out
mod sentinel_opt {
    use serde::{Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        super::sentinel::deserialize(deserializer)
    }
}

impl Candidate {
    /// Minimal candidate with only identity, position and epoch
    pub fn new(name: impl Into<String>, ra: f64, dec: f64, jd: f64) -> Self {
        Self {
            name: name.into(),
            ra,
            dec,
            jd,
            jdstarthist: None,
            fid: None,
            magpsf: None,
            sigmapsf: None,
            sgscore1: None,
            distpsnr1: None,
            sgmag1: None,
            srmag1: None,
            simag1: None,
            szmag1: None,
            neargaiabright: None,
            ndethist: 0,
            is_known_positive: false,
            ingest_index: 0,
            age_days: None,
            window: None,
            variant_scores: BTreeMap::new(),
            winner: None,
            lightcurve_fit: None,
            flags: QualityFlags::default(),
            fail_step: None,
        }
    }

    /// Epoch of first detection, falling back to this detection's epoch
    pub fn first_detection_jd(&self) -> f64 {
        self.jdstarthist.unwrap_or(self.jd)
    }

    /// PS1 host magnitudes in g, r, i, z
    pub fn host_mags(&self) -> [Option<f64>; 4] {
        [self.sgmag1, self.srmag1, self.simag1, self.szmag1]
    }

    /// Winning score, if any classifier produced one
    pub fn winning_score(&self) -> Option<f64> {
        self.winner.as_ref().map(|w| w.score)
    }

    /// Winning classifier name, if any
    pub fn winning_classifier(&self) -> Option<&str> {
        self.winner.as_ref().map(|w| w.classifier.as_str())
    }

    /// Assign the maturity window; a second, different assignment is rejected
    pub fn assign_window(&mut self, window: MaturityWindow) -> TriageResult<()> {
        match self.window {
            Some(existing) if existing != window => Err(TriageError::InvalidInput(format!(
                "{} already assigned to window {}, refusing {}",
                self.name,
                existing.label(),
                window.label()
            ))),
            _ => {
                self.window = Some(window);
                Ok(())
            }
        }
    }

    /// Clear every field a run derives, leaving the raw detection
    pub fn reset_derived(&mut self) {
        self.age_days = None;
        self.window = None;
        self.variant_scores.clear();
        self.winner = None;
        self.lightcurve_fit = None;
        self.flags = QualityFlags::default();
        self.fail_step = None;
    }

    /// Record a classifier score and move the winner pointer to it
    pub fn record_score(&mut self, variant: &str, score: f64) {
        self.variant_scores.insert(variant.to_string(), score);
        self.winner = Some(WinningScore {
            score,
            classifier: variant.to_string(),
        });
    }
}

/// Ordered set of candidates for one run (or one query)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateTable {
    rows: Vec<Candidate>,
}

impl CandidateTable {
    pub fn new(rows: Vec<Candidate>) -> Self {
        Self { rows }
    }

    /// Build a table from raw detections, stamping each row's ingestion order
    pub fn from_ingested(rows: Vec<Candidate>) -> Self {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, mut c)| {
                c.ingest_index = i;
                c
            })
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.rows.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Candidate> {
        self.rows.iter_mut()
    }

    pub fn rows(&self) -> &[Candidate] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Candidate> {
        self.rows
    }

    pub fn push(&mut self, candidate: Candidate) {
        self.rows.push(candidate);
    }

    pub fn extend(&mut self, other: CandidateTable) {
        self.rows.extend(other.rows);
    }

    /// Candidate names in table order
    pub fn names(&self) -> Vec<String> {
        self.rows.iter().map(|c| c.name.clone()).collect()
    }

    /// Distinct known-positive names present, sorted
    pub fn known_positive_names(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter(|c| c.is_known_positive)
            .map(|c| c.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn known_positive_count(&self) -> usize {
        self.rows.iter().filter(|c| c.is_known_positive).count()
    }

    pub fn get(&self, name: &str) -> Option<&Candidate> {
        self.rows.iter().find(|c| c.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Candidate> {
        self.rows.iter_mut().find(|c| c.name == name)
    }

    /// Evaluate a predicate per row into a mask aligned with the table
    pub fn mask<F>(&self, predicate: F) -> Vec<bool>
    where
        F: Fn(&Candidate) -> bool,
    {
        self.rows.iter().map(predicate).collect()
    }

    /// Rows matching a predicate, cloned into a new table
    pub fn filtered<F>(&self, predicate: F) -> CandidateTable
    where
        F: Fn(&Candidate) -> bool,
    {
        Self::new(self.rows.iter().filter(|c| predicate(c)).cloned().collect())
    }

    /// Split into (kept, rejected) by a mask aligned with the rows
    pub(crate) fn partition(self, mask: &[bool]) -> (CandidateTable, CandidateTable) {
        let mut kept = Vec::with_capacity(self.rows.len());
        let mut rejected = Vec::new();
        for (candidate, keep) in self.rows.into_iter().zip(mask.iter().copied()) {
            if keep {
                kept.push(candidate);
            } else {
                rejected.push(candidate);
            }
        }
        (Self::new(kept), Self::new(rejected))
    }

    /// Sort by winning score, highest first; unscored rows last, stable otherwise
    pub fn sort_by_winning_score(&mut self) {
        self.rows.sort_by(|a, b| {
            let a = a.winning_score().unwrap_or(f64::NEG_INFINITY);
            let b = b.winning_score().unwrap_or(f64::NEG_INFINITY);
            b.total_cmp(&a)
        });
    }
}

impl IntoIterator for CandidateTable {
    type Item = Candidate;
    type IntoIter = std::vec::IntoIter<Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a CandidateTable {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl FromIterator<Candidate> for CandidateTable {
    fn from_iter<I: IntoIterator<Item = Candidate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
