//! Classifier Invoker
//!
//! Loads the artifact of one classifier variant, extracts its feature columns
//! and scores every row that has all of them. Rows missing any required
//! feature are reported through the unscorable mask and never reach the
//! model; nothing is imputed.

use crate::error::{TriageError, TriageResult};
use crate::models::{Candidate, CandidateTable, ClassifierVariant, FeatureTable};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A trained scoring function
pub trait ClassifierModel {
    /// Feature columns the model consumes, in input order
    fn feature_names(&self) -> &[String];

    /// Probability per input row; rows are aligned with `feature_names`
    fn predict(&self, rows: &[Vec<f64>]) -> Vec<f64>;

    /// Per-feature contributions to one row's score, if the model supports them
    fn attributions(&self, _row: &[f64]) -> Option<Vec<f64>> {
        None
    }
}

/// Source of model artifacts, keyed by artifact name
pub trait ModelStore {
    /// Load an artifact; a missing or invalid artifact is a fatal configuration error
    fn load(&self, artifact: &str) -> TriageResult<Box<dyn ClassifierModel>>;
}

/// Destination for auxiliary per-candidate explanation artifacts
pub trait AttributionSink {
    fn write(&self, attribution: &FeatureAttribution) -> TriageResult<()>;
}

/// One feature's contribution to a candidate's score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub feature: String,
    pub value: f64,
    pub contribution: f64,
}

/// Explanation of one candidate's score under one variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAttribution {
    pub name: String,
    pub variant: String,
    pub score: f64,
    pub contributions: Vec<FeatureContribution>,
}

/// Score (or its absence) for one input row
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRow {
    pub name: String,
    /// `None` when the row was unscorable
    pub score: Option<f64>,
}

/// Output of one invocation, aligned with the input table
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierOutput {
    pub variant: String,
    pub rows: Vec<ScoredRow>,
}

impl ClassifierOutput {
    pub fn empty(variant: &str) -> Self {
        Self {
            variant: variant.to_string(),
            rows: Vec::new(),
        }
    }

    /// True where the row could not be scored
    pub fn unscorable_mask(&self) -> Vec<bool> {
        self.rows.iter().map(|r| r.score.is_none()).collect()
    }

    /// (name, score) of every scored row
    pub fn scored(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rows
            .iter()
            .filter_map(|r| r.score.map(|s| (r.name.as_str(), s)))
    }

    pub fn n_scored(&self) -> usize {
        self.rows.iter().filter(|r| r.score.is_some()).count()
    }

    pub fn n_unscorable(&self) -> usize {
        self.rows.len() - self.n_scored()
    }

    pub fn score_of(&self, name: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.name == name)
            .and_then(|r| r.score)
    }
}

/// Score `table` with `variant`
///
/// **Algorithm:**
/// 1. Load the variant's artifact (failure is fatal)
/// 2. Per row, look up every required feature; a row missing any is unscorable
/// 3. Predict on the scorable rows only and validate each probability
/// 4. Optionally hand per-row attributions to the sink; sink failures are
///    logged and ignored
///
/// # Errors
/// [`TriageError::ModelArtifact`] if the artifact cannot be loaded or the
/// model returns a non-probability.
pub fn invoke(
    table: &CandidateTable,
    features: &FeatureTable,
    variant: &ClassifierVariant,
    store: &dyn ModelStore,
    attribution_sink: Option<&dyn AttributionSink>,
) -> TriageResult<ClassifierOutput> {
    let model = store.load(&variant.artifact)?;
    let required = model.feature_names();

    let mut inputs: Vec<Vec<f64>> = Vec::with_capacity(table.len());
    let mut input_rows: Vec<usize> = Vec::with_capacity(table.len());
    let mut rows: Vec<ScoredRow> = Vec::with_capacity(table.len());

    for (i, candidate) in table.iter().enumerate() {
        rows.push(ScoredRow {
            name: candidate.name.clone(),
            score: None,
        });
        let mut values = Vec::with_capacity(required.len());
        for key in required {
            match feature_value(candidate, features, key) {
                Some(v) => values.push(v),
                None => {
                    debug!(
                        variant = %variant.name,
                        name = %candidate.name,
                        feature = %key,
                        "Missing feature, row unscorable"
                    );
                    break;
                }
            }
        }
        if values.len() == required.len() {
            inputs.push(values);
            input_rows.push(i);
        }
    }

    if inputs.is_empty() {
        info!(
            variant = %variant.name,
            unscorable = rows.len(),
            "No scorable rows"
        );
        return Ok(ClassifierOutput {
            variant: variant.name.clone(),
            rows,
        });
    }

    let predictions = model.predict(&inputs);
    if predictions.len() != inputs.len() {
        return Err(TriageError::model(
            &variant.name,
            format!(
                "model returned {} predictions for {} rows",
                predictions.len(),
                inputs.len()
            ),
        ));
    }

    for ((row_index, input), probability) in input_rows.iter().zip(&inputs).zip(predictions) {
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(TriageError::model(
                &variant.name,
                format!(
                    "score {} for {} is not a probability",
                    probability, rows[*row_index].name
                ),
            ));
        }
        rows[*row_index].score = Some(probability);

        if let Some(sink) = attribution_sink {
            export_attribution(sink, model.as_ref(), variant, &rows[*row_index].name, probability, input);
        }
    }

    let output = ClassifierOutput {
        variant: variant.name.clone(),
        rows,
    };
    info!(
        variant = %variant.name,
        artifact = %variant.artifact,
        scored = output.n_scored(),
        unscorable = output.n_unscorable(),
        "Scored {} sources with '{}'",
        output.n_scored(),
        variant.name
    );
    Ok(output)
}

fn export_attribution(
    sink: &dyn AttributionSink,
    model: &dyn ClassifierModel,
    variant: &ClassifierVariant,
    name: &str,
    score: f64,
    input: &[f64],
) {
    let Some(contributions) = model.attributions(input) else {
        return;
    };
    let attribution = FeatureAttribution {
        name: name.to_string(),
        variant: variant.name.clone(),
        score,
        contributions: model
            .feature_names()
            .iter()
            .zip(input)
            .zip(contributions)
            .map(|((feature, value), contribution)| FeatureContribution {
                feature: feature.clone(),
                value: *value,
                contribution,
            })
            .collect(),
    };
    if let Err(e) = sink.write(&attribution) {
        warn!(variant = %variant.name, name = %name, error = %e, "Failed to write attribution");
    }
}

/// Feature value from the feature table, falling back to the candidate's own columns
fn feature_value(candidate: &Candidate, features: &FeatureTable, key: &str) -> Option<f64> {
    features
        .get(&candidate.name, key)
        .or_else(|| candidate_column(candidate, key))
}

fn candidate_column(candidate: &Candidate, key: &str) -> Option<f64> {
    let value = match key {
        "ra" => Some(candidate.ra),
        "dec" => Some(candidate.dec),
        "magpsf" => candidate.magpsf,
        "sigmapsf" => candidate.sigmapsf,
        "sgscore1" => candidate.sgscore1,
        "distpsnr1" => candidate.distpsnr1,
        "sgmag1" => candidate.sgmag1,
        "srmag1" => candidate.srmag1,
        "simag1" => candidate.simag1,
        "szmag1" => candidate.szmag1,
        "neargaiabright" => candidate.neargaiabright,
        "ndethist" => Some(f64::from(candidate.ndethist)),
        "age" | "age_days" => candidate.age_days,
        _ => None,
    };
    value.filter(|v| v.is_finite())
}
