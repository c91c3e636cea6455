//! Model artifact stores
//!
//! Artifacts are logistic models serialized as JSON:
//!
//! ```json
//! { "features": ["x", "y"], "weights": [0.4, -1.2], "intercept": 0.1 }
//! ```
//!
//! [`JsonModelStore`] reads `<models_dir>/<artifact>.json`; the mapping from
//! variant to artifact is carried by the variant itself, so the store holds no
//! global state.

use crate::error::{TriageError, TriageResult};
use crate::services::classifier_invoker::{ClassifierModel, ModelStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Logistic regression over named features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    features: Vec<String>,
    weights: Vec<f64>,
    intercept: f64,
}

impl LogisticModel {
    pub fn new(features: Vec<String>, weights: Vec<f64>, intercept: f64) -> TriageResult<Self> {
        let model = Self {
            features,
            weights,
            intercept,
        };
        model.validate().map_err(|reason| TriageError::model("logistic", reason))?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), String> {
        if self.features.len() != self.weights.len() {
            return Err(format!(
                "{} features but {} weights",
                self.features.len(),
                self.weights.len()
            ));
        }
        if !self.intercept.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err("non-finite coefficient".to_string());
        }
        Ok(())
    }

    fn logit(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .weights
                .iter()
                .zip(row)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl ClassifierModel for LogisticModel {
    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|row| sigmoid(self.logit(row))).collect()
    }

    fn attributions(&self, row: &[f64]) -> Option<Vec<f64>> {
        Some(self.weights.iter().zip(row).map(|(w, x)| w * x).collect())
    }
}

/// Loads `<root>/<artifact>.json`
#[derive(Debug, Clone)]
pub struct JsonModelStore {
    root: PathBuf,
}

impl JsonModelStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn artifact_path(&self, artifact: &str) -> PathBuf {
        self.root.join(format!("{}.json", artifact))
    }
}

impl ModelStore for JsonModelStore {
    fn load(&self, artifact: &str) -> TriageResult<Box<dyn ClassifierModel>> {
        let path = self.artifact_path(artifact);
        debug!(artifact = %artifact, path = %path.display(), "Loading model artifact");

        let content = std::fs::read_to_string(&path).map_err(|e| {
            TriageError::model(artifact, format!("cannot read {}: {}", path.display(), e))
        })?;
        let model: LogisticModel = serde_json::from_str(&content).map_err(|e| {
            TriageError::model(artifact, format!("invalid artifact {}: {}", path.display(), e))
        })?;
        model
            .validate()
            .map_err(|reason| TriageError::model(artifact, reason))?;
        Ok(Box::new(model))
    }
}

/// In-memory store, used when artifacts are built programmatically
#[derive(Debug, Clone, Default)]
pub struct StaticModelStore {
    models: HashMap<String, LogisticModel>,
}

impl StaticModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, artifact: &str, model: LogisticModel) {
        self.models.insert(artifact.to_string(), model);
    }

    pub fn with(mut self, artifact: &str, model: LogisticModel) -> Self {
        self.insert(artifact, model);
        self
    }
}

impl ModelStore for StaticModelStore {
    fn load(&self, artifact: &str) -> TriageResult<Box<dyn ClassifierModel>> {
        self.models
            .get(artifact)
            .cloned()
            .map(|m| Box::new(m) as Box<dyn ClassifierModel>)
            .ok_or_else(|| TriageError::model(artifact, "no such artifact"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_logistic_prediction() {
        let model = LogisticModel::new(vec!["x".into()], vec![2.0], -1.0).unwrap();
        let p = model.predict(&[vec![0.5]]);
        assert_eq!(p, vec![0.5]);
        assert_eq!(model.attributions(&[0.5]), Some(vec![1.0]));
    }

    #[test]
    fn test_mismatched_weights_rejected() {
        assert!(LogisticModel::new(vec!["x".into()], vec![], 0.0).is_err());
        assert!(LogisticModel::new(vec![], vec![], f64::NAN).is_err());
    }

    #[test]
    fn test_json_store_loads_artifact() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("thermal_30.json"),
            r#"{"features":["x"],"weights":[0.0],"intercept":0.0}"#,
        )
        .unwrap();
        let store = JsonModelStore::new(dir.path());

        let model = store.load("thermal_30").unwrap();
        assert_eq!(model.feature_names(), &["x".to_string()]);
        assert_eq!(model.predict(&[vec![3.0]]), vec![0.5]);
    }

    #[test]
    fn test_json_store_missing_or_invalid_artifact() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.json"), r#"{"features":["x"],"weights":[]}"#).unwrap();
        let store = JsonModelStore::new(dir.path());

        assert!(matches!(
            store.load("absent"),
            Err(TriageError::ModelArtifact { .. })
        ));
        assert!(matches!(
            store.load("bad"),
            Err(TriageError::ModelArtifact { .. })
        ));
    }
}
