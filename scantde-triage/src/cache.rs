//! Per-night result caches
//!
//! Layout under the data directory:
//!
//! ```text
//! results/<night>/scantde_<selection>_log.json         processing log
//! results/<night>/scantde_<selection>_candidates.json  scored candidate table
//! results/<night>/scantde_<selection>_results.json     candidates joined with features
//! results/<night>/scantde_<selection>_rejected.jsonl   rejected rows
//! results/<night>/<selection>/shap/                    feature attributions
//! ```
//!
//! The selection identifier is part of every name so variants never collide.

use crate::error::{CacheKind, TriageError, TriageResult};
use crate::models::{Candidate, CandidateTable, FeatureRow, FeatureTable, SelectionVariant};
use crate::processing_log::ProcessingLog;
use scantde_common::config::ensure_directory;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One row of the results cache: a candidate plus every feature known for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(flatten)]
    pub candidate: Candidate,
    #[serde(default)]
    pub features: FeatureRow,
}

impl ResultRow {
    /// Join a candidate with its features, dropping non-finite values
    pub fn join(candidate: &Candidate, features: &FeatureTable) -> Self {
        let features = features
            .row(&candidate.name)
            .map(|row| {
                row.iter()
                    .filter(|(_, v)| v.is_finite())
                    .map(|(k, v)| (k.clone(), *v))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            candidate: candidate.clone(),
            features,
        }
    }
}

/// Resolves cache paths under one data directory
#[derive(Debug, Clone)]
pub struct CachePaths {
    data_dir: PathBuf,
}

impl CachePaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn night_dir(&self, night: &str) -> PathBuf {
        self.data_dir.join("results").join(night)
    }

    fn file(&self, night: &str, selection: SelectionVariant, suffix: &str) -> PathBuf {
        self.night_dir(night)
            .join(format!("scantde_{}_{}", selection.as_str(), suffix))
    }

    pub fn log_path(&self, night: &str, selection: SelectionVariant) -> PathBuf {
        self.file(night, selection, "log.json")
    }

    pub fn candidates_path(&self, night: &str, selection: SelectionVariant) -> PathBuf {
        self.file(night, selection, "candidates.json")
    }

    pub fn results_path(&self, night: &str, selection: SelectionVariant) -> PathBuf {
        self.file(night, selection, "results.json")
    }

    pub fn rejections_path(&self, night: &str, selection: SelectionVariant) -> PathBuf {
        self.file(night, selection, "rejected.jsonl")
    }

    pub fn attribution_dir(&self, night: &str, selection: SelectionVariant) -> PathBuf {
        self.night_dir(night).join(selection.as_str()).join("shap")
    }

    /// True once a run for this night and selection has written its log
    pub fn has_run(&self, night: &str, selection: SelectionVariant) -> bool {
        self.log_path(night, selection).exists()
    }

    pub fn save_log(
        &self,
        night: &str,
        selection: SelectionVariant,
        log: &ProcessingLog,
    ) -> TriageResult<PathBuf> {
        let path = self.log_path(night, selection);
        write_json(&path, log)?;
        Ok(path)
    }

    pub fn load_log(&self, night: &str, selection: SelectionVariant) -> TriageResult<ProcessingLog> {
        read_json(&self.log_path(night, selection), CacheKind::ProcessingLog)
    }

    pub fn save_candidates(
        &self,
        night: &str,
        selection: SelectionVariant,
        table: &CandidateTable,
    ) -> TriageResult<PathBuf> {
        let path = self.candidates_path(night, selection);
        write_json(&path, table)?;
        Ok(path)
    }

    pub fn load_candidates(
        &self,
        night: &str,
        selection: SelectionVariant,
    ) -> TriageResult<CandidateTable> {
        read_json(&self.candidates_path(night, selection), CacheKind::Candidates)
    }

    pub fn save_results(
        &self,
        night: &str,
        selection: SelectionVariant,
        table: &CandidateTable,
        features: &FeatureTable,
    ) -> TriageResult<PathBuf> {
        let rows: Vec<ResultRow> = table.iter().map(|c| ResultRow::join(c, features)).collect();
        let path = self.results_path(night, selection);
        write_json(&path, &rows)?;
        Ok(path)
    }

    pub fn load_results(
        &self,
        night: &str,
        selection: SelectionVariant,
    ) -> TriageResult<Vec<ResultRow>> {
        read_json(&self.results_path(night, selection), CacheKind::Results)
    }

    /// Merge the logs of several nights; nights without a log are skipped
    pub fn merged_log(&self, nights: &[String], selection: SelectionVariant) -> TriageResult<ProcessingLog> {
        let mut logs = Vec::with_capacity(nights.len());
        for night in nights {
            match self.load_log(night, selection) {
                Ok(log) => logs.push(log),
                Err(e @ TriageError::MissingCache { .. }) => {
                    warn!(night = %night, selection = %selection, "{}", e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(ProcessingLog::merge(&logs))
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> TriageResult<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    debug!(path = %path.display(), "Wrote cache");
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path, kind: CacheKind) -> TriageResult<T> {
    if !path.exists() {
        return Err(TriageError::MissingCache {
            kind,
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MaturityWindow;
    use crate::processing_log::ProcessingStageRecord;
    use tempfile::TempDir;

    #[test]
    fn test_paths_carry_selection() {
        let paths = CachePaths::new("/data");
        assert_eq!(
            paths.log_path("20240110", SelectionVariant::Classic),
            PathBuf::from("/data/results/20240110/scantde_tdescore_log.json")
        );
        assert_eq!(
            paths.candidates_path("20240110", SelectionVariant::OffNuclear),
            PathBuf::from("/data/results/20240110/scantde_tdescore_offnuclear_candidates.json")
        );
        assert_eq!(
            paths.attribution_dir("20240110", SelectionVariant::NoHostInfo),
            PathBuf::from("/data/results/20240110/tdescore_nohostinfo/shap")
        );
    }

    #[test]
    fn test_missing_caches() {
        let dir = TempDir::new().unwrap();
        let paths = CachePaths::new(dir.path());
        assert!(!paths.has_run("20240110", SelectionVariant::Classic));
        assert!(matches!(
            paths.load_log("20240110", SelectionVariant::Classic),
            Err(TriageError::MissingCache { kind: CacheKind::ProcessingLog, .. })
        ));
        assert!(matches!(
            paths.load_candidates("20240110", SelectionVariant::Classic),
            Err(TriageError::MissingCache { kind: CacheKind::Candidates, .. })
        ));
        assert!(matches!(
            paths.load_results("20240110", SelectionVariant::Classic),
            Err(TriageError::MissingCache { kind: CacheKind::Results, .. })
        ));
    }

    #[test]
    fn test_candidate_cache_round_trip() {
        let dir = TempDir::new().unwrap();
        let paths = CachePaths::new(dir.path());
        let mut c = Candidate::new("a", 1.0, 2.0, 3.0);
        c.window = Some(MaturityWindow::AllHistory);
        c.record_score("thermal_all", 0.4);
        let table = CandidateTable::new(vec![c]);

        paths
            .save_candidates("20240110", SelectionVariant::Classic, &table)
            .unwrap();
        let loaded = paths
            .load_candidates("20240110", SelectionVariant::Classic)
            .unwrap();
        assert_eq!(loaded, table);

        // Other selections stay separate
        assert!(paths
            .load_candidates("20240110", SelectionVariant::NoHostInfo)
            .is_err());
    }

    #[test]
    fn test_results_cache_joins_features() {
        let dir = TempDir::new().unwrap();
        let paths = CachePaths::new(dir.path());
        let table = CandidateTable::new(vec![Candidate::new("a", 1.0, 2.0, 3.0)]);
        let mut features = FeatureTable::new();
        features.insert("a", "gaia_aplx", 0.2);
        features.insert("a", "bad", f64::NAN);

        paths
            .save_results("20240110", SelectionVariant::Classic, &table, &features)
            .unwrap();
        let rows = paths
            .load_results("20240110", SelectionVariant::Classic)
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].candidate.name, "a");
        assert_eq!(rows[0].features.get("gaia_aplx"), Some(&0.2));
        assert!(!rows[0].features.contains_key("bad"));
    }

    #[test]
    fn test_merged_log_skips_missing_nights() {
        let dir = TempDir::new().unwrap();
        let paths = CachePaths::new(dir.path());
        let log = ProcessingLog::from_records(vec![
            ProcessingStageRecord::new("Initial", 4, vec!["x".to_string()]).unwrap(),
        ]);
        paths
            .save_log("20240110", SelectionVariant::Classic, &log)
            .unwrap();
        paths
            .save_log("20240112", SelectionVariant::Classic, &log)
            .unwrap();

        let nights: Vec<String> = ["20240110", "20240111", "20240112"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let merged = paths.merged_log(&nights, SelectionVariant::Classic).unwrap();

        assert_eq!(merged.find("Initial").unwrap().n_sources(), 8);
        assert!(paths.has_run("20240110", SelectionVariant::Classic));
    }
}
