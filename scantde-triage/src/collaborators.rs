//! Seams to external collaborators
//!
//! Crossmatch and lightcurve data arrive through a [`FeatureSource`];
//! rejected rows leave through a [`RejectionSink`]. Collaborators own their
//! transport failures: a failed lookup shows up as missing features or an
//! unavailable lightcurve, never as an error inside a stage.

use crate::error::TriageResult;
use crate::models::features::keys;
use crate::models::{Candidate, CandidateTable, FeatureTable};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Crossmatch and lightcurve-analysis data, joined by candidate name
pub trait FeatureSource {
    /// Features for the named candidates; unknown names are simply absent
    fn features(&self, names: &[String]) -> FeatureTable;

    /// Names (from `names`) whose lightcurve can be served
    fn lightcurve_available(&self, names: &[String]) -> Vec<String>;
}

/// Feature source backed by a pre-computed feature table
#[derive(Debug, Clone, Default)]
pub struct StaticFeatureSource {
    table: FeatureTable,
}

impl StaticFeatureSource {
    pub fn new(table: FeatureTable) -> Self {
        Self { table }
    }

    /// Load `{ "<name>": { "<feature>": value, ... }, ... }`
    pub fn from_json_file(path: &Path) -> TriageResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let table: FeatureTable = serde_json::from_str(&content)?;
        debug!(path = %path.display(), sources = table.len(), "Loaded feature table");
        Ok(Self { table })
    }

    pub fn table(&self) -> &FeatureTable {
        &self.table
    }
}

impl FeatureSource for StaticFeatureSource {
    fn features(&self, names: &[String]) -> FeatureTable {
        self.table.subset(names)
    }

    fn lightcurve_available(&self, names: &[String]) -> Vec<String> {
        names
            .iter()
            .filter(|name| self.table.flag(name, keys::HAS_LIGHTCURVE).unwrap_or(false))
            .cloned()
            .collect()
    }
}

/// Receives rows rejected by a stage, each tagged with `fail_step`
pub trait RejectionSink {
    /// Called once before a run exports anything
    fn begin_run(&self, _selection: &str) -> TriageResult<()> {
        Ok(())
    }

    fn export(&self, selection: &str, rejected: &CandidateTable) -> TriageResult<()>;
}

#[derive(Serialize)]
struct RejectionRecord<'a> {
    selection: &'a str,
    #[serde(flatten)]
    candidate: &'a Candidate,
}

/// Writes one JSON object per rejected row to a file, truncated at the start
/// of each run
#[derive(Debug, Clone)]
pub struct JsonLinesRejectionSink {
    path: PathBuf,
}

impl JsonLinesRejectionSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RejectionSink for JsonLinesRejectionSink {
    fn begin_run(&self, selection: &str) -> TriageResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), selection, "Cleared previous rejections");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn export(&self, selection: &str, rejected: &CandidateTable) -> TriageResult<()> {
        if rejected.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            scantde_common::config::ensure_directory(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        for candidate in rejected {
            let line = serde_json::to_string(&RejectionRecord {
                selection,
                candidate,
            })?;
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}

/// Keeps rejected rows in memory; clones share the same storage
#[derive(Debug, Clone, Default)]
pub struct MemoryRejectionSink {
    rejected: Arc<Mutex<Vec<(String, Candidate)>>>,
}

impl MemoryRejectionSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// (selection, candidate) pairs in export order
    pub fn rejected(&self) -> Vec<(String, Candidate)> {
        self.rejected
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Names rejected by the given stage
    pub fn names_failing(&self, stage: &str) -> Vec<String> {
        self.rejected()
            .into_iter()
            .filter(|(_, c)| c.fail_step.as_deref() == Some(stage))
            .map(|(_, c)| c.name)
            .collect()
    }
}

impl RejectionSink for MemoryRejectionSink {
    fn export(&self, selection: &str, rejected: &CandidateTable) -> TriageResult<()> {
        let mut stored = self
            .rejected
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        stored.extend(
            rejected
                .iter()
                .map(|c| (selection.to_string(), c.clone())),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_static_source_subset_and_lightcurves() {
        let mut table = FeatureTable::new();
        table.insert("a", keys::HAS_LIGHTCURVE, 1.0);
        table.insert("a", "x", 2.0);
        table.insert("b", keys::HAS_LIGHTCURVE, 0.0);
        table.insert("c", "x", 1.0);
        let source = StaticFeatureSource::new(table);

        let names: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(source.lightcurve_available(&names), vec!["a"]);

        let subset = source.features(&names[..1]);
        assert_eq!(subset.len(), 1);
        assert_eq!(subset.get("a", "x"), Some(2.0));
    }

    #[test]
    fn test_static_source_from_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("features.json");
        std::fs::write(&path, r#"{"ZTF1": {"gaia_aplx": 0.5, "has_milliquas": 0}}"#).unwrap();

        let source = StaticFeatureSource::from_json_file(&path).unwrap();
        assert_eq!(source.table().get("ZTF1", keys::GAIA_PARALLAX_SIGNIFICANCE), Some(0.5));
    }

    #[test]
    fn test_json_lines_sink_appends() {
        let dir = TempDir::new().unwrap();
        let sink = JsonLinesRejectionSink::new(dir.path().join("out/rejected.jsonl"));
        let mut c = Candidate::new("a", 1.0, 2.0, 3.0);
        c.fail_step = Some("CatWISE cuts".to_string());
        let table = CandidateTable::new(vec![c]);

        sink.export("tdescore", &table).unwrap();
        sink.export("tdescore", &table).unwrap();

        let content = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["selection"], "tdescore");
        assert_eq!(value["name"], "a");
        assert_eq!(value["fail_step"], "CatWISE cuts");
    }

    #[test]
    fn test_json_lines_sink_begin_run_clears_previous_run() {
        let dir = TempDir::new().unwrap();
        let sink = JsonLinesRejectionSink::new(dir.path().join("rejected.jsonl"));
        let table = CandidateTable::new(vec![Candidate::new("a", 1.0, 2.0, 3.0)]);

        sink.begin_run("tdescore").unwrap();
        sink.export("tdescore", &table).unwrap();
        sink.begin_run("tdescore").unwrap();
        sink.export("tdescore", &table).unwrap();

        let content = std::fs::read_to_string(sink.path()).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_memory_sink_clones_share_storage() {
        let sink = MemoryRejectionSink::new();
        let handle = sink.clone();
        let mut c = Candidate::new("a", 0.0, 0.0, 1.0);
        c.fail_step = Some("stage".to_string());
        sink.export("tdescore", &CandidateTable::new(vec![c])).unwrap();
        assert_eq!(handle.names_failing("stage"), vec!["a"]);
    }
}
