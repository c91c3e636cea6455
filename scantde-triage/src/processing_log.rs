//! Processing log: the per-run audit trail
//!
//! One [`ProcessingStageRecord`] is appended per stage invocation, capturing
//! the candidate count and the known positives present *before* the stage
//! filtered anything. "Initial" and "Final" are bookkeeping records that
//! report the table state at those points.
//!
//! Logs from several runs (e.g. a week of nights) can be merged for
//! reporting. Merging never mutates its inputs.

use crate::error::{TriageError, TriageResult};
use crate::models::CandidateTable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Name of the first bookkeeping record
pub const INITIAL_STAGE: &str = "Initial";

/// Name of the last bookkeeping record
pub const FINAL_STAGE: &str = "Final";

/// Immutable audit entry for one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStageRecord {
    stage: String,
    n_sources: usize,
    #[serde(rename = "tdes", alias = "known_positives")]
    known_positives: Vec<String>,
}

impl ProcessingStageRecord {
    pub fn new(stage: &str, n_sources: usize, known_positives: Vec<String>) -> TriageResult<Self> {
        if stage.trim().is_empty() {
            return Err(TriageError::InvalidInput(
                "Processing stage name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            stage: stage.to_string(),
            n_sources,
            known_positives,
        })
    }

    /// Record describing a table as it stands
    pub fn of_table(stage: &str, table: &CandidateTable) -> TriageResult<Self> {
        Self::new(stage, table.len(), table.known_positive_names())
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn n_sources(&self) -> usize {
        self.n_sources
    }

    pub fn known_positives(&self) -> &[String] {
        &self.known_positives
    }

    /// Initial and Final records report post-hoc state rather than a cut
    pub fn is_bookkeeping(&self) -> bool {
        self.stage == INITIAL_STAGE || self.stage == FINAL_STAGE
    }
}

/// Ordered stage records for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessingLog {
    records: Vec<ProcessingStageRecord>,
}

impl ProcessingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<ProcessingStageRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ProcessingStageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&ProcessingStageRecord> {
        self.records.last()
    }

    /// First record with the given stage name
    pub fn find(&self, stage: &str) -> Option<&ProcessingStageRecord> {
        self.records.iter().find(|r| r.stage == stage)
    }

    pub fn push(&mut self, record: ProcessingStageRecord) {
        self.records.push(record);
    }

    /// Append a record of the table's current state
    pub fn snapshot(&mut self, stage: &str, table: &CandidateTable) -> TriageResult<()> {
        self.push(ProcessingStageRecord::of_table(stage, table)?);
        Ok(())
    }

    /// True if non-bookkeeping counts never increase from one record to the next
    pub fn is_monotonic(&self) -> bool {
        self.records
            .iter()
            .filter(|r| !r.is_bookkeeping())
            .collect::<Vec<_>>()
            .windows(2)
            .all(|pair| pair[1].n_sources <= pair[0].n_sources)
    }

    /// Known positives present at the first record but missing from the last
    pub fn lost_known_positives(&self) -> Vec<String> {
        let (Some(first), Some(last)) = (self.records.first(), self.records.last()) else {
            return Vec::new();
        };
        let remaining: BTreeSet<&String> = last.known_positives.iter().collect();
        first
            .known_positives
            .iter()
            .filter(|name| !remaining.contains(name))
            .cloned()
            .collect()
    }

    /// Outer-join logs by stage name
    ///
    /// Counts are summed and known positives unioned per stage. The result is
    /// sorted by descending count; stages with equal counts keep the order in
    /// which they were first seen.
    pub fn merge<'a, I>(logs: I) -> ProcessingLog
    where
        I: IntoIterator<Item = &'a ProcessingLog>,
    {
        let mut order: Vec<String> = Vec::new();
        let mut merged: HashMap<String, (usize, BTreeSet<String>)> = HashMap::new();

        for log in logs {
            for record in &log.records {
                let entry = merged.entry(record.stage.clone()).or_insert_with(|| {
                    order.push(record.stage.clone());
                    (0, BTreeSet::new())
                });
                entry.0 += record.n_sources;
                entry.1.extend(record.known_positives.iter().cloned());
            }
        }

        let mut records: Vec<ProcessingStageRecord> = order
            .into_iter()
            .filter_map(|stage| {
                let (n_sources, known) = merged.remove(&stage)?;
                Some(ProcessingStageRecord {
                    stage,
                    n_sources,
                    known_positives: known.into_iter().collect(),
                })
            })
            .collect();
        records.sort_by(|a, b| b.n_sources.cmp(&a.n_sources));

        ProcessingLog { records }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candidate;

    fn record(stage: &str, n: usize, kp: &[&str]) -> ProcessingStageRecord {
        ProcessingStageRecord::new(stage, n, kp.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_empty_stage_name_rejected() {
        assert!(ProcessingStageRecord::new("", 1, vec![]).is_err());
        assert!(ProcessingStageRecord::new("  ", 1, vec![]).is_err());
    }

    #[test]
    fn test_merge_initial_stage() {
        let a = ProcessingLog::from_records(vec![record("Initial", 10, &["x"])]);
        let b = ProcessingLog::from_records(vec![record("Initial", 5, &["x", "y"])]);

        let merged = ProcessingLog::merge([&a, &b]);

        assert_eq!(merged.len(), 1);
        let initial = merged.find("Initial").unwrap();
        assert_eq!(initial.n_sources(), 15);
        assert_eq!(initial.known_positives(), &["x", "y"]);
    }

    #[test]
    fn test_merge_is_outer_join_sorted_by_count() {
        let a = ProcessingLog::from_records(vec![
            record("Initial", 10, &[]),
            record("Algorithmic cuts - sgscore", 8, &[]),
            record("Final", 2, &[]),
        ]);
        let b = ProcessingLog::from_records(vec![
            record("Initial", 20, &[]),
            record("CatWISE cuts", 12, &[]),
        ]);

        let merged = ProcessingLog::merge([&a, &b]);
        let stages: Vec<&str> = merged.records().iter().map(|r| r.stage()).collect();
        assert_eq!(
            stages,
            vec!["Initial", "CatWISE cuts", "Algorithmic cuts - sgscore", "Final"]
        );
        assert_eq!(merged.find("Initial").unwrap().n_sources(), 30);
    }

    #[test]
    fn test_merge_does_not_mutate_inputs() {
        let a = ProcessingLog::from_records(vec![record("Initial", 1, &["x"])]);
        let before = a.clone();
        let _ = ProcessingLog::merge([&a, &a]);
        assert_eq!(a, before);
    }

    #[test]
    fn test_snapshot_records_current_state() {
        let mut kp = Candidate::new("kp", 0.0, 0.0, 1.0);
        kp.is_known_positive = true;
        let table = CandidateTable::new(vec![kp, Candidate::new("other", 0.0, 0.0, 1.0)]);
        let mut log = ProcessingLog::new();
        log.snapshot(INITIAL_STAGE, &table).unwrap();
        let first = &log.records()[0];
        assert_eq!(first.n_sources(), 2);
        assert_eq!(first.known_positives(), &["kp"]);
        assert!(first.is_bookkeeping());
    }

    #[test]
    fn test_monotonic_ignores_bookkeeping() {
        let log = ProcessingLog::from_records(vec![
            record("Initial", 5, &[]),
            record("a", 10, &[]),
            record("b", 7, &[]),
            record("Final", 3, &[]),
        ]);
        assert!(log.is_monotonic());

        let broken = ProcessingLog::from_records(vec![record("a", 3, &[]), record("b", 4, &[])]);
        assert!(!broken.is_monotonic());
    }

    #[test]
    fn test_lost_known_positives() {
        let log = ProcessingLog::from_records(vec![
            record("Initial", 5, &["x", "y"]),
            record("Final", 2, &["y"]),
        ]);
        assert_eq!(log.lost_known_positives(), vec!["x"]);
    }

    #[test]
    fn test_serialized_field_names() {
        let log = ProcessingLog::from_records(vec![record("Initial", 3, &["x"])]);
        let json = serde_json::to_string(&log).unwrap();
        assert_eq!(json, r#"[{"stage":"Initial","n_sources":3,"tdes":["x"]}]"#);

        let parsed: ProcessingLog =
            serde_json::from_str(r#"[{"stage":"Final","n_sources":1,"known_positives":["y"]}]"#)
                .unwrap();
        assert_eq!(parsed.records()[0].known_positives(), &["y"]);
    }
}
