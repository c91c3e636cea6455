//! Stage Executor
//!
//! Applies a boolean mask to the candidate table, splitting it into kept and
//! rejected rows, and appends one processing-log record per invocation.
//!
//! The record is written *before* filtering: it answers "what could this
//! stage have lost", so `n_sources` is the input row count and the known
//! positives are those present in the input.

use crate::error::{TriageError, TriageResult};
use crate::models::{Candidate, CandidateTable};
use crate::processing_log::{ProcessingLog, ProcessingStageRecord};
use tracing::{info, warn};

/// Result of one stage application
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageOutcome {
    /// Rows where the mask was true
    pub kept: CandidateTable,
    /// Rows where the mask was false, each tagged with `fail_step`
    pub rejected: CandidateTable,
}

/// Apply `mask` to `table` as stage `stage`
///
/// # Errors
/// - [`TriageError::InvalidInput`] if the mask is not aligned with the table
/// - [`TriageError::NoCandidates`] if the input table is empty (the record is
///   still appended so the log shows where the run stopped)
pub fn apply_stage(
    table: CandidateTable,
    mask: &[bool],
    stage: &str,
    log: &mut ProcessingLog,
) -> TriageResult<StageOutcome> {
    if mask.len() != table.len() {
        return Err(TriageError::InvalidInput(format!(
            "Mask for stage '{}' has {} entries but the table has {} rows",
            stage,
            mask.len(),
            table.len()
        )));
    }

    log.push(ProcessingStageRecord::of_table(stage, &table)?);

    if table.is_empty() {
        return Err(TriageError::NoCandidates {
            stage: stage.to_string(),
        });
    }

    let n_known = table.known_positive_count();
    let (kept, mut rejected) = table.partition(mask);
    for candidate in rejected.iter_mut() {
        candidate.fail_step = Some(stage.to_string());
    }

    info!(
        stage = %stage,
        kept = kept.len(),
        rejected = rejected.len(),
        known_positives = n_known,
        "Applied '{}' cut, leaving {} sources",
        stage,
        kept.len()
    );

    let lost = rejected.known_positive_names();
    if !lost.is_empty() {
        warn!(stage = %stage, lost = ?lost, "Known positives rejected");
    }

    Ok(StageOutcome { kept, rejected })
}

/// Apply a per-row predicate as stage `stage`
pub fn apply_predicate<F>(
    table: CandidateTable,
    stage: &str,
    log: &mut ProcessingLog,
    keep: F,
) -> TriageResult<StageOutcome>
where
    F: Fn(&Candidate) -> bool,
{
    let mask = table.mask(keep);
    apply_stage(table, &mask, stage, log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn table(n: usize, known: &[usize]) -> CandidateTable {
        CandidateTable::from_ingested(
            (0..n)
                .map(|i| {
                    let mut c = Candidate::new(format!("ZTF{:03}", i), 0.0, 0.0, 1.0);
                    c.is_known_positive = known.contains(&i);
                    c
                })
                .collect(),
        )
    }

    #[test]
    fn test_kept_and_rejected_partition_input() {
        let input = table(10, &[1]);
        let names: BTreeSet<String> = input.names().into_iter().collect();
        let mask: Vec<bool> = (0..10).map(|i| i % 3 != 0).collect();
        let mut log = ProcessingLog::new();

        let outcome = apply_stage(input, &mask, "cut", &mut log).unwrap();

        assert_eq!(outcome.kept.len() + outcome.rejected.len(), 10);
        let union: BTreeSet<String> = outcome
            .kept
            .names()
            .into_iter()
            .chain(outcome.rejected.names())
            .collect();
        assert_eq!(union, names);
        assert_eq!(outcome.rejected.len(), 4);
        assert!(outcome.rejected.iter().all(|c| c.fail_step.as_deref() == Some("cut")));
        assert!(outcome.kept.iter().all(|c| c.fail_step.is_none()));
    }

    #[test]
    fn test_record_captures_pre_filter_state() {
        let input = table(5, &[0, 4]);
        let mut log = ProcessingLog::new();
        let mask = vec![false; 5];

        let outcome = apply_stage(input, &mask, "drop all", &mut log).unwrap();

        assert!(outcome.kept.is_empty());
        let record = log.last().unwrap();
        assert_eq!(record.stage(), "drop all");
        assert_eq!(record.n_sources(), 5);
        assert_eq!(record.known_positives(), &["ZTF000", "ZTF004"]);
    }

    #[test]
    fn test_empty_input_is_no_candidates() {
        let mut log = ProcessingLog::new();
        let err = apply_stage(CandidateTable::default(), &[], "late stage", &mut log).unwrap_err();
        assert!(err.is_terminal_data_condition());
        assert_eq!(log.last().unwrap().n_sources(), 0);
    }

    #[test]
    fn test_misaligned_mask_rejected_without_logging() {
        let mut log = ProcessingLog::new();
        let err = apply_stage(table(3, &[]), &[true], "cut", &mut log).unwrap_err();
        assert!(matches!(err, TriageError::InvalidInput(_)));
        assert!(log.is_empty());
    }

    #[test]
    fn test_apply_predicate_preserves_order() {
        let mut log = ProcessingLog::new();
        let outcome = apply_predicate(table(6, &[]), "even", &mut log, |c| {
            c.ingest_index % 2 == 0
        })
        .unwrap();
        assert_eq!(outcome.kept.names(), vec!["ZTF000", "ZTF002", "ZTF004"]);
    }
}
