//! Best-Score Reducer
//!
//! Folds classifier outputs into one winning score and winning classifier per
//! candidate. Outputs are applied in precedence order (increasing data
//! maturity); every non-null score overwrites the current winner regardless
//! of magnitude. Numeric floors are separate filter stages, never part of
//! the reduction.

use crate::error::{TriageError, TriageResult};
use crate::models::{CandidateTable, ScorePrecedence};
use crate::services::classifier_invoker::ClassifierOutput;
use std::collections::HashMap;
use tracing::debug;

/// Apply `outputs` to `table` in precedence order
///
/// Scores are matched to rows by candidate name. Every score is kept in the
/// candidate's per-variant map; only the winner pointer moves. A candidate no
/// variant scored keeps a null winner.
///
/// # Errors
/// [`TriageError::Config`] if an output belongs to a variant absent from the
/// precedence list.
pub fn reduce(
    table: CandidateTable,
    precedence: &ScorePrecedence,
    outputs: &[ClassifierOutput],
) -> TriageResult<CandidateTable> {
    let mut ordered: Vec<(usize, &ClassifierOutput)> = Vec::with_capacity(outputs.len());
    for output in outputs {
        let position = precedence.position(&output.variant).ok_or_else(|| {
            TriageError::Config(format!(
                "Classifier variant '{}' has no place in the score precedence {:?}",
                output.variant,
                precedence.order()
            ))
        })?;
        ordered.push((position, output));
    }
    ordered.sort_by_key(|(position, _)| *position);

    let mut index: HashMap<String, Vec<usize>> = HashMap::with_capacity(table.len());
    for (i, candidate) in table.iter().enumerate() {
        index.entry(candidate.name.clone()).or_default().push(i);
    }

    let mut rows = table.into_rows();
    for (_, output) in ordered {
        let mut applied = 0usize;
        for (name, score) in output.scored() {
            let Some(positions) = index.get(name) else {
                continue;
            };
            for i in positions {
                rows[*i].record_score(&output.variant, score);
                applied += 1;
            }
        }
        debug!(variant = %output.variant, applied, "Applied classifier scores");
    }

    Ok(CandidateTable::new(rows))
}
