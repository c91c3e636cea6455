//! Deduplication of repeated detections
//!
//! Collapses the raw detections of one physical source into its earliest
//! detection. Must run before any stage that assumes one row per source and
//! before age/maturity computation.

use crate::models::{Candidate, CandidateTable};
use std::collections::HashMap;
use tracing::debug;

/// Keep the earliest detection per candidate name
///
/// **Algorithm:**
/// 1. Group rows by name
/// 2. Within a group keep the row with the minimum `jd`
/// 3. Equal epochs resolve to the lowest `ingest_index` (raw ingestion order)
/// 4. Output keeps the relative order of the surviving rows
///
/// Idempotent: deduplicating an already unique table returns it unchanged.
pub fn deduplicate(table: CandidateTable) -> CandidateTable {
    let n_input = table.len();
    let rows = table.into_rows();

    let mut best: HashMap<&str, usize> = HashMap::with_capacity(rows.len());
    for (i, candidate) in rows.iter().enumerate() {
        best.entry(candidate.name.as_str())
            .and_modify(|current| {
                if is_earlier(candidate, &rows[*current]) {
                    *current = i;
                }
            })
            .or_insert(i);
    }

    let mut keep = vec![false; rows.len()];
    for i in best.into_values() {
        keep[i] = true;
    }

    let deduplicated: CandidateTable = rows
        .into_iter()
        .zip(keep)
        .filter_map(|(candidate, keep)| keep.then_some(candidate))
        .collect();

    debug!(
        input = n_input,
        output = deduplicated.len(),
        "Deduplicated detections"
    );
    deduplicated
}

/// Strict ordering by (epoch, ingestion order)
fn is_earlier(a: &Candidate, b: &Candidate) -> bool {
    a.jd
        .total_cmp(&b.jd)
        .then(a.ingest_index.cmp(&b.ingest_index))
        .is_lt()
}
