//! Offline re-scoring of stored results.
//!
//! Recomputes confidence from each record's stored query, title and channel
//! without touching the search provider. All other fields pass through
//! unchanged. Output is sorted by index with one record per index, so a
//! second pass over its own output rewrites identical bytes.
//!
//! Precondition: no dispatch is appending to either store while this runs.

use crate::error::StoreError;
use crate::models::{ConfidenceChange, ConfidenceTally, ResultRecord};
use crate::store::{latest_by_index, ResultStore};

#[derive(Debug, Default)]
pub struct RescoreOutcome {
    /// Rescored records, sorted by index
    pub records: Vec<ResultRecord>,
    pub changes: Vec<ConfidenceChange>,
    pub tally: ConfidenceTally,
    /// Lines skipped because they could not be parsed
    pub malformed: usize,
    /// Records dropped because a later line had the same index
    pub duplicates: usize,
}

/// Rescore in memory. Returns records in input order and the changes made.
pub fn rescore_records(records: Vec<ResultRecord>) -> (Vec<ResultRecord>, Vec<ConfidenceChange>) {
    let mut changes = Vec::new();
    let rescored = records
        .into_iter()
        .map(|mut record| {
            let new = record.rescored_confidence();
            if new != record.confidence {
                changes.push(ConfidenceChange {
                    index: record.index,
                    query: record.query.clone(),
                    old: record.confidence,
                    new,
                });
                record.confidence = new;
            }
            record
        })
        .collect();
    (rescored, changes)
}

/// Load `source`, rescore, and rewrite the result into `output` (which may
/// be the same store).
pub fn rescore_store(source: &ResultStore, output: &ResultStore) -> Result<RescoreOutcome, StoreError> {
    let loaded = source.load_all()?;
    let loaded_count = loaded.records.len();
    let latest = latest_by_index(loaded.records);
    let duplicates = loaded_count - latest.len();

    let (records, changes) = rescore_records(latest);
    output.rewrite_all(&records)?;

    let tally = ConfidenceTally::from_records(&records);
    Ok(RescoreOutcome {
        records,
        changes,
        tally,
        malformed: loaded.malformed.len(),
        duplicates,
    })
}
