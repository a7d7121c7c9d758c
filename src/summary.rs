//! Batch result aggregation
//!
//! Pure derivation of a [`BatchSummary`] from a slice of outcomes. The
//! representative link is the first non-blank result link in outcome
//! order, which matches input order thanks to the dispatcher's
//! index-addressed collection.

use crate::types::{BatchSummary, CheckOutcome};

/// Summarize a batch run from its per-file outcomes
pub fn summarize(batch_id: &str, outcomes: &[CheckOutcome]) -> BatchSummary {
    let success_count = outcomes.iter().filter(|o| o.succeeded).count();
    let failure_count = outcomes.len() - success_count;

    let representative_link = outcomes
        .iter()
        .filter(|o| o.succeeded)
        .filter_map(|o| o.result_link.as_deref())
        .map(str::trim)
        .find(|link| !link.is_empty())
        .map(String::from);

    BatchSummary {
        batch_id: batch_id.to_string(),
        success_count,
        failure_count,
        representative_link,
    }
}
