//! Item conservation check.
//!
//! Invariant enforced on every exchange before the session is marked
//! COMPLETED:
//! ```text
//! multiset(fingerprint of removed records) == multiset(fingerprint of delivered records)
//! ```
//!
//! IDs change on transfer and accrued value is reset, so neither takes part
//! in the comparison. A failure means an item was created or destroyed by
//! the exchange and the whole exchange must be undone.

use std::collections::BTreeMap;

use roost_types::{ItemRecord, Result, TradeError};

/// Fingerprint counts for a set of records.
fn tally<'a>(records: impl IntoIterator<Item = &'a ItemRecord>) -> BTreeMap<[u8; 32], usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.fingerprint()).or_insert(0) += 1;
    }
    counts
}

/// Verify that `delivered` is the same multiset of items as `removed`.
///
/// # Errors
/// `Internal` describing the imbalance.
pub fn verify_conservation(removed: &[ItemRecord], delivered: &[ItemRecord]) -> Result<()> {
    if removed.len() != delivered.len() {
        return Err(TradeError::Internal(format!(
            "item conservation violated: removed {} records, delivered {}",
            removed.len(),
            delivered.len()
        )));
    }

    let expected = tally(removed);
    let actual = tally(delivered);
    if expected != actual {
        let unmatched = expected
            .iter()
            .filter(|(fp, n)| actual.get(*fp) != Some(*n))
            .count();
        return Err(TradeError::Internal(format!(
            "item conservation violated: {unmatched} fingerprint(s) differ after delivery"
        )));
    }
    Ok(())
}
