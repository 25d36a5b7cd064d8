//! Undo journal for the two-way exchange.
//!
//! Every inventory mutation made during an exchange is recorded here before
//! the next one starts. If any step fails, [`SettlementJournal::rollback`]
//! replays the entries in reverse so both inventories end up exactly as
//! they were before the exchange began.

use roost_inventory::InventoryStore;
use roost_types::{ItemId, ItemKind, ItemRecord, PlayerId};

/// One applied inventory mutation.
#[derive(Debug, Clone)]
enum Entry {
    /// `record` was taken out of `owner`'s inventory.
    Removed { owner: PlayerId, record: ItemRecord },
    /// A record was stored for `owner` under `id`.
    Inserted {
        owner: PlayerId,
        id: ItemId,
        kind: ItemKind,
        fingerprint: String,
    },
}

impl Entry {
    /// Short fingerprint of the record this entry touched.
    fn fingerprint(&self) -> String {
        match self {
            Self::Removed { record, .. } => record.fingerprint_short(),
            Self::Inserted { fingerprint, .. } => fingerprint.clone(),
        }
    }
}

/// Ordered log of mutations applied by one exchange.
#[derive(Debug, Default)]
pub struct SettlementJournal {
    entries: Vec<Entry>,
}

impl SettlementJournal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_removed(&mut self, owner: PlayerId, record: ItemRecord) {
        self.entries.push(Entry::Removed { owner, record });
    }

    /// Note that `record` now sits in `owner`'s inventory under `record.id`.
    pub fn record_inserted(&mut self, owner: PlayerId, record: &ItemRecord) {
        self.entries.push(Entry::Inserted {
            owner,
            id: record.id.clone(),
            kind: record.kind,
            fingerprint: record.fingerprint_short(),
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Undo every recorded mutation, newest first.
    ///
    /// Removed records go back under their original IDs; inserted records
    /// are taken out again. Keeps going past individual failures and
    /// returns how many undo steps failed (0 on a clean rollback).
    pub fn rollback(self, store: &dyn InventoryStore) -> usize {
        let mut failures = 0;
        for entry in self.entries.into_iter().rev() {
            let outcome = match &entry {
                Entry::Inserted { owner, id, kind, .. } => {
                    store.remove_item(*owner, id, *kind).map(|r| r.is_some())
                }
                Entry::Removed { owner, record } => store
                    .insert_item(*owner, record.clone(), record.kind)
                    .map(|_| true),
            };
            match outcome {
                Ok(true) => {}
                Ok(false) => {
                    failures += 1;
                    tracing::error!(
                        ?entry,
                        item = %entry.fingerprint(),
                        "Rollback target no longer present"
                    );
                }
                Err(err) => {
                    failures += 1;
                    tracing::error!(
                        ?entry,
                        item = %entry.fingerprint(),
                        error = %err,
                        "Rollback step failed"
                    );
                }
            }
        }
        failures
    }
}
