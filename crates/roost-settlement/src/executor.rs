//! Trade executor: the atomic two-way exchange.
//!
//! Execution of a LOCKED session:
//! 1. Refuse anything not LOCKED
//! 2. Cancel if the lock window has elapsed
//! 3. Re-validate both offers against the live inventory store
//! 4. Remove A's offered records from A, then B's from B
//! 5. Deliver A's records to B and B's to A under fresh IDs, state reset
//! 6. Check item conservation
//! 7. Mark COMPLETED and release every reservation
//!
//! Steps 4 to 6 run under a [`SettlementJournal`]. If any of them fails the
//! journal is rolled back, the session is CANCELLED, and neither inventory
//! has changed. Callers must hold the session mutex throughout.

use chrono::{DateTime, Utc};
use roost_inventory::InventoryStore;
use roost_negotiation::{SessionRegistry, validate_session};
use roost_types::{
    CancelReason, ExpiryWindow, ItemRecord, Party, PlayerId, Result, TradeConfig, TradeError,
    TradeSession, TradeStatus, TransferResult,
};

use crate::conservation::verify_conservation;
use crate::journal::SettlementJournal;
use crate::receipt::receipt_hash;

/// Records each party received.
struct Delivered {
    to_a: Vec<ItemRecord>,
    to_b: Vec<ItemRecord>,
}

/// Cancel a LOCKED session after a failed execution attempt.
fn abort(
    session: &mut TradeSession,
    registry: &SessionRegistry,
    reason: CancelReason,
    now: DateTime<Utc>,
) {
    if let Err(err) = session.mark_cancelled(reason, now) {
        tracing::error!(session = %session.id, error = %err, "Failed to cancel aborted trade");
    }
    registry.release(session);
    tracing::warn!(session = %session.id, reason = %reason, "Trade cancelled during execution");
}

/// Take every item of one party's offer out of their inventory.
fn withdraw_offer(
    session: &TradeSession,
    party: Party,
    store: &dyn InventoryStore,
    journal: &mut SettlementJournal,
) -> Result<Vec<ItemRecord>> {
    let owner = session.player(party);
    let mut taken = Vec::with_capacity(session.offer(party).len());
    for item in session.offer(party).items() {
        let record = store
            .remove_item(owner, &item.item_id, item.kind)?
            .ok_or_else(|| TradeError::MissingItems {
                owner,
                missing: vec![item.item_id.clone()],
            })?;
        journal.record_removed(owner, record.clone());
        taken.push(record);
    }
    Ok(taken)
}

/// Store `records` in `receiver`'s inventory under fresh IDs.
fn deliver(
    records: &[ItemRecord],
    receiver: PlayerId,
    store: &dyn InventoryStore,
    journal: &mut SettlementJournal,
) -> Result<Vec<ItemRecord>> {
    let mut delivered = Vec::with_capacity(records.len());
    for original in records {
        let mut record = original.clone();
        record.id = store.generate_id();
        record.reset_for_new_owner();
        let kind = record.kind;
        record.id = store.insert_item(receiver, record.clone(), kind)?;
        journal.record_inserted(receiver, &record);
        delivered.push(record);
    }
    Ok(delivered)
}

fn exchange(
    session: &TradeSession,
    store: &dyn InventoryStore,
    journal: &mut SettlementJournal,
) -> Result<Delivered> {
    let from_a = withdraw_offer(session, Party::A, store, journal)?;
    let from_b = withdraw_offer(session, Party::B, store, journal)?;

    let to_b = deliver(&from_a, session.party_b, store, journal)?;
    let to_a = deliver(&from_b, session.party_a, store, journal)?;

    let removed: Vec<ItemRecord> = from_a.into_iter().chain(from_b).collect();
    let moved: Vec<ItemRecord> = to_b.iter().chain(to_a.iter()).cloned().collect();
    verify_conservation(&removed, &moved)?;

    Ok(Delivered { to_a, to_b })
}

/// Execute a LOCKED trade.
///
/// # Errors
/// - `InvalidState` if the session is not LOCKED (session untouched)
/// - `Expired` if the lock window elapsed (session cancelled)
/// - any validation error (session cancelled)
/// - `SettlementAborted` if the store failed mid-exchange (rolled back, cancelled)
pub fn execute(
    session: &mut TradeSession,
    registry: &SessionRegistry,
    store: &dyn InventoryStore,
    config: &TradeConfig,
    now: DateTime<Utc>,
) -> Result<TransferResult> {
    if session.status != TradeStatus::Locked {
        return Err(TradeError::InvalidState {
            operation: "execute",
            status: session.status,
        });
    }

    if session.lock_expired(now, config.lock_timeout) {
        abort(session, registry, CancelReason::LockTimeout, now);
        return Err(TradeError::Expired {
            window: ExpiryWindow::Lock,
            limit: config.lock_timeout,
        });
    }

    // Second validation pass: inventories may have changed since LOCK.
    if let Err(err) = validate_session(session, store, config, now) {
        let reason = match err {
            TradeError::Expired { .. } => CancelReason::NegotiationTimeout,
            _ => CancelReason::ValidationFailed,
        };
        abort(session, registry, reason, now);
        return Err(err);
    }

    let mut journal = SettlementJournal::new();
    let delivered = match exchange(session, store, &mut journal) {
        Ok(delivered) => delivered,
        Err(err) => {
            let steps = journal.len();
            let failures = journal.rollback(store);
            if failures > 0 {
                tracing::error!(
                    session = %session.id,
                    steps,
                    failures,
                    "Rollback incomplete, inventories need manual repair"
                );
            }
            abort(session, registry, CancelReason::SettlementFailed, now);
            return Err(TradeError::SettlementAborted {
                reason: err.to_string(),
            });
        }
    };

    session.mark_completed(now)?;
    registry.release(session);

    let receipt = receipt_hash(
        session.id,
        &[
            (session.party_a, delivered.to_a.as_slice()),
            (session.party_b, delivered.to_b.as_slice()),
        ],
    );
    let result = TransferResult {
        session_id: session.id,
        party_a: session.party_a,
        party_b: session.party_b,
        party_a_received: delivered.to_a,
        party_b_received: delivered.to_b,
        completed_at: now,
        receipt_hash: receipt,
    };

    tracing::info!(
        session = %session.id,
        party_a = %session.party_a,
        party_b = %session.party_b,
        items = result.items_moved(),
        receipt = %result.receipt_hex(),
        "Trade completed"
    );
    Ok(result)
}
