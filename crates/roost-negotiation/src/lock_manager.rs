//! Lock manager: closes negotiation and reserves the offered items.
//!
//! LOCK is the commit point: after it, add/remove/confirm are rejected and
//! every offered item is reserved so no other session can lock it. A
//! failed lock changes nothing: the session stays PENDING with no
//! reservations.

use chrono::{DateTime, Utc};
use roost_inventory::InventoryStore;
use roost_types::{Result, TradeConfig, TradeError, TradeSession, TradeStatus};

use crate::registry::SessionRegistry;
use crate::validation::validate_session;

/// Move `session` from PENDING to LOCKED.
///
/// Checks, in order: the session validates against both inventories; it is
/// still PENDING; both offers are confirmed; no offered item is reserved by
/// another session. Callers must hold the session mutex.
///
/// # Errors
/// - `InvalidState` / `Expired` / `MissingItems` from validation
/// - `InvalidState` if the session is already LOCKED
/// - `NotConfirmed` listing the players who have not confirmed
/// - `ItemLocked` if another session already reserves an offered item
pub fn lock(
    session: &mut TradeSession,
    registry: &SessionRegistry,
    store: &dyn InventoryStore,
    config: &TradeConfig,
    now: DateTime<Utc>,
) -> Result<()> {
    validate_session(session, store, config, now)?;

    if session.status != TradeStatus::Pending {
        return Err(TradeError::InvalidState {
            operation: "lock",
            status: session.status,
        });
    }

    if !session.both_confirmed() {
        let waiting_on = [
            (session.party_a, session.offer_a.is_confirmed()),
            (session.party_b, session.offer_b.is_confirmed()),
        ]
        .into_iter()
        .filter(|(_, confirmed)| !confirmed)
        .map(|(player, _)| player)
        .collect();
        return Err(TradeError::NotConfirmed { waiting_on });
    }

    let items = session.offered_item_ids();
    registry.reserve_items(session.id, items.iter())?;

    if let Err(err) = session.mark_locked(now) {
        registry.release_items(session.id);
        return Err(err);
    }

    tracing::info!(
        session = %session.id,
        items_a = session.offer_a.len(),
        items_b = session.offer_b.len(),
        "Trade locked"
    );
    Ok(())
}
